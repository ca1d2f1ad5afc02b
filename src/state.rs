//! Per-guild configuration data
//!
//! Guild data is a flat key → JSON value map per guild, read on every
//! dispatch to find the destination channel of each log category.
//! `LogChannels` is the typed view the pipeline uses.

use crate::error::{ModLogError, Result};
use crate::types::{ChannelId, GuildId, LogCategory};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

type GuildData = HashMap<GuildId, HashMap<String, Value>>;

/// Trait for per-guild key-value configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a value; `None` when the key was never written
    async fn get(&self, guild: GuildId, key: &str) -> Result<Option<Value>>;

    /// Write a value
    async fn set(&self, guild: GuildId, key: &str, value: Value) -> Result<()>;
}

/// In-memory config store for testing
#[derive(Default)]
pub struct MemoryConfigStore {
    data: RwLock<GuildData>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, guild: GuildId, key: &str) -> Result<Option<Value>> {
        let data = self.data.read().await;
        Ok(data.get(&guild).and_then(|d| d.get(key)).cloned())
    }

    async fn set(&self, guild: GuildId, key: &str, value: Value) -> Result<()> {
        let mut data = self.data.write().await;
        data.entry(guild).or_default().insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file-based config store
///
/// The whole document is loaded once and rewritten on every `set`.
/// Atomic writes via temp file + rename to prevent corruption.
pub struct FileConfigStore {
    path: PathBuf,
    data: RwLock<GuildData>,
}

impl FileConfigStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = load(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load(path: &Path) -> Result<GuildData> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let json = std::fs::read_to_string(path).map_err(|e| {
        ModLogError::Config(format!(
            "Failed to read guild data file {}: {}",
            path.display(),
            e
        ))
    })?;

    let data: GuildData = serde_json::from_str(&json).map_err(|e| {
        ModLogError::Config(format!(
            "Failed to parse guild data file {}: {}",
            path.display(),
            e
        ))
    })?;

    tracing::debug!(path = %path.display(), guilds = data.len(), "Guild data loaded");
    Ok(data)
}

fn save(path: &Path, data: &GuildData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let tmp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ModLogError::Config(format!(
                "Failed to create guild data directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    std::fs::write(&tmp_path, json).map_err(|e| {
        ModLogError::Config(format!(
            "Failed to write guild data file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        ModLogError::Config(format!(
            "Failed to rename guild data file {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })?;

    tracing::debug!(path = %path.display(), "Guild data saved");
    Ok(())
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, guild: GuildId, key: &str) -> Result<Option<Value>> {
        let data = self.data.read().await;
        Ok(data.get(&guild).and_then(|d| d.get(key)).cloned())
    }

    async fn set(&self, guild: GuildId, key: &str, value: Value) -> Result<()> {
        // Held across the write so concurrent sets reach disk in order
        let mut data = self.data.write().await;
        let mut next = data.clone();
        next.entry(guild).or_default().insert(key.to_string(), value);

        let path = self.path.clone();
        let next = tokio::task::spawn_blocking(move || save(&path, &next).map(|()| next))
            .await
            .map_err(|e| ModLogError::Config(format!("Guild data save task failed: {}", e)))??;

        *data = next;
        Ok(())
    }
}

/// Typed view of the log destination channels stored in guild data
///
/// Channel ids are stored as JSON strings; `null` means "no delivery".
#[derive(Clone)]
pub struct LogChannels {
    store: Arc<dyn ConfigStore>,
}

impl LogChannels {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Destination channel for a category, if one is configured
    ///
    /// A stored value that is not a channel id resolves to no channel, the
    /// same as an id that no longer exists in the guild.
    pub async fn channel_for(
        &self,
        guild: GuildId,
        category: LogCategory,
    ) -> Result<Option<ChannelId>> {
        let value = self.store.get(guild, category.datakey()).await?;
        let channel = match &value {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.parse().ok(),
            Some(Value::Number(n)) => n.as_u64().map(ChannelId),
            Some(_) => None,
        };

        if channel.is_none() {
            tracing::warn!(
                guild = %guild,
                category = %category,
                value = ?value,
                "Stored log channel is not a channel id"
            );
        }
        Ok(channel)
    }

    pub async fn enable(
        &self,
        guild: GuildId,
        category: LogCategory,
        channel: ChannelId,
    ) -> Result<()> {
        self.store
            .set(guild, category.datakey(), Value::String(channel.to_string()))
            .await?;
        tracing::info!(guild = %guild, category = %category, channel = %channel, "Log enabled");
        Ok(())
    }

    pub async fn disable(&self, guild: GuildId, category: LogCategory) -> Result<()> {
        self.store.set(guild, category.datakey(), Value::Null).await?;
        tracing::info!(guild = %guild, category = %category, "Log disabled");
        Ok(())
    }

    /// Write `null` for every category key the guild does not have yet
    pub async fn init_defaults(&self, guild: GuildId) -> Result<()> {
        for category in LogCategory::ALL {
            if self.store.get(guild, category.datakey()).await?.is_none() {
                self.store.set(guild, category.datakey(), Value::Null).await?;
            }
        }
        Ok(())
    }
}
