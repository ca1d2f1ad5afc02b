//! Lifecycle event bus
//!
//! `EventBus` routes each lifecycle event to the handlers registered for
//! its kind. Every handler invocation runs as its own tokio task, so a
//! slow pipeline (audit retries, delivery round-trips) never holds up
//! other events.

use crate::error::Result;
use crate::provider::Subscription;
use crate::types::{EventKind, LifecycleEvent};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Registered event handler
pub type Handler = Arc<dyn Fn(LifecycleEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Routes lifecycle events to handlers by kind
#[derive(Default, Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<EventKind, Vec<Handler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    pub async fn on<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(LifecycleEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |event| handler(event).boxed());
        let mut handlers = self.handlers.write().await;
        handlers.entry(kind).or_default().push(handler);

        tracing::debug!(?kind, "Handler registered");
    }

    /// Number of handlers registered for a kind
    pub async fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Spawn every handler registered for the event's kind
    ///
    /// The join handles are returned for callers that want to wait;
    /// dropping them leaves the handlers running.
    pub async fn emit(&self, event: LifecycleEvent) -> Vec<JoinHandle<()>> {
        let kind = event.kind();
        let handlers: Vec<Handler> = {
            let handlers = self.handlers.read().await;
            handlers.get(&kind).cloned().unwrap_or_default()
        };

        if handlers.is_empty() {
            tracing::trace!(?kind, "No handlers for event");
        }

        handlers
            .into_iter()
            .map(|handler| tokio::spawn(handler(event.clone())))
            .collect()
    }

    /// Drain a transport subscription, emitting each event
    ///
    /// Returns the number of events emitted once the subscription ends.
    /// Handlers are not awaited.
    pub async fn run<S: Subscription>(&self, mut subscription: S) -> Result<usize> {
        let mut emitted = 0;
        while let Some(event) = subscription.next().await? {
            self.emit(event).await;
            emitted += 1;
        }

        tracing::info!(emitted, "Event subscription closed");
        Ok(emitted)
    }
}
