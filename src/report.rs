//! Error reporting: hand unexpected pipeline failures to operators
//!
//! Provides an `ErrorReporter` trait for routing failures that the
//! pipeline cannot classify. Reports are fire-and-forget: a reporter
//! never feeds anything back into the pipeline that produced the report.

use crate::error::ModLogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One named piece of context attached to a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportField {
    pub name: String,
    pub value: String,
}

impl ReportField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An unexpected failure with the context it happened in
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// Rendered error message
    pub error: String,

    /// Ordered context fields (component, hook, subject, guild)
    pub fields: Vec<ReportField>,

    pub reported_at: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(error: &ModLogError, fields: Vec<ReportField>) -> Self {
        Self {
            error: error.to_string(),
            fields,
            reported_at: Utc::now(),
        }
    }

    /// Value of the first field called `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Trait for process-wide error reporters
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, report: ErrorReport);
}

/// Reporter that writes each report to the `tracing` error log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

#[async_trait]
impl ErrorReporter for TracingErrorReporter {
    async fn report(&self, report: ErrorReport) {
        let context = report
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.value))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::error!(error = %report.error, context = %context, "Unhandled moderation log error");
    }
}

/// In-memory reporter for development and testing
///
/// Keeps at most `max_reports` reports, dropping the oldest.
pub struct MemoryErrorReporter {
    reports: Arc<RwLock<Vec<ErrorReport>>>,
    max_reports: usize,
}

impl MemoryErrorReporter {
    pub fn new(max_reports: usize) -> Self {
        Self {
            reports: Arc::new(RwLock::new(Vec::new())),
            max_reports,
        }
    }

    pub async fn count(&self) -> usize {
        self.reports.read().await.len()
    }

    /// Most recent reports first
    pub async fn list(&self, limit: usize) -> Vec<ErrorReport> {
        let reports = self.reports.read().await;
        reports.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for MemoryErrorReporter {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl ErrorReporter for MemoryErrorReporter {
    async fn report(&self, report: ErrorReport) {
        tracing::warn!(error = %report.error, fields = report.fields.len(), "Error reported");

        let mut reports = self.reports.write().await;
        reports.push(report);

        if self.max_reports > 0 && reports.len() > self.max_reports {
            let drain_count = reports.len() - self.max_reports;
            reports.drain(..drain_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn report(n: usize) -> ErrorReport {
        ErrorReport::new(
            &ModLogError::Api(ApiError::new(format!("failure {}", n))),
            vec![
                ReportField::new("Service", "ModLogService"),
                ReportField::new("Hook", "guildBanAdd"),
            ],
        )
    }

    #[test]
    fn test_report_fields() {
        let r = report(1);
        assert_eq!(r.error, "API error: failure 1");
        assert_eq!(r.field("Hook"), Some("guildBanAdd"));
        assert_eq!(r.field("Guild"), None);
    }

    #[tokio::test]
    async fn test_memory_reporter_list_most_recent_first() {
        let reporter = MemoryErrorReporter::default();
        for i in 0..5 {
            reporter.report(report(i)).await;
        }

        assert_eq!(reporter.count().await, 5);
        let list = reporter.list(3).await;
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].error, "API error: failure 4");
        assert_eq!(list[2].error, "API error: failure 2");
    }

    #[tokio::test]
    async fn test_memory_reporter_max_capacity() {
        let reporter = MemoryErrorReporter::new(2);
        for i in 0..4 {
            reporter.report(report(i)).await;
        }

        assert_eq!(reporter.count().await, 2);
        let list = reporter.list(10).await;
        assert_eq!(list[0].error, "API error: failure 3");
        assert_eq!(list[1].error, "API error: failure 2");
    }

    #[tokio::test]
    async fn test_tracing_reporter_accepts_report() {
        TracingErrorReporter.report(report(0)).await;
    }
}
