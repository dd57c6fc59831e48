//! Periodic task scheduler
//!
//! Runs background tasks at regular intervals, independent of request
//! handling. Add new tasks by implementing the `PeriodicTask` trait.

use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::config::CONFIG;
use crate::models::audit_log::{AuditAction, ResourceType};
use crate::services::audit::{AuditEntry, AuditService};
use crate::services::notification::ExpiryScanner;

/// Trait for periodic background tasks
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    /// How often to run
    fn interval(&self) -> Duration;

    /// Execute the task
    async fn run(&self) -> anyhow::Result<()>;
}

/// Start all periodic tasks
pub fn start_scheduler(scanner: ExpiryScanner, audit: AuditService) -> Vec<JoinHandle<()>> {
    let every = Duration::from_secs(CONFIG.notifications.expiry_scan_interval_secs.max(1));
    let threshold_days = CONFIG.notifications.expiry_threshold_days;

    let tasks: Vec<Box<dyn PeriodicTask>> = vec![
        Box::new(DocumentExpiryScanTask {
            scanner: scanner.clone(),
            audit: audit.clone(),
            threshold_days,
            every,
        }),
        Box::new(DirectorTermScanTask {
            scanner,
            audit,
            threshold_days,
            every,
        }),
    ];

    let handles = tasks
        .into_iter()
        .map(|task| tokio::spawn(run_task(task)))
        .collect();

    tracing::info!(interval_secs = every.as_secs(), threshold_days, "Periodic task scheduler started");
    handles
}

/// Run a single task on its interval
async fn run_task(task: Box<dyn PeriodicTask>) {
    let mut ticker = interval(task.interval());

    // Skip the first immediate tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        tracing::debug!(task = task.name(), "Running periodic task");

        match task.run().await {
            Ok(()) => {
                tracing::debug!(task = task.name(), "Periodic task completed");
            }
            Err(e) => {
                tracing::error!(task = task.name(), error = %e, "Periodic task failed");
            }
        }
    }
}

// ============================================================================
// Expiry scans
// ============================================================================

/// Notifies uploaders about documents nearing or past their expiry date
pub struct DocumentExpiryScanTask {
    pub scanner: ExpiryScanner,
    pub audit: AuditService,
    pub threshold_days: i64,
    pub every: Duration,
}

#[async_trait]
impl PeriodicTask for DocumentExpiryScanTask {
    fn name(&self) -> &'static str {
        "document_expiry_scan"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> anyhow::Result<()> {
        let today = chrono::Utc::now().date_naive();
        let summary = self
            .scanner
            .scan_expiring_documents(self.threshold_days, today)
            .await?;

        if summary.created > 0 {
            self.audit
                .record(
                    AuditEntry::new(AuditAction::ExpiryScan, ResourceType::System)
                        .resource("documents")
                        .details(serde_json::json!({
                            "found": summary.found,
                            "created": summary.created,
                            "threshold_days": self.threshold_days,
                        })),
                )
                .await;
        }
        Ok(())
    }
}

/// Notifies company members about director terms ending soon or already ended
pub struct DirectorTermScanTask {
    pub scanner: ExpiryScanner,
    pub audit: AuditService,
    pub threshold_days: i64,
    pub every: Duration,
}

#[async_trait]
impl PeriodicTask for DirectorTermScanTask {
    fn name(&self) -> &'static str {
        "director_term_scan"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> anyhow::Result<()> {
        let today = chrono::Utc::now().date_naive();
        let summary = self
            .scanner
            .scan_expiring_director_terms(self.threshold_days, today)
            .await?;

        if summary.created > 0 {
            self.audit
                .record(
                    AuditEntry::new(AuditAction::ExpiryScan, ResourceType::System)
                        .resource("directors")
                        .details(serde_json::json!({
                            "found": summary.found,
                            "created": summary.created,
                            "threshold_days": self.threshold_days,
                        })),
                )
                .await;
        }
        Ok(())
    }
}
