//! Long-lived auditing over a live authority
//!
//! `AuditMonitor` re-audits every registered view on a fixed interval while
//! writers keep changing truth. Each round's reports are broadcast to
//! subscribers, and reports with discrepancies are kept in an `AuditLog`.
//! An integrity violation ends the monitor; it is returned from
//! `MonitorHandle::stop`, never dropped.

use crate::audit::{Auditor, Diff};
use crate::error::{CrossViewError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

/// Monitor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Time between audit rounds in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Reports buffered per subscriber before slow subscribers lag
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Maximum reports kept by the default in-memory log (0 = unbounded)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_channel_capacity() -> usize {
    64
}

fn default_history_limit() -> usize {
    1000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            channel_capacity: default_channel_capacity(),
            history_limit: default_history_limit(),
        }
    }
}

impl MonitorConfig {
    /// Reject settings the runtime cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(CrossViewError::Config(
                "Monitor interval must be > 0 ms".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(CrossViewError::Config(
                "Monitor channel capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One view's audit result from one monitor round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Unique report identifier (aud-<uuid>)
    pub id: String,

    /// Monitor round that produced this report, starting at 0
    pub round: u64,

    /// When the audit completed
    pub timestamp: DateTime<Utc>,

    /// The computed diff
    pub diff: Diff,
}

impl AuditReport {
    /// Wrap a diff with a fresh id and timestamp
    pub fn new(round: u64, diff: Diff) -> Self {
        Self {
            id: format!("aud-{}", uuid::Uuid::new_v4()),
            round,
            timestamp: Utc::now(),
            diff,
        }
    }
}

/// Trait for audit report sinks
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Store a report
    async fn record(&self, report: AuditReport) -> Result<()>;

    /// Number of stored reports
    async fn count(&self) -> Result<usize>;

    /// Most recent reports first
    async fn list(&self, limit: usize) -> Result<Vec<AuditReport>>;
}

/// In-memory audit log with a capacity bound
pub struct MemoryAuditLog {
    reports: Arc<RwLock<Vec<AuditReport>>>,
    max_reports: usize,
}

impl MemoryAuditLog {
    /// Create a log keeping at most `max_reports` (0 = unbounded)
    pub fn new(max_reports: usize) -> Self {
        Self {
            reports: Arc::new(RwLock::new(Vec::new())),
            max_reports,
        }
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new(default_history_limit())
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, report: AuditReport) -> Result<()> {
        let mut reports = self.reports.write().await;
        reports.push(report);

        if self.max_reports > 0 && reports.len() > self.max_reports {
            let drain_count = reports.len() - self.max_reports;
            reports.drain(..drain_count);
        }

        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.reports.read().await.len())
    }

    async fn list(&self, limit: usize) -> Result<Vec<AuditReport>> {
        let reports = self.reports.read().await;
        Ok(reports.iter().rev().take(limit).cloned().collect())
    }
}

/// Periodic auditor for a live authority
pub struct AuditMonitor {
    auditor: Arc<Auditor>,
    config: MonitorConfig,
    log: Arc<dyn AuditLog>,
    sender: broadcast::Sender<AuditReport>,
}

impl AuditMonitor {
    /// Create a monitor with an in-memory log sized by `config.history_limit`
    pub fn new(auditor: Arc<Auditor>, config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        let (sender, _) = broadcast::channel(config.channel_capacity);
        let log = Arc::new(MemoryAuditLog::new(config.history_limit));

        Ok(Self {
            auditor,
            config,
            log,
            sender,
        })
    }

    /// Replace the audit log
    pub fn with_log(mut self, log: Arc<dyn AuditLog>) -> Self {
        self.log = log;
        self
    }

    /// The audit log in use
    pub fn log(&self) -> &Arc<dyn AuditLog> {
        &self.log
    }

    /// Stream of reports from every future round
    pub fn subscribe(&self) -> BroadcastStream<AuditReport> {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Audit every registered view once
    pub async fn run_once(&self, round: u64) -> Result<Vec<AuditReport>> {
        let diffs = self.auditor.audit_all()?;
        let mut reports = Vec::with_capacity(diffs.len());

        for diff in diffs {
            let report = AuditReport::new(round, diff);
            if !report.diff.is_clean() {
                self.log.record(report.clone()).await?;
            }
            // No subscribers is not an error
            if self.sender.send(report.clone()).is_err() {
                tracing::trace!(report = %report.id, "No subscribers for audit report");
            }
            reports.push(report);
        }

        tracing::debug!(round, views = reports.len(), "Audit round complete");
        Ok(reports)
    }

    /// Run rounds on the configured interval until stopped
    pub fn start(self: Arc<Self>) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = Duration::from_millis(self.config.interval_ms);

        tracing::info!(interval_ms = self.config.interval_ms, "Audit monitor started");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut rounds = 0u64;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once(rounds).await {
                            tracing::error!(round = rounds, error = %e, "Audit monitor halted");
                            return Err(e);
                        }
                        rounds += 1;
                    }
                }
            }

            tracing::info!(rounds, "Audit monitor stopped");
            Ok(rounds)
        });

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running monitor; dropping it also stops the monitor
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<u64>>,
}

impl MonitorHandle {
    /// Whether the monitor task has ended (stopped or halted)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the monitor and return the number of completed rounds, or the
    /// error that halted it
    pub async fn stop(mut self) -> Result<u64> {
        if let Some(tx) = self.shutdown.take() {
            // Already-exited task has dropped the receiver
            let _ = tx.send(());
        }

        self.task
            .await
            .map_err(|e| CrossViewError::Monitor(format!("Monitor task failed: {}", e)))?
    }
}
