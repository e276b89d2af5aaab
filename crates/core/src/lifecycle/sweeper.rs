//! Periodic close of idle tickets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::audit::TicketEvent;
use crate::config::Config;
use crate::metrics;

use super::{CloseRequest, TicketError, TicketManager, UserRef};

/// Sweeper tunables.
#[derive(Debug, Clone)]
pub struct SweeperSettings {
    pub interval: Duration,
    /// Idle time after which a ticket is closed. Zero disables the sweeper.
    pub timeout: Duration,
    /// Identity recorded as the closer.
    pub executor: UserRef,
    pub reason: String,
}

impl SweeperSettings {
    pub fn from_config(config: &Config) -> Self {
        let executor_id = config
            .discord
            .bot_user_id
            .clone()
            .unwrap_or_else(|| "system".to_string());
        Self {
            interval: Duration::from_secs(config.tickets.sweep_interval_secs.max(1)),
            timeout: Duration::from_secs(config.tickets.inactivity_timeout_hours * 3600),
            executor: UserRef::new(executor_id, "system"),
            reason: config.messages.auto_close_reason.clone(),
        }
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub closed: Vec<String>,
    pub failed: Vec<String>,
    pub pruned_rate_limits: usize,
}

/// Background task closing tickets idle past the timeout.
pub struct InactivitySweeper {
    manager: Arc<TicketManager>,
    settings: SweeperSettings,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl InactivitySweeper {
    pub fn new(manager: Arc<TicketManager>, settings: SweeperSettings) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            manager,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Spawn the sweep loop.
    pub fn start(&self) {
        if self.settings.timeout.is_zero() {
            info!("Inactivity sweeper disabled");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Inactivity sweeper already running");
            return;
        }

        let running = Arc::clone(&self.running);
        let manager = Arc::clone(&self.manager);
        let settings = self.settings.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(
                interval_secs = settings.interval.as_secs(),
                timeout_hours = settings.timeout.as_secs() / 3600,
                "Inactivity sweeper started"
            );
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Inactivity sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(settings.interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        sweep(&manager, &settings, Utc::now()).await;
                    }
                }
            }
            info!("Inactivity sweeper stopped");
        });
    }

    /// Signal the loop to stop. A pass in progress finishes first.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Inactivity sweeper not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
    }

    /// Run one pass as of `now`.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> SweepReport {
        sweep(&self.manager, &self.settings, now).await
    }
}

async fn sweep(manager: &TicketManager, settings: &SweeperSettings, now: DateTime<Utc>) -> SweepReport {
    metrics::SWEEP_RUNS.inc();
    let mut report = SweepReport {
        pruned_rate_limits: manager.rate_limiter().prune_expired(now).await,
        ..Default::default()
    };

    let timeout = match chrono::Duration::from_std(settings.timeout) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        _ => return report,
    };

    let tickets = match manager.tickets().await {
        Ok(tickets) => tickets,
        Err(e) => {
            warn!("Inactivity sweep could not read the index: {}", e);
            return report;
        }
    };

    for record in tickets.into_iter().filter(|r| r.is_idle(now, timeout)) {
        let request = CloseRequest::inactivity(
            settings.executor.clone(),
            settings.reason.clone(),
            now,
            timeout,
        );
        match manager.close_ticket(&record.channel_id, request).await {
            Ok(_) => {
                manager
                    .emit(TicketEvent::TicketAutoClosed {
                        channel_id: record.channel_id.clone(),
                        idle_hours: (now - record.last_active_at).num_hours(),
                    })
                    .await;
                report.closed.push(record.channel_id);
            }
            // closed by someone else in the meantime
            Err(TicketError::NotATicket(_)) | Err(TicketError::AlreadyClosing(_)) => {}
            Err(TicketError::StillActive(_)) => {
                debug!(channel_id = %record.channel_id, "Ticket became active during the sweep");
            }
            Err(e) => {
                warn!(channel_id = %record.channel_id, "Automatic close failed: {}", e);
                report.failed.push(record.channel_id);
            }
        }
    }

    if !report.closed.is_empty() || !report.failed.is_empty() {
        info!(
            closed = report.closed.len(),
            failed = report.failed.len(),
            "Inactivity sweep finished"
        );
    } else {
        debug!("Inactivity sweep found nothing to close");
    }
    report
}
