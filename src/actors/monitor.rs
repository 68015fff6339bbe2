//! MonitorActor - Runs the failure monitor on a fixed cadence
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → Monitor::run_once → log RunReport
//!     ↑
//!     └─── Commands (RunNow, UpdateInterval, Shutdown)
//! ```
//!
//! The first tick fires one full interval after spawn. A zero interval is
//! never accepted: spawning with one falls back to [`DEFAULT_INTERVAL`], and
//! an `UpdateInterval` to zero is ignored.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, interval_at};
use tracing::{debug, error, info, instrument, warn};

use crate::monitor::{Monitor, RunReport};

use super::messages::MonitorCommand;

/// Run interval used when none (or zero) is given
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Actor owning a single monitor
pub struct MonitorActor {
    monitor: Monitor,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// Current run interval
    interval_duration: Duration,
}

fn new_ticker(period: Duration) -> Interval {
    interval_at(Instant::now() + period, period)
}

impl MonitorActor {
    pub fn new(
        monitor: Monitor,
        command_rx: mpsc::Receiver<MonitorCommand>,
        interval_duration: Duration,
    ) -> Self {
        let interval_duration = if interval_duration.is_zero() {
            warn!(
                "zero run interval, using {}s instead",
                DEFAULT_INTERVAL.as_secs()
            );
            DEFAULT_INTERVAL
        } else {
            interval_duration
        };

        Self {
            monitor,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or the command channel closes.
    #[instrument(skip(self), fields(monitor = %self.monitor.name()))]
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        let mut ticker = new_ticker(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.monitor.run_once().await {
                        Ok(report) => log_report(&report),
                        Err(e) => error!("monitor run failed: {e}"),
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        MonitorCommand::RunNow { respond_to } => {
                            debug!("received RunNow command");
                            let result = self.monitor.run_once().await;
                            let _ = respond_to.send(result);
                        }

                        MonitorCommand::UpdateInterval { interval_secs: 0 } => {
                            warn!(
                                "ignoring zero run interval, keeping {}s",
                                self.interval_duration.as_secs()
                            );
                        }

                        MonitorCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = new_ticker(self.interval_duration);
                        }

                        MonitorCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("monitor actor stopped");
    }
}

fn log_report(report: &RunReport) {
    if !report.accepted.is_empty() {
        info!(
            "reported {} new failures ({} deliveries)",
            report.accepted.len(),
            report.delivered
        );
    }

    if !report.dispatch_failures.is_empty() || !report.delivery_failures.is_empty() {
        warn!(
            "{} failures could not be dispatched, {} deliveries failed",
            report.dispatch_failures.len(),
            report.delivery_failures.len()
        );
    }
}

/// Handle for controlling a MonitorActor
///
/// It can be cloned and shared across tasks. All commands are served by the
/// same actor, so runs issued through different clones never overlap.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,

    /// Name of the monitor
    pub name: String,
}

impl MonitorHandle {
    /// Spawn a monitor actor running every `interval`
    pub fn spawn(monitor: Monitor, interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let name = monitor.name().to_string();

        let actor = MonitorActor::new(monitor, cmd_rx, interval);

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            name,
        }
    }

    /// Trigger an immediate run and wait for its report
    pub async fn run_now(&self) -> Result<RunReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::RunNow { respond_to: tx })
            .await
            .context("failed to send RunNow command")?;

        let report = rx.await.context("failed to receive response")??;
        Ok(report)
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(MonitorCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the monitor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
