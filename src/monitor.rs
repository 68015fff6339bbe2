//! Failure deduplication and dispatch
//!
//! A [`Monitor`] is driven by repeated calls to [`Monitor::run_once`]. Each run:
//!
//! ```text
//! poll cluster → evaluate each failure against the recent cache → dispatch accepted
//!                                                                   │
//!        logs → upload → every reporter × every label-configured instance
//!                                                                   │
//!                                              evict expired cache entries
//! ```
//!
//! ## Acceptance
//!
//! Evaluated per failure, in order:
//!
//! ```text
//! ID already cached          → Duplicate
//! (record ID → finished)
//! now - finished > timeout/2 → Stale
//! first run of the process   → FirstRun
//! otherwise                  → Accept
//! ```
//!
//! Every ID is recorded before the staleness and first-run checks, so a failure
//! is evaluated once no matter the outcome. Delivery is best-effort: a failed
//! report is not retried, since the ID stays cached until it expires.
//!
//! Runs must not overlap. `run_once` takes `&mut self`, and the host drives the
//! monitor from a single [`MonitorActor`](crate::actors::monitor::MonitorActor).

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::Failure;
use crate::cache::RecentFailureCache;
use crate::cluster::Cluster;
use crate::error::{DispatchError, MonitorError, ReportError};
use crate::labels::Labels;
use crate::reporter::{ReportConfig, Reporter};
use crate::uploader::Uploader;

/// Name used when no monitor name is configured
pub const DEFAULT_NAME: &str = "default";

/// Window after which recent failures are evicted, in seconds
pub const DEFAULT_TIMEOUT_SECS: i64 = 60;

/// Outcome of evaluating one polled failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    /// Already evaluated by this process
    Duplicate,
    /// Finished more than half a timeout before the run
    Stale,
    /// Seen during the first run; only primes the cache
    FirstRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Initialized,
}

/// A single (reporter, instance) delivery that failed
#[derive(Debug)]
pub struct DeliveryFailure {
    pub reporter: String,
    pub instance: String,
    pub failure_id: String,
    pub error: ReportError,
}

/// An accepted failure that could not be dispatched at all
#[derive(Debug)]
pub struct DispatchFailure {
    pub failure_id: String,
    pub error: DispatchError,
}

/// Result of dispatching one failure
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Successful deliveries
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

/// Everything a run did, including the errors it contained
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of failures returned by the cluster
    pub polled: usize,

    /// Whether this was the first run of the monitor
    pub first_run: bool,

    /// IDs accepted for dispatch, in poll order
    pub accepted: Vec<String>,

    /// IDs that were not dispatched, with the reason
    pub skipped: Vec<(String, Decision)>,

    /// Successful (reporter, instance) deliveries
    pub delivered: usize,

    pub dispatch_failures: Vec<DispatchFailure>,

    pub delivery_failures: Vec<DeliveryFailure>,

    /// Cache entries removed at the end of the run
    pub evicted: usize,
}

/// Routes new task failures to the configured reporters
pub struct Monitor {
    name: String,
    cluster: Box<dyn Cluster>,
    uploader: Box<dyn Uploader>,
    reporters: HashMap<String, Box<dyn Reporter>>,
    recent: RecentFailureCache,
    lifecycle: Lifecycle,
    timeout: TimeDelta,
}

impl Monitor {
    /// Create a monitor named `name`
    ///
    /// The name selects the label namespace reporters read their instances and
    /// settings from, so several monitors can share one cluster.
    pub fn new(
        name: impl ToString,
        cluster: impl Cluster + 'static,
        uploader: impl Uploader + 'static,
        reporters: HashMap<String, Box<dyn Reporter>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            cluster: Box::new(cluster),
            uploader: Box::new(uploader),
            reporters,
            recent: RecentFailureCache::new(),
            lifecycle: Lifecycle::Uninitialized,
            timeout: TimeDelta::seconds(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the cache window. Failures older than half of it are stale.
    pub fn with_timeout(mut self, timeout: TimeDelta) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    pub fn recent(&self) -> &RecentFailureCache {
        &self.recent
    }

    /// Run one poll-evaluate-dispatch-evict cycle at the current time
    pub async fn run_once(&mut self) -> Result<RunReport, MonitorError> {
        self.run_once_at(Utc::now()).await
    }

    /// Run one cycle as if the current time were `now`
    #[instrument(skip(self), fields(monitor = %self.name))]
    pub async fn run_once_at(&mut self, now: DateTime<Utc>) -> Result<RunReport, MonitorError> {
        let failures = self.cluster.failures().await.map_err(MonitorError::Poll)?;

        let first_run = self.lifecycle == Lifecycle::Uninitialized;
        if first_run {
            debug!("first run, priming recent failures without reporting");
            self.lifecycle = Lifecycle::Initialized;
        }

        let mut report = RunReport {
            polled: failures.len(),
            first_run,
            ..Default::default()
        };

        for failure in &failures {
            let decision = self.evaluate(failure, now, first_run);
            if decision != Decision::Accept {
                trace!(failure_id = %failure.id, "skipping failure: {decision:?}");
                report.skipped.push((failure.id.clone(), decision));
                continue;
            }

            report.accepted.push(failure.id.clone());
            match self.dispatch(failure).await {
                Ok(outcome) => {
                    report.delivered += outcome.delivered;
                    report.delivery_failures.extend(outcome.failures);
                }
                Err(e) => {
                    error!(failure_id = %failure.id, "failed to report failure: {e}");
                    report.dispatch_failures.push(DispatchFailure {
                        failure_id: failure.id.clone(),
                        error: e,
                    });
                }
            }
        }

        report.evicted = self.recent.evict(now, self.timeout);

        debug!(
            "run finished: {} polled, {} accepted, {} delivered, {} evicted",
            report.polled,
            report.accepted.len(),
            report.delivered,
            report.evicted
        );

        Ok(report)
    }

    /// Decide whether `failure` should be dispatched, recording it as seen
    pub fn evaluate(&mut self, failure: &Failure, now: DateTime<Utc>, first_run: bool) -> Decision {
        if self.recent.contains(&failure.id) {
            return Decision::Duplicate;
        }

        self.recent.record(&failure.id, failure.finished);

        if now.signed_duration_since(failure.finished) > self.timeout / 2 {
            return Decision::Stale;
        }

        if first_run {
            return Decision::FirstRun;
        }

        Decision::Accept
    }

    /// Resolve logs for `failure` and fan it out to every configured instance
    ///
    /// Fails only if the log locations cannot be determined. Individual
    /// delivery errors are logged and returned in the outcome.
    #[instrument(skip_all, fields(failure_id = %failure.id))]
    pub async fn dispatch(&self, failure: &Failure) -> Result<DispatchOutcome, DispatchError> {
        info!("reporting {failure}");

        let logs = self
            .cluster
            .logs(failure)
            .await
            .map_err(DispatchError::Logs)?;

        let logs = self
            .uploader
            .upload(failure, logs)
            .await
            .map_err(DispatchError::Upload)?;

        let labels = Labels::new(&self.name, &failure.labels);
        let mut outcome = DispatchOutcome::default();

        for (reporter_name, reporter) in &self.reporters {
            for instance in labels.instances(reporter_name) {
                let config = ReportConfig::new(&labels, reporter_name, &instance);

                match reporter
                    .report(failure, &config, &logs.stdout, &logs.stderr)
                    .await
                {
                    Ok(()) => {
                        trace!(reporter = %reporter_name, %instance, "delivered report");
                        outcome.delivered += 1;
                    }
                    Err(e) => {
                        warn!(
                            reporter = %reporter_name,
                            %instance,
                            error = %e,
                            "cannot generate report"
                        );
                        outcome.failures.push(DeliveryFailure {
                            reporter: reporter_name.clone(),
                            instance: instance.clone(),
                            failure_id: failure.id.clone(),
                            error: e,
                        });
                    }
                }
            }
        }

        Ok(outcome)
    }
}
