//! Message types for actor communication

use tokio::sync::oneshot;

use crate::error::MonitorError;
use crate::monitor::RunReport;

/// Commands that can be sent to a MonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run immediately, bypassing the interval timer
    ///
    /// Used for testing and manual refresh operations.
    RunNow {
        /// Channel to send the run result back
        respond_to: oneshot::Sender<Result<RunReport, MonitorError>>,
    },

    /// Update the run interval
    ///
    /// The new interval takes effect after the current one elapses.
    UpdateInterval {
        /// New interval in seconds
        interval_secs: u64,
    },

    /// Gracefully shut down the monitor actor
    ///
    /// The actor finishes any in-flight run and then exits.
    Shutdown,
}
