//! Actor that schedules monitor runs
//!
//! The [`Monitor`](crate::monitor::Monitor) itself is a plain struct with a
//! `run_once` operation. This module wraps it in an actor running as an
//! independent tokio task, so timer ticks and on-demand runs are serialized and
//! runs never overlap.
//!
//! ```text
//! Timer tick ──┐
//!              ├──→ MonitorActor ──→ Monitor::run_once
//! RunNow ──────┘        ↑
//!                       └─── Commands (RunNow, UpdateInterval, Shutdown)
//! ```

pub mod messages;
pub mod monitor;
