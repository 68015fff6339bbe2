//! Error types for the monitor and its collaborators
//!
//! Only [`MonitorError`] ever leaves a run. Everything else is contained at the
//! failure or delivery level and surfaces through the [`RunReport`].
//!
//! [`RunReport`]: crate::monitor::RunReport

/// Errors raised by a [`Cluster`](crate::cluster::Cluster)
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("cluster request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cluster responded with status {0}")]
    Status(u16),

    #[error("invalid cluster response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid cluster url: {0}")]
    InvalidUrl(String),

    #[error("cluster error: {0}")]
    Other(String),
}

/// Errors raised by an [`Uploader`](crate::uploader::Uploader)
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload failed: {0}")]
    Other(String),
}

/// Errors raised by a single reporter delivery
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("report endpoint responded with status {0}")]
    Status(u16),

    #[error("missing reporter setting `{0}`")]
    MissingSetting(String),

    #[error("report failed: {0}")]
    Other(String),
}

/// Reasons a single failure could not be dispatched at all
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("cannot get stdout and stderr urls from cluster: {0}")]
    Logs(#[source] ClusterError),

    #[error("cannot get stdout and stderr urls from uploader: {0}")]
    Upload(#[source] UploadError),
}

/// Errors that abort a whole run
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("failed to poll cluster for failures: {0}")]
    Poll(#[source] ClusterError),
}
