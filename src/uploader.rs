//! Uploader collaborator: relocates log artifacts before they are reported

use async_trait::async_trait;

use crate::error::UploadError;
use crate::{Failure, LogUrls};

#[async_trait]
pub trait Uploader: Send + Sync {
    /// Relocate the logs of `failure`, returning the URLs reporters should link
    async fn upload(&self, failure: &Failure, logs: LogUrls) -> Result<LogUrls, UploadError>;
}

/// Uploader that keeps the cluster's log URLs as they are
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUploader;

#[async_trait]
impl Uploader for NoopUploader {
    async fn upload(&self, _failure: &Failure, logs: LogUrls) -> Result<LogUrls, UploadError> {
        Ok(logs)
    }
}
