//! Cluster collaborator: enumerates failures and resolves their log locations

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{instrument, trace};

use crate::error::ClusterError;
use crate::{Failure, LogUrls};

/// Source of task failures
///
/// Implementations must be `Send + Sync` since the monitor is driven from an
/// async task.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Currently known failures, in cluster order
    async fn failures(&self) -> Result<Vec<Failure>, ClusterError>;

    /// stdout and stderr locations of one failure
    async fn logs(&self, failure: &Failure) -> Result<LogUrls, ClusterError>;
}

/// Cluster reachable over a small JSON HTTP API
///
/// - `GET {url}/failures` returns a list of [`Failure`]
/// - `GET {url}/failures/{id}/logs` returns [`LogUrls`]
///
/// The failure ID is an opaque string and is sent as one percent-encoded path
/// segment.
#[derive(Debug, Clone)]
pub struct HttpCluster {
    url: Url,
    client: reqwest::Client,
}

impl HttpCluster {
    pub fn new(url: impl AsRef<str>) -> Result<Self, ClusterError> {
        let url = Url::parse(url.as_ref())
            .map_err(|e| ClusterError::InvalidUrl(format!("{}: {e}", url.as_ref())))?;
        if url.cannot_be_a_base() {
            return Err(ClusterError::InvalidUrl(url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { url, client })
    }

    /// Cluster URL with `segments` appended to its path
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClusterError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ClusterError::InvalidUrl(self.url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ClusterError> {
        trace!("requesting {url}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClusterError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Cluster for HttpCluster {
    #[instrument(skip(self), fields(cluster = %self.url))]
    async fn failures(&self) -> Result<Vec<Failure>, ClusterError> {
        let failures: Vec<Failure> = self.get_json(self.endpoint(&["failures"])?).await?;
        trace!("cluster returned {} failures", failures.len());
        Ok(failures)
    }

    #[instrument(skip(self, failure), fields(failure_id = %failure.id))]
    async fn logs(&self, failure: &Failure) -> Result<LogUrls, ClusterError> {
        self.get_json(self.endpoint(&["failures", &failure.id, "logs"])?).await
    }
}
