//! [`BranchSource`] that fetches the table from the major-branch lookup
//! service.
//!
//! `GET {base_url}/{model_version}` returns
//! `{"category_to_major_branch": {<category>: <branch>, ...}}`. The request
//! is blocking and bounded by [`HttpBranchSourceConfig::timeout`]; any
//! failure aborts the run as [`StorageError::MissingCategoryMapping`].

use std::time::Duration;

use reqwest::blocking::Client;

use synmap_core::CategoryBranchMap;

use crate::error::StorageError;
use crate::traits::{BranchMapDocument, BranchSource};

/// Default lookup-service endpoint, without the model version segment.
pub const DEFAULT_BRANCH_URL: &str = "https://tree-viz-biolink.herokuapp.com/major_branches/er";

/// Default Biolink model version.
pub const DEFAULT_MODEL_VERSION: &str = "3.0.3";

/// Configuration for [`HttpBranchSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBranchSourceConfig {
    /// Endpoint the model version is appended to.
    pub base_url: String,
    /// Whole-request timeout. Default: 30 seconds.
    pub timeout: Duration,
}

impl Default for HttpBranchSourceConfig {
    fn default() -> Self {
        HttpBranchSourceConfig {
            base_url: DEFAULT_BRANCH_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches the table over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBranchSource {
    config: HttpBranchSourceConfig,
    client: Client,
}

impl HttpBranchSource {
    pub fn new(config: HttpBranchSourceConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::MissingCategoryMapping {
                location: config.base_url.clone(),
                reason: format!("could not build HTTP client: {e}"),
            })?;
        Ok(HttpBranchSource { config, client })
    }

    /// The URL requested for `model_version`.
    pub fn url_for(&self, model_version: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), model_version)
    }
}

impl BranchSource for HttpBranchSource {
    fn category_to_branch(&self, model_version: &str) -> Result<CategoryBranchMap, StorageError> {
        let url = self.url_for(model_version);
        let unavailable = |reason: String| StorageError::MissingCategoryMapping {
            location: url.clone(),
            reason,
        };

        tracing::info!(url = %url, timeout_secs = self.config.timeout.as_secs(), "fetching category to major branch table");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        let document: BranchMapDocument = response
            .json()
            .map_err(|e| unavailable(format!("malformed response body: {e}")))?;
        let map = document.into_map(&url)?;

        tracing::info!(categories = map.len(), "fetched category to major branch table");
        Ok(map)
    }
}
