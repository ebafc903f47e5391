//! Vector-store admin collaborators.

use async_trait::async_trait;

use rt_types::{TuneError, TuneResult};

/// Post-trial sanity check against the vector store's schema. Used only for
/// logging, never for control flow.
#[async_trait]
pub trait VectorStoreAdmin: Send + Sync + std::fmt::Debug {
    async fn class_exists(&self, class_name: &str) -> TuneResult<bool>;

    /// Get store name
    fn name(&self) -> &str;
}

/// Weaviate schema admin over its REST API.
#[derive(Debug, Clone)]
pub struct WeaviateAdmin {
    base_url: String,
    client: reqwest::Client,
}

impl WeaviateAdmin {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VectorStoreAdmin for WeaviateAdmin {
    async fn class_exists(&self, class_name: &str) -> TuneResult<bool> {
        let url = format!("{}/v1/schema/{}", self.base_url, class_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TuneError::Http(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(TuneError::Http(format!(
                "unexpected status {status} from {url}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "weaviate"
    }
}
