
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{RetrievedMatch, VectorRetriever};
use crate::config::{MetadataKeys, RetrievalConfig};
use crate::upstream::{self, UpstreamError};

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2024-07";

/// Data-plane client for one Pinecone index namespace
#[derive(Clone)]
pub struct PineconeClient {
    index_host: Url,
    namespace: String,
    api_key: String,
    metadata_keys: MetadataKeys,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Debug, Deserialize)]
struct ScoredVector {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

impl PineconeClient {
    #[inline]
    pub fn new(
        index_host: Url,
        config: &RetrievalConfig,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            index_host,
            namespace: config.namespace.clone(),
            api_key: api_key.into(),
            metadata_keys: config.metadata.clone(),
            agent: upstream::build_agent(timeout),
        }
    }

    /// Build a client, asking the control plane for the index host when the
    /// configuration does not pin one.
    #[inline]
    pub fn connect(
        config: &RetrievalConfig,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let api_key = api_key.into();
        let index_host = match &config.index_host {
            Some(host) => host.clone(),
            None => {
                let agent = upstream::build_agent(timeout);
                describe_index_host(&agent, &config.controller_url, &config.index_name, &api_key)?
            }
        };

        info!(
            "Using vector index '{}' at {} (namespace '{}')",
            config.index_name, index_host, config.namespace
        );

        Ok(Self::new(index_host, config, api_key, timeout))
    }

    #[inline]
    pub fn index_host(&self) -> &Url {
        &self.index_host
    }

    /// Query the index on the calling thread
    #[inline]
    pub fn query_blocking(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, UpstreamError> {
        if vector.is_empty() {
            return Err(UpstreamError::InvalidInput(
                "query vector is empty".to_string(),
            ));
        }
        if top_k == 0 {
            return Err(UpstreamError::InvalidInput(
                "top_k must be at least 1".to_string(),
            ));
        }

        debug!(
            "Querying {} for top {} matches ({} dimensions)",
            self.index_host,
            top_k,
            vector.len()
        );

        let url = upstream::endpoint(&self.index_host, "query")?;
        let request = QueryRequest {
            namespace: &self.namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = upstream::post_json(
            &self.agent,
            &url,
            &[
                (API_KEY_HEADER, self.api_key.as_str()),
                (API_VERSION_HEADER, API_VERSION),
            ],
            &request,
        )?;

        if response.matches.len() > top_k {
            warn!(
                "Index returned {} matches for top_k {}, truncating",
                response.matches.len(),
                top_k
            );
        }

        let matches: Vec<RetrievedMatch> = response
            .matches
            .iter()
            .take(top_k)
            .map(|hit| {
                RetrievedMatch::from_metadata(
                    hit.id.as_deref(),
                    hit.score,
                    hit.metadata.as_ref(),
                    &self.metadata_keys,
                )
            })
            .collect();

        debug!("Retrieved {} matches", matches.len());
        Ok(matches)
    }
}

/// Resolve the data-plane host of `index_name` through the control plane.
///
/// A 404 here means the index does not exist.
#[inline]
pub fn describe_index_host(
    agent: &ureq::Agent,
    controller_url: &Url,
    index_name: &str,
    api_key: &str,
) -> Result<Url, UpstreamError> {
    let url = upstream::endpoint(controller_url, &format!("indexes/{index_name}"))?;

    let description: IndexDescription = upstream::get_json(
        agent,
        &url,
        &[(API_KEY_HEADER, api_key), (API_VERSION_HEADER, API_VERSION)],
    )
    .map_err(|error| match error {
        UpstreamError::Status { status: 404, body } => UpstreamError::Status {
            status: 404,
            body: format!("index '{index_name}' not found: {body}"),
        },
        other => other,
    })?;

    let raw = if description.host.contains("://") {
        description.host
    } else {
        format!("https://{}", description.host)
    };

    Url::parse(&raw).map_err(|e| UpstreamError::Decode(format!("invalid index host {raw}: {e}")))
}

#[async_trait]
impl VectorRetriever for PineconeClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, UpstreamError> {
        let client = self.clone();
        let vector = vector.to_vec();
        upstream::run_blocking(move || client.query_blocking(&vector, top_k)).await
    }
}

impl fmt::Debug for PineconeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeClient")
            .field("index_host", &self.index_host.as_str())
            .field("namespace", &self.namespace)
            .field("metadata_keys", &self.metadata_keys)
            .finish_non_exhaustive()
    }
}
