//! Nearest-neighbour lookup against an external vector index.
//!
//! The index is a black box: it receives a query vector and answers with up
//! to K ranked matches carrying free-form metadata. This module normalises
//! that metadata into [`RetrievedMatch`] so downstream code never sees a
//! missing field.


pub mod pinecone;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::MetadataKeys;
use crate::upstream::UpstreamError;

pub use pinecone::PineconeClient;

/// Stands in for any metadata value the index did not provide
pub const MISSING_FIELD: &str = "N/A";

/// One nearest-neighbour hit, ranked by the index's own score
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedMatch {
    pub id: String,
    pub score: Option<f32>,
    pub source: String,
    pub author: String,
    pub text: String,
}

impl RetrievedMatch {
    /// Build a match from raw index output, resolving every field that is
    /// absent, null or empty to [`MISSING_FIELD`]
    #[inline]
    pub fn from_metadata(
        id: Option<&str>,
        score: Option<f32>,
        metadata: Option<&Map<String, Value>>,
        keys: &MetadataKeys,
    ) -> Self {
        let id = id
            .filter(|id| !id.is_empty())
            .map_or_else(|| MISSING_FIELD.to_string(), str::to_string);

        Self {
            id,
            score,
            source: metadata_field(metadata, &keys.source),
            author: metadata_field(metadata, &keys.author),
            text: metadata_field(metadata, &keys.text),
        }
    }
}

/// Finds the stored documents closest to a query vector.
#[async_trait]
pub trait VectorRetriever: Send + Sync {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, UpstreamError>;
}

/// Read `key` from match metadata as display text.
///
/// Flat keys win; a dotted key such as `pdf.info.Author` falls back to a
/// nested lookup when no flat entry exists.
#[inline]
pub fn metadata_field(metadata: Option<&Map<String, Value>>, key: &str) -> String {
    let Some(metadata) = metadata else {
        return MISSING_FIELD.to_string();
    };

    let value = metadata.get(key).or_else(|| nested_lookup(metadata, key));
    value
        .and_then(render_value)
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

fn nested_lookup<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    let mut current = metadata.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(render_value).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}
