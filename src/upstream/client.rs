//! HTTP client for the external line-of-business systems.
//!
//! One `UpstreamClient` per upstream system. Every call is a single
//! attempt bounded by the client timeout; retry policy does not live here.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::FetchError;

/// Envelope fields that upstream systems wrap their collections in.
const ENVELOPE_FIELDS: [&str; 4] = ["data", "items", "results", "result"];

/// Client for one upstream system.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
    name: &'static str,
}

impl UpstreamClient {
    /// Create a client for the system at `base_url`; every request is
    /// bounded by `timeout`.
    pub fn new(name: &'static str, base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| format!("Failed to build HTTP client for {}", name))?;

        Ok(Self {
            client,
            base_url,
            name,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the request URL from raw path segments; each segment is
    /// percent-encoded.
    pub fn url_for(&self, segments: &[String]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Unreachable(format!("{} base URL cannot carry a path", self.name)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch a collection of raw records.
    pub async fn fetch_collection(&self, segments: &[String]) -> Result<Vec<Value>, FetchError> {
        let url = self.url_for(segments)?;
        debug!(upstream = self.name, %url, "Fetching upstream collection");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        extract_records(body)
    }
}

/// Pull the record array out of a response body: either a bare array or an
/// object carrying the array under one of the envelope fields.
pub fn extract_records(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => {
            for field in ENVELOPE_FIELDS {
                if let Some(Value::Array(records)) = map.remove(field) {
                    return Ok(records);
                }
            }
            Err(FetchError::Malformed(
                "expected a JSON array or an object with a data array".to_string(),
            ))
        }
        other => Err(FetchError::Malformed(format!(
            "expected a JSON array, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new("test", Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_extract_bare_array() {
        let records = extract_records(json!([{ "id": 1 }, { "id": 2 }])).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_extract_envelope() {
        let records = extract_records(json!({ "success": true, "data": [{ "id": 1 }] })).unwrap();
        assert_eq!(records, vec![json!({ "id": 1 })]);

        let records = extract_records(json!({ "items": [] })).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_extract_rejects_non_collections() {
        assert!(matches!(
            extract_records(json!({ "data": "nope" })),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(extract_records(json!(42)), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_url_for_encodes_segments() {
        let c = client("http://hr.local/api/");
        let url = c
            .url_for(&["user-profiles".to_string(), "a b/c".to_string(), "companies".to_string()])
            .unwrap();
        assert_eq!(url.as_str(), "http://hr.local/api/user-profiles/a%20b%2Fc/companies");
    }

    #[test]
    fn test_url_for_without_trailing_slash() {
        let c = client("http://drivers.local/v1");
        let url = c.url_for(&["drivers".to_string()]).unwrap();
        assert_eq!(url.as_str(), "http://drivers.local/v1/drivers");
    }
}
