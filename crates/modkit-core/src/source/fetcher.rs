//! Manifest Fetcher
//!
//! Retrieves manifest documents and plugin content over HTTP.

use std::time::Duration;

use crate::error::{ModkitError, Result};

/// Remote fetch seam.
///
/// `ManifestFetcher` is the production implementation; the sync engine and
/// install path are written against this trait so they can run offline.
pub trait Fetch {
    /// GET a url and parse the body as a JSON document.
    ///
    /// Schema validation is the caller's responsibility (see
    /// [`crate::source::Manifest::from_value`]).
    fn fetch_document(&self, url: &str) -> Result<serde_json::Value>;

    /// GET a url and return the raw body text.
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with a per-request timeout
pub struct ManifestFetcher {
    client: reqwest::blocking::Client,
}

impl ManifestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        let status = response.status();

        if status != reqwest::StatusCode::OK {
            return Err(ModkitError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text()?)
    }
}

impl Fetch for ManifestFetcher {
    fn fetch_document(&self, url: &str) -> Result<serde_json::Value> {
        let body = self.get(url)?;
        parse_document(&body).ok_or_else(|| ModkitError::NotJson {
            url: url.to_string(),
        })
    }

    fn fetch_text(&self, url: &str) -> Result<String> {
        self.get(url)
    }
}

/// Strict JSON parse with a tolerant fallback for wrapped payloads.
pub(crate) fn parse_document(body: &str) -> Option<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }

    recover_embedded_json(body)
}

/// Best-effort extraction of a JSON object embedded in non-JSON text.
///
/// Some hosting endpoints wrap JSON payloads in HTML (pastebin-style
/// viewers), so after a strict parse fails we try the span from the first
/// `{` to the last `}`, newlines included. The span is a heuristic: nothing
/// guarantees it is the intended object, and text with several objects or
/// stray braces will not recover. Failures surface as `NotJson` upstream.
pub fn recover_embedded_json(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str(&text[start..=end]) {
        Ok(value) => {
            log::warn!("recovered a JSON object embedded in a non-JSON response body");
            Some(value)
        }
        Err(err) => {
            log::warn!("embedded JSON recovery failed: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse() {
        let value = parse_document(r#"{"name": "n", "id": "i", "data": []}"#).unwrap();
        assert_eq!(value["id"], "i");
    }

    #[test]
    fn test_recovers_json_wrapped_in_html() {
        let body = "<html><body><pre>{\"name\":\"n\",\"id\":\"i\",\"data\":[]}</pre></body></html>";

        let value = parse_document(body).unwrap();
        assert_eq!(value["name"], "n");
        assert_eq!(value["data"], serde_json::json!([]));
    }

    #[test]
    fn test_recovers_multiline_embedded_json() {
        let body = "garbage before\n{\n  \"name\": \"n\",\n  \"id\": \"i\",\n  \"data\": []\n}\ngarbage after";

        let value = recover_embedded_json(body).unwrap();
        assert_eq!(value["id"], "i");
    }

    #[test]
    fn test_no_brace_span() {
        assert!(parse_document("<html>no json here</html>").is_none());
        assert!(recover_embedded_json("} backwards {x").is_none());
    }

    #[test]
    fn test_unparsable_span() {
        assert!(recover_embedded_json("{definitely not json}").is_none());
    }
}
