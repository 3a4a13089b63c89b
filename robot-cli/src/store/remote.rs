//! HTTP client for the build tracking server
//!
//! Search results stream back as newline-delimited JSON, one entity per line.
//! A line of the form `{"error": "..."}` aborts the stream with a remote
//! error. Dropping a [`RemoteClient`] releases its connection pool.

use super::{RawVisitor, RemoteStore, TrackUpdate, Visit};
use async_trait::async_trait;
use futures::StreamExt;
use robot_common::config::ClientConfig;
use robot_common::models::{BuildInformation, Domain, Track, UploadResult};
use robot_common::{Error, Query, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Header carrying the original file name of stashed content
pub const STASH_NAME_HEADER: &str = "X-Stash-Name";

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a Query,
}

#[derive(Serialize)]
struct AddBuildRequest<'a> {
    id: &'a str,
    information: &'a BuildInformation,
}

#[derive(Deserialize)]
struct StashResponse {
    id: String,
}

/// Connection to a build tracking server
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

fn remote(err: reqwest::Error) -> Error {
    Error::Remote(err.to_string())
}

impl RemoteClient {
    /// Open a connection using the resolved client configuration
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(remote)?;
        let base_url = config.server.trim_end_matches('/').to_string();
        debug!("Connected to {}", base_url);
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Turn non-2xx responses into remote errors carrying the body
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Remote(format!("{}: {}", status, body.trim())))
    }
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        debug!("Closed connection to {}", self.base_url);
    }
}

/// Decode one stream line and hand it to the visitor
fn dispatch(payload: &[u8], visitor: &mut RawVisitor<'_>) -> Result<()> {
    let value: Value = serde_json::from_slice(payload)?;
    if let Some(message) = stream_error(&value) {
        return Err(Error::Remote(message));
    }
    match visitor(value) {
        Visit::Continue => Ok(()),
        Visit::Stop(err) => Err(err),
    }
}

fn stream_error(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get("error")?.as_str().map(str::to_string)
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

#[async_trait]
impl RemoteStore for RemoteClient {
    async fn search(&self, domain: Domain, query: &Query, visitor: &mut RawVisitor<'_>) -> Result<()> {
        let url = self.url(&format!("search/{}", domain.collection()));
        let response = self
            .http
            .post(url)
            .json(&SearchRequest { query })
            .send()
            .await
            .map_err(remote)?;
        let response = Self::check(response).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(remote)?;
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let payload = &line[..line.len() - 1];
                if is_blank(payload) {
                    continue;
                }
                dispatch(payload, visitor)?;
            }
        }
        if !is_blank(&buffer) {
            dispatch(&buffer, visitor)?;
        }
        Ok(())
    }

    async fn stash_upload(&self, id: &str, name: &str, content: Vec<u8>) -> Result<String> {
        let response = self
            .http
            .put(self.url(&format!("stash/{}", id)))
            .header(STASH_NAME_HEADER, name)
            .body(content)
            .send()
            .await
            .map_err(remote)?;
        let stashed: StashResponse = Self::check(response).await?.json().await.map_err(remote)?;
        Ok(stashed.id)
    }

    async fn add_build(&self, id: &str, information: &BuildInformation) -> Result<UploadResult> {
        let response = self
            .http
            .post(self.url("builds"))
            .json(&AddBuildRequest { id, information })
            .send()
            .await
            .map_err(remote)?;
        Self::check(response).await?.json().await.map_err(remote)
    }

    async fn update_track(&self, update: &TrackUpdate) -> Result<Track> {
        let response = self
            .http
            .post(self.url("tracks"))
            .json(update)
            .send()
            .await
            .map_err(remote)?;
        Self::check(response).await?.json().await.map_err(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_error_line_detected() {
        assert_eq!(stream_error(&json!({"error": "boom"})), Some("boom".to_string()));
        assert_eq!(stream_error(&json!({"error": "boom", "id": "x"})), None);
        assert_eq!(stream_error(&json!({"id": "x"})), None);
        assert_eq!(stream_error(&json!("error")), None);
    }

    #[test]
    fn test_dispatch_propagates_visitor_stop() {
        let mut visitor = |_: Value| Visit::Stop(Error::Ambiguous("dup".to_string()));
        let err = dispatch(br#"{"id":"t1"}"#, &mut visitor).unwrap_err();
        assert!(matches!(err, Error::Ambiguous(_)));
    }

    #[test]
    fn test_dispatch_rejects_invalid_json() {
        let mut visitor = |_: Value| Visit::Continue;
        let err = dispatch(b"{not json", &mut visitor).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_connect_trims_trailing_slash() {
        let config = ClientConfig {
            server: "http://localhost:9/".to_string(),
            connect_timeout_secs: 5,
        };
        let client = RemoteClient::connect(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9");
        assert_eq!(client.url("builds"), "http://localhost:9/api/builds");
    }
}
