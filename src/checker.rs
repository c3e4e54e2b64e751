//! Client for the remote grammar checker.

use std::collections::BTreeMap;
use std::future::Future;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::settings::{Options, RequestEncoding};
use crate::types::{CheckRequest, CheckResponse, Match};

/// Anything that can answer a check request.
///
/// `CheckerClient` talks to a LanguageTool server; tests and offline hosts
/// plug in their own source.
pub trait MatchSource {
    /// Run one check. Sends exactly one request, never retries.
    fn check(&self, request: CheckRequest) -> impl Future<Output = Result<CheckResponse>>;
}

/// HTTP client for a LanguageTool-compatible server.
#[derive(Debug, Clone)]
pub struct CheckerClient {
    http: reqwest::Client,
    server: String,
    encoding: RequestEncoding,
}

impl CheckerClient {
    pub fn new(server: impl Into<String>, encoding: RequestEncoding) -> Self {
        Self {
            http: reqwest::Client::new(),
            server: server.into(),
            encoding,
        }
    }

    pub fn from_options(options: &Options) -> Self {
        Self::new(options.server.clone(), options.encoding)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Check `text` and return its matches, or None if the request or the
    /// response decoding failed. Failures are logged, not raised.
    pub async fn check_text(
        &self,
        text: &str,
        language: &str,
        extra: &BTreeMap<String, Value>,
    ) -> Option<Vec<Match>> {
        let request = CheckRequest::new(text, language, extra);
        match self.fetch(request).await {
            Ok(response) => Some(response.into_matches()),
            Err(e) => {
                tracing::warn!(error = %e, server = %self.server, "check request failed");
                None
            }
        }
    }

    /// POST one request and decode the response.
    pub async fn fetch(&self, request: CheckRequest) -> Result<CheckResponse> {
        tracing::debug!(
            server = %self.server,
            language = %request.language,
            chars = request.text.len(),
            "sending request to checker"
        );

        let builder = self.http.post(&self.server);
        let builder = match self.encoding {
            RequestEncoding::Json => builder.json(&request),
            RequestEncoding::Form => builder.form(&request.form_pairs()),
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let decoded: CheckResponse = serde_json::from_slice(&body)?;
        tracing::debug!(
            matches = decoded.matches.as_ref().map_or(0, Vec::len),
            "got response from checker"
        );
        Ok(decoded)
    }
}

impl MatchSource for CheckerClient {
    fn check(&self, request: CheckRequest) -> impl Future<Output = Result<CheckResponse>> {
        let client = self.clone();
        async move { client.fetch(request).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v2/check", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(request).unwrap()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + length
    }

    #[tokio::test]
    async fn json_request_and_response() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"matches":[{"offset":0,"length":4,"shortMessage":"Spelling","message":"Typo","rule":{"id":"TYPO"},"replacements":[{"value":"Hello"}]}]}"#,
        )
        .await;
        let client = CheckerClient::new(url, RequestEncoding::Json);

        let mut extra = BTreeMap::new();
        extra.insert("level".to_string(), Value::from("picky"));
        let matches = client.check_text("Helo", "en-US", &extra).await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].span(), 0..4);
        assert_eq!(matches[0].replacements, vec!["Hello"]);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v2/check"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"text":"Helo","language":"en-US","level":"picky"}"#));
    }

    #[tokio::test]
    async fn form_request() {
        let (url, server) = serve_once("200 OK", r#"{"matches":[]}"#).await;
        let client = CheckerClient::new(url, RequestEncoding::Form);

        let matches = client
            .check_text("a & b", "en-US", &BTreeMap::new())
            .await
            .unwrap();
        assert!(matches.is_empty());

        let raw = server.await.unwrap();
        assert!(raw
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));
        assert!(raw.ends_with("text=a+%26+b&language=en-US"));
    }

    #[tokio::test]
    async fn missing_matches_key_is_empty() {
        let (url, _server) = serve_once("200 OK", r#"{"software":{"name":"LanguageTool"}}"#).await;
        let client = CheckerClient::new(url, RequestEncoding::Json);

        let matches = client.check_text("Helo", "en-US", &BTreeMap::new()).await;
        assert_eq!(matches, Some(vec![]));
    }

    #[tokio::test]
    async fn non_json_response_is_no_result() {
        let (url, _server) = serve_once("200 OK", "Error: not json").await;
        let client = CheckerClient::new(url, RequestEncoding::Json);

        let result = client.fetch(CheckRequest::new("Helo", "en-US", &BTreeMap::new())).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (url, _server) = serve_once("500 Internal Server Error", "{}").await;
        let client = CheckerClient::new(url, RequestEncoding::Json);

        let result = client.fetch(CheckRequest::new("Helo", "en-US", &BTreeMap::new())).await;
        assert!(matches!(result, Err(Error::Status(500))));
    }

    #[tokio::test]
    async fn unreachable_server_is_no_result() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let client = CheckerClient::new(url, RequestEncoding::Json);
        assert_eq!(client.check_text("Helo", "en-US", &BTreeMap::new()).await, None);
    }
}
