//! AnkiConnect transport.
//!
//! [`AnkiTransport`] is the single seam between the sync engine and Anki:
//! an `invoke(action, params)` call returning the action's `result` or a
//! remote error. [`AnkiConnect`] implements it over HTTP.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// AnkiConnect API version this client speaks.
pub const API_VERSION: u32 = 6;

/// Something that can run AnkiConnect actions.
///
/// Implementations must report transport failures, non-success responses
/// and error payloads uniformly as `Error::Remote`.
pub trait AnkiTransport: Send + Sync {
    /// Run `action` with `params` and return its `result` value.
    fn invoke(
        &self,
        action: &str,
        params: Option<JsonValue>,
    ) -> impl Future<Output = Result<JsonValue>> + Send;
}

impl<T: AnkiTransport> AnkiTransport for &T {
    fn invoke(
        &self,
        action: &str,
        params: Option<JsonValue>,
    ) -> impl Future<Output = Result<JsonValue>> + Send {
        (**self).invoke(action, params)
    }
}

/// AnkiConnect request envelope.
#[derive(Debug, Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<JsonValue>,
}

/// AnkiConnect response envelope.
#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: JsonValue,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP transport to a running AnkiConnect add-on.
pub struct AnkiConnect {
    client: reqwest::Client,
    endpoint: String,
}

impl AnkiConnect {
    /// Create a transport for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AnkiTransport for AnkiConnect {
    async fn invoke(&self, action: &str, params: Option<JsonValue>) -> Result<JsonValue> {
        let request = Request {
            action,
            version: API_VERSION,
            params,
        };
        debug!(action, endpoint = %self.endpoint, "AnkiConnect request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::remote(action, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote(action, format!("HTTP {status}: {body}")));
        }

        let reply: Response = response
            .json()
            .await
            .map_err(|e| Error::remote(action, format!("invalid response: {e}")))?;

        decode_reply(action, reply)
    }
}

fn decode_reply(action: &str, reply: Response) -> Result<JsonValue> {
    if let Some(error) = reply.error {
        return Err(Error::remote(action, error));
    }
    trace!(action, result = %reply.result, "AnkiConnect response");
    Ok(reply.result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let request = Request {
            action: "findNotes",
            version: API_VERSION,
            params: Some(serde_json::json!({"query": "deck:X"})),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"action": "findNotes", "version": 6, "params": {"query": "deck:X"}})
        );

        let bare = Request {
            action: "version",
            version: API_VERSION,
            params: None,
        };
        assert_eq!(
            serde_json::to_string(&bare).unwrap(),
            r#"{"action":"version","version":6}"#
        );
    }

    #[test]
    fn test_error_payload_is_remote_error() {
        let reply: Response =
            serde_json::from_str(r#"{"result": null, "error": "model was not found"}"#).unwrap();
        let err = decode_reply("modelFieldNames", reply).unwrap_err();
        assert!(matches!(err, Error::Remote { ref action, .. } if action == "modelFieldNames"));
    }

    #[test]
    fn test_null_result_without_error_is_ok() {
        let reply: Response = serde_json::from_str(r#"{"result": null, "error": null}"#).unwrap();
        assert_eq!(decode_reply("createDeck", reply).unwrap(), JsonValue::Null);
    }

    /// Serve one canned HTTP response on a loopback port, return its URL.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        url
    }

    fn connect(url: String) -> AnkiConnect {
        AnkiConnect::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_http_error_status_is_remote_error() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\nboom",
        )
        .await;
        let err = connect(url).invoke("version", None).await.unwrap_err();
        match err {
            Error::Remote { action, message } => {
                assert_eq!(action, "version");
                assert!(message.contains("HTTP 500"), "{message}");
                assert!(message.contains("boom"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_remote_error() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot json!",
        )
        .await;
        let err = connect(url).invoke("deckNames", None).await.unwrap_err();
        assert!(
            matches!(err, Error::Remote { ref message, .. } if message.contains("invalid response")),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_successful_round_trip() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 25\r\nConnection: close\r\n\r\n{\"result\":6,\"error\":null}",
        )
        .await;
        let result = connect(url).invoke("version", None).await.unwrap();
        assert_eq!(result, serde_json::json!(6));
    }

    #[tokio::test]
    async fn test_error_payload_over_http_is_remote_error() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 44\r\nConnection: close\r\n\r\n{\"result\":null,\"error\":\"deck was not found\"}",
        )
        .await;
        let err = connect(url).invoke("addNote", None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "AnkiConnect call 'addNote' failed: deck was not found"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_remote_error() {
        let transport =
            AnkiConnect::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = transport.invoke("version", None).await.unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
    }
}
