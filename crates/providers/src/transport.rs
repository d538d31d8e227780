// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! JSON-over-HTTPS plumbing shared by the provider adapters
//!
//! Every provider in this crate speaks signed JSON `POST` requests. The
//! [`JsonTransport`] owns the HTTP client, maps `reqwest` failures onto
//! [`TransportError`], records request metrics and keeps the raw exchange so
//! order submissions can be audited.

use std::time::{Duration, Instant};

use provider_api::{ProviderError, ProviderResult, RawExchange, TransportError};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use url::Url;

use crate::metrics;

/// Longest response body kept in a [`TransportError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Signed JSON client bound to one provider base URL
#[derive(Debug, Clone)]
pub struct JsonTransport {
    client: Client,
    base_url: String,
    provider: &'static str,
}

/// One completed request/response pair
#[derive(Debug, Clone)]
pub struct Exchange {
    /// HTTP status of the response
    pub status: StatusCode,
    /// Serialized request body
    pub request: String,
    /// Raw response body
    pub response: String,
}

impl JsonTransport {
    /// Create a transport for `provider` rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the URL does not parse or the
    /// HTTP client cannot be built
    pub fn new(provider: &'static str, base_url: &str, timeout: Duration) -> ProviderResult<Self> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| ProviderError::config(format!("invalid base URL {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::config(format!(
                "unsupported URL scheme for {provider}: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fulfillment-hub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            provider,
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST` a JSON body to `path` and capture the exchange
    ///
    /// Non-success HTTP statuses are not errors here: several providers put
    /// their failure envelope in a 4xx body, so decoding decides.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] on timeout, connection failure or an
    /// unreadable body
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> ProviderResult<Exchange> {
        let url = format!("{}{path}", self.base_url);
        let request = serde_json::to_string(body)?;

        debug!(provider = self.provider, operation, url, "sending provider request");
        let started = Instant::now();
        let result = self.send(&url, request.clone()).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok((status, response)) => {
                let label = if status.is_success() { "ok" } else { "error" };
                metrics::observe_provider_request(self.provider, operation, label, elapsed);
                debug!(
                    provider = self.provider,
                    operation,
                    status = status.as_u16(),
                    elapsed_secs = elapsed,
                    "provider responded"
                );
                Ok(Exchange {
                    status,
                    request,
                    response,
                })
            }
            Err(error) => {
                metrics::observe_provider_request(self.provider, operation, "error", elapsed);
                warn!(provider = self.provider, operation, %error, "provider request failed");
                Err(error.into())
            }
        }
    }

    async fn send(&self, url: &str, body: String) -> Result<(StatusCode, String), TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        Ok((status, body))
    }
}

impl Exchange {
    /// Decode the response body as `T`
    ///
    /// A body that does not decode is reported as [`TransportError::Status`]
    /// when the HTTP status was not a success, otherwise as
    /// [`TransportError::Decode`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the body cannot be decoded
    pub fn decode<T: DeserializeOwned>(&self) -> ProviderResult<T> {
        match serde_json::from_str(&self.response) {
            Ok(value) => Ok(value),
            Err(_) if !self.status.is_success() => Err(TransportError::Status {
                status: self.status.as_u16(),
                body: truncate(&self.response),
            }
            .into()),
            Err(error) => Err(error.into()),
        }
    }

    /// Raw exchange for audit trails
    pub fn raw(&self) -> RawExchange {
        RawExchange {
            request: self.request.clone(),
            response: self.response.clone(),
        }
    }
}

/// Map a `reqwest` failure onto the transport taxonomy
pub fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_decode() || error.is_body() {
        TransportError::Decode {
            message: error.to_string(),
        }
    } else {
        TransportError::Connection {
            message: error.to_string(),
        }
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((index, _)) => format!("{}...", &body[..index]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Envelope {
        ok: bool,
    }

    #[test]
    fn rejects_invalid_base_urls() {
        let timeout = Duration::from_secs(1);
        assert!(JsonTransport::new("test", "not a url", timeout).is_err());
        assert!(JsonTransport::new("test", "ftp://example.com", timeout).is_err());

        let transport = JsonTransport::new("test", "https://example.com/v1/", timeout).unwrap();
        assert_eq!(transport.base_url(), "https://example.com/v1");
    }

    #[test]
    fn truncates_long_bodies() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let truncated = truncate(&body);
        assert_eq!(truncated.len(), MAX_ERROR_BODY_CHARS + 3);
        assert_eq!(truncate("short"), "short");
    }

    #[tokio::test]
    async fn posts_json_and_captures_exchange() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"cmd": "ping"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&mock_server)
            .await;

        let transport =
            JsonTransport::new("test", &mock_server.uri(), Duration::from_secs(5)).unwrap();
        let exchange = transport
            .post("ping", "/echo", &json!({"cmd": "ping"}))
            .await
            .unwrap();

        assert_eq!(exchange.status, StatusCode::OK);
        assert!(exchange.decode::<Envelope>().unwrap().ok);
        let raw = exchange.raw();
        assert_eq!(raw.request, r#"{"cmd":"ping"}"#);
        assert!(raw.response.contains("true"));
    }

    #[tokio::test]
    async fn non_envelope_error_status_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let transport =
            JsonTransport::new("test", &mock_server.uri(), Duration::from_secs(5)).unwrap();
        let exchange = transport.post("broken", "/broken", &json!({})).await.unwrap();

        let error = exchange.decode::<Envelope>().unwrap_err();
        assert!(matches!(
            error,
            ProviderError::Transport(TransportError::Status { status: 502, .. })
        ));
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let transport =
            JsonTransport::new("test", &mock_server.uri(), Duration::from_secs(5)).unwrap();
        let exchange = transport.post("garbage", "/garbage", &json!({})).await.unwrap();

        assert!(matches!(
            exchange.decode::<Envelope>(),
            Err(ProviderError::Transport(TransportError::Decode { .. }))
        ));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let transport =
            JsonTransport::new("test", &mock_server.uri(), Duration::from_millis(200)).unwrap();
        let error = transport.post("slow", "/slow", &json!({})).await.unwrap_err();
        assert!(matches!(
            error,
            ProviderError::Transport(TransportError::Timeout)
        ));
    }

    #[tokio::test]
    async fn unreachable_provider_is_connection_error() {
        let transport =
            JsonTransport::new("test", "http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let error = transport.post("ping", "/", &json!({})).await.unwrap_err();
        assert!(matches!(
            error,
            ProviderError::Transport(TransportError::Connection { .. })
        ));
    }
}
