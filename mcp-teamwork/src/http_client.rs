//! HTTPS implementation of [`ApiClient`] on top of hyper.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use hyper::{Body, Client, Request, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;
use url::Url;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::client::{ApiClient, ApiError, ApiRequest, ApiResult};

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));
    Client::builder().build::<_, Body>(connector)
}

/// Connection settings for [`HttpApiClient`].
#[derive(Clone)]
pub struct HttpClientConfig {
    base_url: Url,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.bearer_token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpClientConfig {
    /// Creates settings for the installation at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the URL is not an absolute
    /// http(s) URL.
    pub fn new(base_url: impl AsRef<str>) -> ApiResult<Self> {
        Ok(Self {
            base_url: sanitize_base_url(base_url.as_ref())?,
            bearer_token: None,
            timeout: Duration::from_secs(30),
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets the timeout applied to each request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the normalised base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }
}

fn sanitize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| ApiError::configuration(format!("invalid base url `{raw}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ApiError::configuration(format!(
            "base url `{raw}` must be an http(s) URL"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// [`ApiClient`] speaking JSON over HTTPS.
pub struct HttpApiClient {
    client: HyperClient,
    config: HttpClientConfig,
}

impl fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpApiClient {
    /// Constructs a client from the supplied settings.
    #[must_use]
    pub fn new(config: HttpClientConfig) -> Self {
        Self {
            client: build_https_client(),
            config,
        }
    }

    fn endpoint(&self, request: &ApiRequest) -> ApiResult<Uri> {
        let mut url = self
            .config
            .base_url
            .join(request.path().trim_start_matches('/'))
            .map_err(|err| {
                ApiError::configuration(format!("invalid request path `{}`: {err}", request.path()))
            })?;

        if !request.query_pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                pairs.append_pair(key, value);
            }
        }

        url.as_str()
            .parse::<Uri>()
            .map_err(|err| ApiError::configuration(format!("invalid request url `{url}`: {err}")))
    }

    fn build_request(&self, request: &ApiRequest) -> ApiResult<Request<Body>> {
        let mut builder = Request::builder()
            .method(request.method().clone())
            .uri(self.endpoint(request)?)
            .header(ACCEPT, "application/json");

        if let Some(token) = &self.config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::configuration("bearer token is not a valid header value"))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        let body = match request.body() {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                let encoded = serde_json::to_vec(body).map_err(|err| {
                    ApiError::transport(format!("failed to encode request body: {err}"))
                })?;
                Body::from(encoded)
            }
            None => Body::empty(),
        };

        builder
            .body(body)
            .map_err(|err| ApiError::transport(format!("failed to build request: {err}")))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let req = self.build_request(&request)?;
        debug!(method = %req.method(), path = request.path(), "sending API request");

        let response = timeout(self.config.timeout, self.client.request(req))
            .await
            .map_err(|_| ApiError::transport("request timed out"))?
            .map_err(|err| ApiError::transport(format!("request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| ApiError::transport(format!("failed to read response: {err}")))?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "API response received");

        if status.is_client_error() {
            return Err(ApiError::Client {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if status.is_server_error() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::transport(format!("unexpected status {status}")));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let config = HttpClientConfig::new("https://acme.teamwork.com/sub?x=1").unwrap();
        assert_eq!(config.base_url(), "https://acme.teamwork.com/sub/");

        assert!(matches!(
            HttpClientConfig::new("ftp://acme.teamwork.com"),
            Err(ApiError::Configuration { .. })
        ));
        assert!(HttpClientConfig::new("not a url").is_err());
    }

    #[tokio::test]
    async fn endpoint_joins_path_and_query() {
        let client = HttpApiClient::new(HttpClientConfig::new("https://acme.teamwork.com").unwrap());
        let request = ApiRequest::get("/desk/api/v2/tickets.json")
            .query("search", "printer jam")
            .query("page", 1);

        let uri = client.endpoint(&request).unwrap();
        assert_eq!(
            uri.to_string(),
            "https://acme.teamwork.com/desk/api/v2/tickets.json?search=printer+jam&page=1"
        );
    }

    #[tokio::test]
    async fn requests_carry_auth_and_body() {
        let config = HttpClientConfig::new("https://acme.teamwork.com")
            .unwrap()
            .with_bearer_token("tkn");
        let client = HttpApiClient::new(config);

        let request = client
            .build_request(&ApiRequest::post("projects/api/v3/tasks.json").json(json!({ "task": {} })))
            .unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tkn");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");

        assert!(!format!("{client:?}").contains("tkn"));
    }
}
