use crate::domain_model::Credential;
use crate::domain_port::{ApiRequest, HttpMethod, RawResponse, Transport, TransportError};
use crate::logger::*;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Backend origin, e.g. `http://localhost:8000`. Request paths are
    /// appended to it.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// `reqwest`-backed transport. The client keeps a cookie jar so the
/// backend's refresh cookie rides along on `/auth/refresh`.
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&Credential>,
    ) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .http
            .request(method(request.method), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(credential) = bearer {
            builder = builder.header(AUTHORIZATION, credential.bearer());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        trace!(method = %request.method, path = %request.path, status, "http exchange");

        Ok(RawResponse::new(status, body))
    }
}
