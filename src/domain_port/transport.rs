use crate::domain_model::Credential;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        })
    }
}

/// What a request is for. The dispatcher decides credential handling from
/// this tag, never from the URL.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RequestKind {
    Resource,
    Login,
    Register,
    Refresh,
    Logout,
    Identity,
}

impl RequestKind {
    /// The refresh call authenticates through the cookie channel only.
    pub fn uses_bearer(&self) -> bool {
        !matches!(self, RequestKind::Refresh)
    }

    /// Whether a 401 on this kind of request means "session expired".
    /// A 401 from login or register means bad input, and a 401 from the
    /// refresh call itself must never re-enter the coordinator.
    pub fn recovers_via_refresh(&self) -> bool {
        matches!(
            self,
            RequestKind::Resource | RequestKind::Logout | RequestKind::Identity
        )
    }
}

/// Request descriptor passed down the call chain. `retried` is the
/// retry-once marker and lives only as long as the logical request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub kind: RequestKind,
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            kind: RequestKind::Resource,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Copy of this request carrying the retry marker.
    pub fn as_retry(&self) -> Self {
        let mut retry = self.clone();
        retry.retried = true;
        retry
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body<T: Serialize>(status: u16, body: &T) -> Self {
        Self::new(status, serde_json::to_string(body).unwrap_or_default())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Failures below HTTP semantics. None of these is ever an authorization
/// failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange. `bearer` is attached as
    /// `Authorization: Bearer <token>` when present.
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&Credential>,
    ) -> Result<RawResponse, TransportError>;
}
