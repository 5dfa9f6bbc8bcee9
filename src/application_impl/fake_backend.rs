use crate::application_port::paths::*;
use crate::domain_model::*;
use crate::domain_port::{ApiRequest, HttpMethod, RawResponse, Transport, TransportError};
use crate::session::lock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub struct FakeBackendConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
    /// Simulated round-trip time of every call.
    pub latency: std::time::Duration,
}

impl Default for FakeBackendConfig {
    fn default() -> Self {
        Self {
            issuer: "jobboard.fake".to_string(),
            access_ttl: Duration::minutes(15),
            signing_key: b"fake-backend-signing-key".to_vec(),
            latency: std::time::Duration::from_millis(5),
        }
    }
}

#[derive(Debug, Clone)]
struct FakeUser {
    profile: UserProfile,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    generation: u64,
}

/// In-memory stand-in for the job-board backend, speaking the same wire
/// format. Access tokens are HS256 JWTs; the refresh session lives in a
/// simulated cookie jar, like a browser's.
pub struct FakeBackend {
    config: FakeBackendConfig,
    users: DashMap<String, FakeUser>,
    refresh_sessions: DashMap<String, UserId>,
    cookie: Mutex<Option<String>>,
    jobs: Vec<JobListing>,
    token_generation: AtomicU64,
    fail_refresh: AtomicBool,
    offline: AtomicBool,
    calls: DashMap<String, u64>,
}

impl FakeBackend {
    pub fn new(config: FakeBackendConfig) -> Self {
        Self {
            config,
            users: DashMap::new(),
            refresh_sessions: DashMap::new(),
            cookie: Mutex::new(None),
            jobs: Vec::new(),
            token_generation: AtomicU64::new(0),
            fail_refresh: AtomicBool::new(false),
            offline: AtomicBool::new(false),
            calls: DashMap::new(),
        }
    }

    /// Backend seeded with one applicant, one recruiter and `jobs` open
    /// listings. Both demo users have the password `Passw0rd!`.
    pub fn seeded(jobs: usize) -> Self {
        let mut backend = Self::new(FakeBackendConfig::default());
        backend.add_user("applicant@example.com", "Passw0rd!", "Grace", "Hopper", Role::Applicant);
        backend.add_user("recruiter@example.com", "Passw0rd!", "Ada", "Lovelace", Role::Recruiter);
        backend.jobs = (0..jobs).map(fake_job).collect();
        backend
    }

    pub fn add_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
    ) -> UserId {
        let user_id = UserId(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, email.as_bytes()));
        self.users.insert(
            email.to_string(),
            FakeUser {
                profile: UserProfile {
                    user_id,
                    email: email.to_string(),
                    user_type: role,
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    company_id: None,
                },
                password: password.to_string(),
            },
        );
        user_id
    }

    /// Reject every access token issued so far, as if they all expired.
    pub fn expire_access_tokens(&self) {
        self.token_generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_refresh_failure(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self, path: &str) -> u64 {
        self.calls.get(path).map(|c| *c).unwrap_or(0)
    }

    fn route(&self, request: &ApiRequest, bearer: Option<&Credential>) -> RawResponse {
        match (request.method, request.path.as_str()) {
            (HttpMethod::Post, LOGIN_PATH) => self.login(request),
            (HttpMethod::Post, REGISTER_PATH) => self.register(request),
            (HttpMethod::Post, REFRESH_PATH) => self.refresh(),
            (HttpMethod::Post, LOGOUT_PATH) => self.logout(),
            (HttpMethod::Get, ME_PATH) => match self.authenticate(bearer) {
                Ok(user) => RawResponse::json_body(200, &user.profile),
                Err(response) => response,
            },
            (HttpMethod::Put, ME_PATH) => match self.authenticate(bearer) {
                Ok(user) => self.update_me(user, request),
                Err(response) => response,
            },
            (HttpMethod::Get, JOB_FEED_PATH) => match self.authenticate(bearer) {
                Ok(_) => self.feed(request),
                Err(response) => response,
            },
            _ => detail(404, "Not Found"),
        }
    }

    fn login(&self, request: &ApiRequest) -> RawResponse {
        let body = request.body.clone().unwrap_or_default();
        let email = body["email"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();

        let Some(user) = self.users.get(email).map(|u| u.clone()) else {
            return detail(401, "Incorrect email or password");
        };
        if user.password != password {
            return detail(401, "Incorrect email or password");
        }
        self.open_session(user.profile.user_id)
    }

    fn register(&self, request: &ApiRequest) -> RawResponse {
        let body = request.body.clone().unwrap_or_default();
        let field = |name: &str| body[name].as_str().unwrap_or_default().to_string();
        let email = field("email");
        if self.users.contains_key(&email) {
            return detail(400, "Email already registered");
        }
        let role = match body["user_type"].as_str() {
            Some("recruiter") => Role::Recruiter,
            _ => Role::Applicant,
        };
        let user_id = self.add_user(
            &email,
            &field("password"),
            &field("first_name"),
            &field("last_name"),
            role,
        );
        RawResponse::json_body(
            201,
            &json!({ "message": "User registered successfully", "user_id": user_id }),
        )
    }

    fn refresh(&self) -> RawResponse {
        if self.fail_refresh.load(Ordering::SeqCst) {
            return detail(401, "Refresh token missing or invalid");
        }
        let Some(cookie) = lock(&self.cookie).clone() else {
            return detail(401, "Refresh token missing or invalid");
        };
        let Some((_, user_id)) = self.refresh_sessions.remove(&cookie) else {
            return detail(401, "Refresh token missing or invalid");
        };
        self.open_session(user_id)
    }

    fn logout(&self) -> RawResponse {
        if let Some(cookie) = lock(&self.cookie).take() {
            self.refresh_sessions.remove(&cookie);
        }
        RawResponse::json_body(200, &json!({ "message": "Logged out successfully" }))
    }

    fn update_me(&self, user: FakeUser, request: &ApiRequest) -> RawResponse {
        let company_id = request
            .body
            .as_ref()
            .and_then(|b| b["company_id"].as_str())
            .and_then(|s| s.parse::<uuid::Uuid>().ok());
        if let Some(mut entry) = self.users.get_mut(&user.profile.email) {
            entry.profile.company_id = company_id;
        }
        RawResponse::json_body(200, &json!({ "message": "Profile updated successfully" }))
    }

    fn feed(&self, request: &ApiRequest) -> RawResponse {
        let param = |name: &str| {
            request
                .query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        let limit = param("limit").and_then(|l| l.parse::<usize>().ok()).unwrap_or(20).max(1);
        let offset = param("cursor").and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let q = param("q").map(str::to_lowercase);

        let mut matching: Vec<&JobListing> = self
            .jobs
            .iter()
            .filter(|job| q.as_ref().is_none_or(|q| job.title.to_lowercase().contains(q)))
            .filter(|job| param("location").is_none_or(|l| job.location == l))
            .collect();
        if param("sort_order") == Some("asc") {
            matching.sort_by_key(|job| job.posted_at);
        } else {
            matching.sort_by_key(|job| std::cmp::Reverse(job.posted_at));
        }

        let items: Vec<&JobListing> = matching.iter().skip(offset).take(limit).copied().collect();
        let next = offset + items.len();
        let next_cursor = (next < matching.len()).then(|| next.to_string());
        RawResponse::json_body(200, &json!({ "items": items, "next_cursor": next_cursor }))
    }

    fn open_session(&self, user_id: UserId) -> RawResponse {
        let refresh_token = nanoid::nanoid!(32);
        self.refresh_sessions.insert(refresh_token.clone(), user_id);
        *lock(&self.cookie) = Some(refresh_token);

        match self.issue_access_token(user_id) {
            Ok(token) => RawResponse::json_body(
                200,
                &json!({ "access_token": token, "token_type": "bearer" }),
            ),
            Err(e) => detail(500, &e.to_string()),
        }
    }

    fn issue_access_token(&self, user_id: UserId) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            exp: (iat + self.config.access_ttl).timestamp(),
            iat: iat.timestamp(),
            iss: self.config.issuer.clone(),
            generation: self.token_generation.load(Ordering::SeqCst),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.config.signing_key),
        )
    }

    fn authenticate(&self, bearer: Option<&Credential>) -> Result<FakeUser, RawResponse> {
        let not_authenticated = || detail(401, "Not authenticated");
        let token = bearer.ok_or_else(not_authenticated)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.clone()]);
        let claims = decode::<AccessClaims>(
            token.as_str(),
            &DecodingKey::from_secret(&self.config.signing_key),
            &validation,
        )
        .map_err(|_| detail(401, "Could not validate credentials"))?
        .claims;

        if claims.generation != self.token_generation.load(Ordering::SeqCst) {
            return Err(detail(401, "Token expired"));
        }
        let user_id: UserId = claims.sub.parse().map_err(|_| not_authenticated())?;
        self.users
            .iter()
            .find(|u| u.profile.user_id == user_id)
            .map(|u| u.clone())
            .ok_or_else(not_authenticated)
    }
}

#[async_trait::async_trait]
impl Transport for FakeBackend {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&Credential>,
    ) -> Result<RawResponse, TransportError> {
        *self.calls.entry(request.path.clone()).or_insert(0) += 1;
        tokio::time::sleep(self.config.latency).await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("fake backend is offline".to_string()));
        }
        Ok(self.route(request, bearer))
    }
}

fn detail(status: u16, message: &str) -> RawResponse {
    RawResponse::json_body(status, &json!({ "detail": message }))
}

fn fake_job(index: usize) -> JobListing {
    let posted_at = DateTime::from_timestamp(1_735_689_600 - index as i64 * 3_600, 0).unwrap_or_default();
    let locations = ["Remote", "Berlin", "Lagos", "Toronto"];
    JobListing {
        job_id: uuid::Uuid::from_u128(index as u128 + 1),
        company_id: uuid::Uuid::from_u128(1_000),
        company_name: Some("Analytical Engines Ltd".to_string()),
        recruiter_id: uuid::Uuid::from_u128(2_000),
        title: format!("Software Engineer {}", index + 1),
        description: "Build and run backend services.".to_string(),
        requirements: "Rust, SQL".to_string(),
        skills_required: Some("rust,tokio".to_string()),
        location: locations[index % locations.len()].to_string(),
        experience_level: Some("junior".to_string()),
        job_type: if index % 3 == 0 { JobType::Internship } else { JobType::FullTime },
        salary_range: None,
        expires_at: None,
        status: JobStatus::Open,
        posted_at,
        updated_at: posted_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::RequestKind;

    async fn login(backend: &FakeBackend) -> Credential {
        let request = ApiRequest::post(LOGIN_PATH)
            .kind(RequestKind::Login)
            .json(&json!({ "email": "recruiter@example.com", "password": "Passw0rd!" }))
            .unwrap();
        let response = backend.execute(&request, None).await.unwrap();
        assert_eq!(response.status, 200);
        response.json::<TokenResponse>().unwrap().credential().unwrap()
    }

    #[tokio::test]
    async fn issued_token_authenticates_until_expired() {
        let backend = FakeBackend::seeded(0);
        let credential = login(&backend).await;

        let me = ApiRequest::get(ME_PATH);
        let response = backend.execute(&me, Some(&credential)).await.unwrap();
        let profile: UserProfile = response.json().unwrap();
        assert_eq!(profile.user_type, Role::Recruiter);

        backend.expire_access_tokens();
        let response = backend.execute(&me, Some(&credential)).await.unwrap();
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn refresh_rotates_the_cookie_session() {
        let backend = FakeBackend::seeded(0);
        login(&backend).await;

        let refresh = ApiRequest::post(REFRESH_PATH).kind(RequestKind::Refresh);
        assert_eq!(backend.execute(&refresh, None).await.unwrap().status, 200);
        assert_eq!(backend.execute(&refresh, None).await.unwrap().status, 200);
        assert_eq!(backend.refresh_sessions.len(), 1);

        backend.execute(&ApiRequest::post(LOGOUT_PATH), None).await.unwrap();
        assert_eq!(backend.execute(&refresh, None).await.unwrap().status, 401);
        assert_eq!(backend.calls(REFRESH_PATH), 3);
    }

    #[tokio::test]
    async fn feed_pages_with_offset_cursor() {
        let backend = FakeBackend::seeded(5);
        let credential = login(&backend).await;

        let first = ApiRequest::get(JOB_FEED_PATH).query(vec![("limit".into(), "2".into())]);
        let page: FeedPage = backend
            .execute(&first, Some(&credential))
            .await
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));

        let last = ApiRequest::get(JOB_FEED_PATH)
            .query(vec![("limit".into(), "2".into()), ("cursor".into(), "4".into())]);
        let page: FeedPage = backend
            .execute(&last, Some(&credential))
            .await
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn offline_is_a_transport_error() {
        let backend = FakeBackend::seeded(0);
        backend.set_offline(true);
        let result = backend.execute(&ApiRequest::get(ME_PATH), None).await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
