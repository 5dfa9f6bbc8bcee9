use crate::application_port::ApiResult;
use crate::application_port::paths::JOB_FEED_PATH;
use crate::domain_model::{FeedPage, FeedQuery, JobListing};
use crate::domain_port::ApiRequest;
use crate::logger::*;
use crate::session::Dispatcher;
use std::sync::Arc;

pub struct JobFeed {
    dispatcher: Arc<Dispatcher>,
    query: FeedQuery,
    items: Vec<JobListing>,
    cursor: Option<String>,
    exhausted: bool,
}

impl JobFeed {
    pub fn new(dispatcher: Arc<Dispatcher>, query: FeedQuery) -> Self {
        Self {
            dispatcher,
            query,
            items: Vec::new(),
            cursor: None,
            exhausted: false,
        }
    }

    /// Fetch the page after the last one loaded and append it. Returns the
    /// newly loaded listings, or `None` once the feed is exhausted. A failed
    /// fetch leaves the feed where it was, so it can be retried.
    pub async fn next_page(&mut self) -> ApiResult<Option<&[JobListing]>> {
        if self.exhausted {
            return Ok(None);
        }

        let request = ApiRequest::get(JOB_FEED_PATH).query(self.query.to_pairs(self.cursor.as_deref()));
        let page: FeedPage = self.dispatcher.send_json(request).await?;
        debug!(
            loaded = page.items.len(),
            has_more = page.next_cursor.is_some(),
            "job feed page"
        );

        let start = self.items.len();
        self.items.extend(page.items);
        self.exhausted = page.next_cursor.is_none();
        self.cursor = page.next_cursor;
        Ok(Some(&self.items[start..]))
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    pub fn items(&self) -> &[JobListing] {
        &self.items
    }

    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    /// Start over from the first page with new filters.
    pub fn reset(&mut self, query: FeedQuery) {
        self.query = query;
        self.items.clear();
        self.cursor = None;
        self.exhausted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::FakeBackend;
    use crate::application_port::ApiError;
    use crate::application_port::paths::LOGIN_PATH;
    use crate::domain_model::{PageSize, TokenResponse};
    use crate::domain_port::{RequestKind, Transport};
    use crate::session::{RefreshCoordinator, SessionState};

    async fn feed(jobs: usize, limit: u16) -> (Arc<FakeBackend>, JobFeed) {
        let backend = Arc::new(FakeBackend::seeded(jobs));
        let login = ApiRequest::post(LOGIN_PATH)
            .kind(RequestKind::Login)
            .json(&serde_json::json!({ "email": "applicant@example.com", "password": "Passw0rd!" }))
            .unwrap();
        let token: TokenResponse = backend.execute(&login, None).await.unwrap().json().unwrap();

        let session = Arc::new(SessionState::new());
        session.set(token.credential().unwrap());
        let coordinator = Arc::new(RefreshCoordinator::new(backend.clone(), session.clone()));
        let dispatcher = Arc::new(Dispatcher::new(backend.clone(), session, coordinator));
        let query = FeedQuery {
            limit: PageSize(limit),
            ..Default::default()
        };
        (backend, JobFeed::new(dispatcher, query))
    }

    #[tokio::test]
    async fn pages_until_cursor_runs_out() {
        let (backend, mut feed) = feed(5, 2).await;

        assert_eq!(feed.next_page().await.unwrap().unwrap().len(), 2);
        assert_eq!(feed.next_page().await.unwrap().unwrap().len(), 2);
        assert!(feed.has_more());
        assert_eq!(feed.next_page().await.unwrap().unwrap().len(), 1);
        assert!(!feed.has_more());
        assert!(feed.next_page().await.unwrap().is_none());

        assert_eq!(feed.items().len(), 5);
        assert_eq!(backend.calls(JOB_FEED_PATH), 3);
    }

    #[tokio::test]
    async fn expired_session_is_recovered_between_pages() {
        let (backend, mut feed) = feed(4, 2).await;
        feed.next_page().await.unwrap();

        backend.expire_access_tokens();
        let second = feed.next_page().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(feed.dispatcher.coordinator().refresh_count(), 1);
    }

    #[tokio::test]
    async fn failed_page_can_be_retried() {
        let (backend, mut feed) = feed(3, 2).await;
        backend.set_offline(true);
        assert!(matches!(feed.next_page().await, Err(ApiError::Network(_))));
        assert!(feed.items().is_empty());

        backend.set_offline(false);
        assert_eq!(feed.next_page().await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reset_starts_over() {
        let (_backend, mut feed) = feed(3, 5).await;
        feed.next_page().await.unwrap();
        assert!(!feed.has_more());

        feed.reset(FeedQuery {
            q: Some("engineer 2".to_string()),
            ..Default::default()
        });
        assert!(feed.items().is_empty());
        assert!(feed.has_more());
        let page = feed.next_page().await.unwrap().unwrap();
        assert_eq!(page.len(), 1);
    }
}
