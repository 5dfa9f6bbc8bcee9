use crate::application_port::paths::ME_PATH;
use crate::application_port::{AccountService, ApiError, MessageResponse, UpdateProfileInput};
use crate::domain_model::UserProfile;
use crate::domain_port::{ApiRequest, RequestKind};
use crate::session::Dispatcher;
use std::sync::Arc;

pub struct RealAccountService {
    dispatcher: Arc<Dispatcher>,
}

impl RealAccountService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> RealAccountService {
        RealAccountService { dispatcher }
    }
}

#[async_trait::async_trait]
impl AccountService for RealAccountService {
    async fn me(&self) -> Result<UserProfile, ApiError> {
        let request = ApiRequest::get(ME_PATH).kind(RequestKind::Identity);
        self.dispatcher.send_json(request).await
    }

    async fn update_me(&self, input: UpdateProfileInput) -> Result<MessageResponse, ApiError> {
        let request = ApiRequest::put(ME_PATH).json(&input)?;
        self.dispatcher.send_json(request).await
    }
}
