use crate::application_port::{ApiError, MessageResponse};
use crate::domain_model::UserProfile;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UpdateProfileInput {
    pub company_id: Option<uuid::Uuid>,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn me(&self) -> Result<UserProfile, ApiError>;
    async fn update_me(&self, input: UpdateProfileInput) -> Result<MessageResponse, ApiError>;
}
