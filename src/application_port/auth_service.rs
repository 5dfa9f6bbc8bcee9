use crate::application_port::ApiError;
use crate::domain_model::{Credential, Role, UserId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid Email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid Email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    pub user_type: Role,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: UserId,
    /// Present when the backend confirms registration with a session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn password_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("password");
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < 8 {
        return Err(password_error("Password must be at least 8 characters"));
    }
    if len > 35 {
        return Err(password_error("Password must be at most 35 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(password_error("Must include at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(password_error("Must include at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(password_error("Must include at least one number"));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(password_error("Must include at least one special character"));
    }
    Ok(())
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange email and password for a session. On success the credential
    /// is committed to the session state.
    async fn login(&self, input: LoginInput) -> Result<Credential, ApiError>;
    async fn register(&self, input: RegisterInput) -> Result<RegisterResponse, ApiError>;
    /// Re-establish a session from the out-of-band refresh channel.
    /// Returns whether a session is active afterwards.
    async fn restore_session(&self) -> bool;
    /// Ends the session. Local state is cleared whatever the backend answers.
    async fn logout(&self) -> Result<MessageResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("nouppercase1!").is_err());
        assert!(validate_password("NOLOWERCASE1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
        assert!(validate_password(&format!("Aa1!{}", "x".repeat(32))).is_err());
    }

    #[test]
    fn login_input_validation() {
        let bad_email = LoginInput {
            email: "not-an-email".into(),
            password: "Str0ng!pass".into(),
        };
        let error = ApiError::from(bad_email.validate().unwrap_err());
        assert!(matches!(error, ApiError::Validation(ref m) if m == "Invalid Email"));

        let ok = LoginInput {
            email: "ada@example.com".into(),
            password: "Str0ng!pass".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn register_requires_names() {
        let input = RegisterInput {
            first_name: String::new(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Str0ng!pass".into(),
            user_type: Role::Applicant,
        };
        let error = ApiError::from(input.validate().unwrap_err());
        assert_eq!(error.user_message(), "First name is required");
    }
}
