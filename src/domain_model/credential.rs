use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque bearer token proving an authenticated session.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Tokens end up in logs through `?` fields; only a short prefix is shown.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "Credential({}…)", prefix)
    }
}

/// Body of `/auth/login` and `/auth/refresh` responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    pub fn credential(&self) -> Option<Credential> {
        if self.access_token.is_empty() {
            None
        } else {
            Some(Credential::new(self.access_token.clone()))
        }
    }
}
