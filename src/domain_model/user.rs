use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub uuid::Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Recruiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Recruiter => "recruiter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub user_type: Role,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<uuid::Uuid>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Minimal identity projection derived from a successful profile fetch.
///
/// All fields are `None` while unauthenticated or while the profile has not
/// been fetched yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub id: Option<UserId>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    /// Company a recruiter is attached to, if any.
    pub company_id: Option<uuid::Uuid>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

impl From<&UserProfile> for Identity {
    fn from(profile: &UserProfile) -> Self {
        Identity {
            id: Some(profile.user_id),
            display_name: Some(profile.display_name()),
            role: Some(profile.user_type),
            company_id: profile.company_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_projects_into_identity() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "user_id": "7b0a1f8e-3c2d-4e5f-8a9b-0c1d2e3f4a5b",
            "email": "ada@example.com",
            "user_type": "recruiter",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "company_id": null,
        }))
        .unwrap();

        let identity = Identity::from(&profile);
        assert_eq!(identity.role, Some(Role::Recruiter));
        assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
        assert!(identity.is_resolved());
        assert!(identity.company_id.is_none());
    }

    #[test]
    fn display_name_trims_missing_last_name() {
        let profile = UserProfile {
            user_id: UserId(uuid::Uuid::nil()),
            email: "cher@example.com".into(),
            user_type: Role::Applicant,
            first_name: "Cher".into(),
            last_name: String::new(),
            company_id: None,
        };
        assert_eq!(profile.display_name(), "Cher");
    }
}
