use crate::domain_model::PageSize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
    Contract,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    pub job_id: uuid::Uuid,
    pub company_id: uuid::Uuid,
    #[serde(default)]
    pub company_name: Option<String>,
    pub recruiter_id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    #[serde(default)]
    pub skills_required: Option<String>,
    pub location: String,
    #[serde(default)]
    pub experience_level: Option<String>,
    pub job_type: JobType,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub posted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    PostedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filters for `GET /job-listings/feed`. The cursor is managed by the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<uuid::Uuid>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: PageSize,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            q: None,
            location: None,
            job_type: None,
            experience_level: None,
            status: None,
            company_id: None,
            sort_by: SortBy::PostedAt,
            sort_order: SortOrder::Desc,
            limit: PageSize::default(),
        }
    }
}

impl FeedQuery {
    /// Query-string pairs in wire form, with the cursor appended when set.
    pub fn to_pairs(&self, cursor: Option<&str>) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(self) {
            for (key, value) in map {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => continue,
                    other => other.to_string(),
                };
                pairs.push((key, value));
            }
        }
        if let Some(cursor) = cursor {
            pairs.push(("cursor".to_string(), cursor.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub items: Vec<JobListing>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_pairs() {
        let pairs = FeedQuery::default().to_pairs(None);
        assert!(pairs.contains(&("sort_by".to_string(), "posted_at".to_string())));
        assert!(pairs.contains(&("sort_order".to_string(), "desc".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "20".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "q" || k == "cursor"));
    }

    #[test]
    fn filters_and_cursor_are_encoded() {
        let query = FeedQuery {
            q: Some("rust".into()),
            job_type: Some(JobType::FullTime),
            ..FeedQuery::default()
        };
        let pairs = query.to_pairs(Some("abc"));
        assert!(pairs.contains(&("q".to_string(), "rust".to_string())));
        assert!(pairs.contains(&("job_type".to_string(), "full-time".to_string())));
        assert!(pairs.contains(&("cursor".to_string(), "abc".to_string())));
    }
}
