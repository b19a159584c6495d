use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Page size used for every closed-issue listing.
pub const PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitLabIssue {
    pub id: u64,
    pub iid: u64,
    #[serde(default)]
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// `GET` URL for one page of closed issues, most recently updated first.
pub fn closed_issues_url(base: &str, project: u64, page: u32) -> String {
    format!(
        "{base}/api/v4/projects/{project}/issues?state=closed&page={page}&per_page={PER_PAGE}&order_by=updated_at&sort=desc"
    )
}

/// Decodes an issue listing body.
///
/// Callers treat a decode failure like an empty page, which ends pagination.
pub fn parse_issues(body: &[u8]) -> Result<Vec<GitLabIssue>, serde_json::Error> {
    serde_json::from_slice(body)
}
