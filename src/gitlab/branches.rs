use crate::error::TransportError;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_ids: Option<Vec<String>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub authored_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub committer_name: String,
    #[serde(default)]
    pub committer_email: String,
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitLabBranch {
    pub name: String,
    #[serde(default)]
    pub commit: Commit,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub developers_can_push: bool,
    #[serde(default)]
    pub developers_can_merge: bool,
    #[serde(default)]
    pub can_push: bool,
    #[serde(default)]
    pub default: bool,
}

/// `GET` URL searching branches whose name starts with `<iid>-`.
pub fn branch_search_url(base: &str, project: u64, iid: u64) -> String {
    format!("{base}/api/v4/projects/{project}/repository/branches?search=^{iid}-")
}

/// `DELETE` URL for a branch, with the name encoded as one path segment.
pub fn delete_branch_url(
    base: &str,
    project: u64,
    name: &str,
) -> Result<reqwest::Url, TransportError> {
    let raw = format!("{base}/api/v4/projects/{project}/repository/branches");
    let mut url = reqwest::Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl {
            url: raw.clone(),
            reason: "URL cannot carry a path".to_string(),
        })?
        .push(name);
    Ok(url)
}

pub fn parse_branches(body: &[u8]) -> Result<Vec<GitLabBranch>, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Name of the first branch, in the order the server returned them.
pub fn first_branch_name(branches: Vec<GitLabBranch>) -> Option<String> {
    branches.into_iter().next().map(|branch| branch.name)
}
