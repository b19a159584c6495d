use crate::error::TransportError;
use crate::gitlab::branches;
use crate::gitlab::issues::{self, GitLabIssue};
use crate::sweep::IssueSource;
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

/// Status line and body of a finished GitLab request.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// GitLab REST v4 client bound to one project.
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    project: u64,
}

impl GitLabClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: &str, project: u64) -> Self {
        GitLabClient {
            http,
            base_url: base_url.to_string(),
            token: token.to_string(),
            project,
        }
    }

    /// Sends one authenticated request and returns whatever came back.
    ///
    /// Error statuses are logged and returned like any other; only failing to
    /// get a response at all is an error.
    pub async fn send(
        &self,
        method: Method,
        url: reqwest::Url,
    ) -> Result<RawResponse, TransportError> {
        let url_text = url.to_string();
        debug!(%method, url = %url_text, "gitlab request");

        let response = self
            .http
            .request(method.clone(), url)
            .header("Private-Token", &self.token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|source| TransportError::Request {
                method,
                url: url_text.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url_text, "status code error: {status}");
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Body {
                url: url_text,
                source,
            })?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl IssueSource for GitLabClient {
    async fn closed_issues(&self, page: u32) -> Result<Vec<GitLabIssue>, TransportError> {
        let url = parse_url(issues::closed_issues_url(
            &self.base_url,
            self.project,
            page,
        ))?;
        let response = self.send(Method::GET, url).await?;
        debug!(status = response.status.as_u16(), page, "get issues");

        Ok(issues::parse_issues(&response.body).unwrap_or_else(|err| {
            warn!(page, error = %err, "issue listing is not a JSON array, treating as empty");
            Vec::new()
        }))
    }

    async fn find_branch(&self, iid: u64) -> Result<Option<String>, TransportError> {
        let url = parse_url(branches::branch_search_url(
            &self.base_url,
            self.project,
            iid,
        ))?;
        let response = self.send(Method::GET, url).await?;
        if response.status.as_u16() >= 300 {
            warn!(iid, status = response.status.as_u16(), "branch search failed");
        }

        let found = branches::parse_branches(&response.body).unwrap_or_else(|err| {
            debug!(iid, error = %err, "branch search body is not a JSON array");
            Vec::new()
        });
        Ok(branches::first_branch_name(found))
    }

    async fn delete_branch(&self, name: &str) -> Result<StatusCode, TransportError> {
        let url = branches::delete_branch_url(&self.base_url, self.project, name)?;
        let response = self.send(Method::DELETE, url).await?;
        Ok(response.status)
    }
}

fn parse_url(raw: String) -> Result<reqwest::Url, TransportError> {
    reqwest::Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
        reason: e.to_string(),
        url: raw,
    })
}
