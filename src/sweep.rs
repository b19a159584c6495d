use crate::error::TransportError;
use crate::gitlab::issues::GitLabIssue;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use std::fmt;
use tracing::{debug, info, warn};

/// Where closed issues and their branches come from.
#[allow(async_fn_in_trait)]
pub trait IssueSource {
    /// One page of closed issues. An empty page ends the sweep.
    async fn closed_issues(&self, page: u32) -> Result<Vec<GitLabIssue>, TransportError>;

    /// The first branch named `<iid>-...`, if any.
    async fn find_branch(&self, iid: u64) -> Result<Option<String>, TransportError>;

    async fn delete_branch(&self, name: &str) -> Result<StatusCode, TransportError>;
}

/// Receives one message per deleted branch.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()>;
}

/// Text announced after a branch was deleted.
pub fn deletion_message(iid: u64, title: &str, branch: &str) -> String {
    format!(
        "CLI tool: :computer: Issue with ID {iid} \"{title}\" was closed and branch \"{branch}\" deleted"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    NoBranch,
    WouldDelete,
    DeleteFailed,
    Deleted { notified: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Page requests made, including the final empty one.
    pub pages: u32,
    pub issues: usize,
    pub deleted: usize,
    pub delete_failures: usize,
    pub notified: usize,
    pub would_delete: usize,
}

impl Summary {
    fn record(&mut self, outcome: IssueOutcome) {
        self.issues += 1;
        match outcome {
            IssueOutcome::NoBranch => {}
            IssueOutcome::WouldDelete => self.would_delete += 1,
            IssueOutcome::DeleteFailed => self.delete_failures += 1,
            IssueOutcome::Deleted { notified } => {
                self.deleted += 1;
                if notified {
                    self.notified += 1;
                }
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Swept {} page(s), {} issue(s): {} branch(es) deleted, {} delete failure(s), {} notification(s) sent",
            self.pages, self.issues, self.deleted, self.delete_failures, self.notified
        )?;
        if self.would_delete > 0 {
            write!(f, ", {} branch(es) left in place (dry run)", self.would_delete)?;
        }
        Ok(())
    }
}

/// Walks every page of closed issues and removes the branches left behind.
///
/// Issues of one page run through a `buffer_unordered` stream limited to
/// `workers`; the next page is only requested once the whole page is done.
/// With one worker that is strictly the page order.
pub struct Sweeper<'a, S, N> {
    source: &'a S,
    notifier: &'a N,
    workers: usize,
    dry_run: bool,
}

impl<'a, S, N> Sweeper<'a, S, N>
where
    S: IssueSource,
    N: Notifier,
{
    pub fn new(source: &'a S, notifier: &'a N) -> Self {
        Sweeper {
            source,
            notifier,
            workers: 1,
            dry_run: false,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs until a page comes back empty.
    ///
    /// Only transport failures stop the sweep early; every other failure is
    /// logged and the next issue is processed.
    pub async fn run(&self) -> Result<Summary, TransportError> {
        let mut summary = Summary::default();
        let mut page = 1;

        loop {
            let issues = self.source.closed_issues(page).await?;
            summary.pages += 1;
            info!(page, count = issues.len(), "fetched closed issues");

            if issues.is_empty() {
                info!("no more closed issues");
                break;
            }

            let outcomes: Vec<IssueOutcome> = stream::iter(&issues)
                .map(|issue| self.process_issue(issue))
                .buffer_unordered(self.workers)
                .try_collect()
                .await?;
            for outcome in outcomes {
                summary.record(outcome);
            }

            page += 1;
        }

        Ok(summary)
    }

    pub async fn process_issue(&self, issue: &GitLabIssue) -> Result<IssueOutcome, TransportError> {
        let Some(branch) = self.source.find_branch(issue.iid).await? else {
            debug!(iid = issue.iid, "no branch for issue");
            return Ok(IssueOutcome::NoBranch);
        };
        info!(iid = issue.iid, branch = %branch, "branch for closed issue still exists");

        if self.dry_run {
            info!(branch = %branch, "dry run, not deleting");
            return Ok(IssueOutcome::WouldDelete);
        }

        info!(branch = %branch, "deleting branch");
        let status = self.source.delete_branch(&branch).await?;
        info!(branch = %branch, status = status.as_u16(), "delete branch returned");
        if status.as_u16() >= 300 {
            warn!(branch = %branch, status = status.as_u16(), "branch was not deleted");
            return Ok(IssueOutcome::DeleteFailed);
        }

        let text = deletion_message(issue.iid, &issue.title, &branch);
        let notified = match self.notifier.notify(&text).await {
            Ok(()) => true,
            Err(err) => {
                let err = format!("{err:#}");
                warn!(iid = issue.iid, error = %err, "sending message to Rocket.Chat failed");
                false
            }
        };

        Ok(IssueOutcome::Deleted { notified })
    }
}
