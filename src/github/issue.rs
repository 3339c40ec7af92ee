use std::fmt;
use std::sync::OnceLock;

use anyhow::Context;
use tracing as log;

use super::{GithubClient, User};

/// An issue or pull request.
///
/// For convenience, since issues and pull requests share most of their
/// fields, this struct is used for both. The `pull_request` field can be used
/// to determine which it is.
#[derive(Debug, serde::Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    /// The common URL for viewing this issue or PR.
    ///
    /// Example: `https://github.com/octocat/Hello-World/pull/1347`
    pub html_url: String,
    // User performing an `action` (or PR/issue author)
    pub user: User,
    // Users assigned to the issue/pr after `action` has been performed
    #[serde(default)]
    pub assignees: Vec<User>,
    /// Indicator if this is a pull request.
    ///
    /// This is `Some` if this is a PR (as opposed to an issue). Note that
    /// this does not always get filled in by GitHub, and must be manually
    /// populated (because some webhook events do not set it).
    pub pull_request: Option<PullRequestDetails>,
    /// The API URL for discussion comments.
    ///
    /// Example: `https://api.github.com/repos/octocat/Hello-World/issues/1347/comments`
    pub comments_url: String,
    /// The repository for this issue.
    ///
    /// Note that this is constructed via the [`Issue::repository`] method.
    /// It is not deserialized from the GitHub API.
    #[serde(skip)]
    pub repository: OnceLock<IssueRepository>,
    /// Whether it is open or closed.
    pub state: IssueState,
}

#[derive(PartialEq, Eq, Debug, Clone, Ord, PartialOrd, serde::Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, serde::Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

/// An indicator used to differentiate between an issue and a pull request.
///
/// Some webhook events include a `pull_request` field in the Issue object,
/// and some don't.
#[derive(Debug, serde::Deserialize)]
#[cfg_attr(test, derive(Default))]
pub struct PullRequestDetails {}

impl PullRequestDetails {
    pub fn new() -> PullRequestDetails {
        PullRequestDetails {}
    }
}

impl Issue {
    pub fn repository(&self) -> &IssueRepository {
        self.repository.get_or_init(|| {
            // https://api.github.com/repos/octocat/Hello-World/issues/1347/comments
            log::trace!("get repository for {}", self.comments_url);
            let url = url::Url::parse(&self.comments_url).unwrap();
            let mut segments = url.path_segments().unwrap();
            let _comments = segments.next_back().unwrap();
            let _number = segments.next_back().unwrap();
            let _issues_or_prs = segments.next_back().unwrap();
            let repository = segments.next_back().unwrap();
            let organization = segments.next_back().unwrap();
            IssueRepository {
                organization: organization.into(),
                repository: repository.into(),
            }
        })
    }

    pub fn global_id(&self) -> String {
        format!("{}#{}", self.repository(), self.number)
    }

    pub fn is_pr(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    pub fn contain_assignee(&self, user: &str) -> bool {
        self.assignees
            .iter()
            .any(|a| a.login.to_lowercase() == user.to_lowercase())
    }

    /// Adds the given users as assignees.
    ///
    /// The call is made even for an empty set; GitHub treats that as a no-op
    /// but the attempt is still observable in the request log.
    pub async fn add_assignees(
        &self,
        client: &GithubClient,
        assignees: &[&str],
    ) -> Result<(), AssignmentError> {
        log::info!("add_assignees {:?} for {}", assignees, self.global_id());
        let url = format!(
            "{repo_url}/issues/{number}/assignees",
            repo_url = self.repository().url(client),
            number = self.number
        );

        #[derive(serde::Serialize)]
        struct AssigneeReq<'a> {
            assignees: &'a [&'a str],
        }

        let result: Issue = client
            .json(client.post(&url).json(&AssigneeReq { assignees }))
            .await
            .map_err(AssignmentError::Other)?;

        // Invalid assignees are silently ignored. Check that every requested
        // user is now contained in the assignees list.
        let all_landed = assignees.iter().all(|user| result.contain_assignee(user));

        if all_landed {
            Ok(())
        } else {
            Err(AssignmentError::InvalidAssignee)
        }
    }

    /// Requests a review from the given users.
    pub async fn request_review(
        &self,
        client: &GithubClient,
        reviewers: &[&str],
    ) -> anyhow::Result<()> {
        log::info!("request_review from {:?} for {}", reviewers, self.global_id());
        let url = format!(
            "{repo_url}/pulls/{number}/requested_reviewers",
            repo_url = self.repository().url(client),
            number = self.number
        );

        #[derive(serde::Serialize)]
        struct ReviewReq<'a> {
            reviewers: &'a [&'a str],
        }

        client
            .send_req(client.post(&url).json(&ReviewReq { reviewers }))
            .await
            .with_context(|| format!("failed to request review on {}", self.global_id()))?;
        Ok(())
    }
}

/// The owner/name pair identifying the repository an issue belongs to,
/// derived from its API URLs.
#[derive(Debug, PartialEq, Eq)]
pub struct IssueRepository {
    pub organization: String,
    pub repository: String,
}

impl fmt::Display for IssueRepository {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

impl IssueRepository {
    pub(crate) fn url(&self, client: &GithubClient) -> String {
        format!(
            "{}/repos/{}/{}",
            client.api_url(),
            self.organization,
            self.repository
        )
    }
}

#[derive(Debug)]
pub enum AssignmentError {
    InvalidAssignee,
    Other(anyhow::Error),
}

impl fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssignmentError::InvalidAssignee => write!(f, "invalid assignee"),
            AssignmentError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AssignmentError {}
