use std::{fmt, sync::Arc};

use anyhow::Context as _;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use hyper::HeaderMap;
use tracing as log;
use tracing::debug;

use crate::handlers::HandlerError;

use super::{Issue, Label, PullRequestDetails, Repository, User};

/// The name of a webhook event.
#[derive(Debug)]
pub enum EventName {
    /// Pull request activity.
    ///
    /// <https://docs.github.com/en/developers/webhooks-and-events/webhooks/webhook-events-and-payloads#pull_request>
    PullRequest,
    /// All other unhandled webhooks.
    Other,
}

impl std::str::FromStr for EventName {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<EventName, Self::Err> {
        Ok(match s {
            "pull_request" => EventName::PullRequest,
            _ => EventName::Other,
        })
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EventName::PullRequest => "pull_request",
                EventName::Other => "other",
            }
        )
    }
}

/// An event triggered by a webhook.
#[derive(Debug)]
pub enum Event {
    /// Activity on an issue or PR.
    Issue(IssuesEvent),
}

impl Event {
    pub fn repo(&self) -> &Repository {
        match self {
            Event::Issue(event) => &event.repository,
        }
    }

    pub fn issue(&self) -> Option<&Issue> {
        match self {
            Event::Issue(event) => Some(&event.issue),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct IssuesEvent {
    #[serde(flatten)]
    pub action: IssuesAction,
    #[serde(alias = "pull_request")]
    pub issue: Issue,
    pub repository: Repository,
}

#[derive(PartialEq, Eq, Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum IssuesAction {
    Opened,
    Edited,
    Deleted,
    Closed,
    Reopened,
    Assigned {
        /// Github user assigned to the issue / pull request
        assignee: User,
    },
    Unassigned {
        /// Github user removed from the issue / pull request
        assignee: User,
    },
    Labeled {
        /// The label added to the issue
        label: Label,
    },
    Unlabeled {
        /// The label removed from the issue
        ///
        /// The `label` is `None` when a label is deleted from the repository.
        label: Option<Label>,
    },
    Locked,
    Unlocked,
    Milestoned,
    Demilestoned,
    ReviewRequested {
        /// The person requested to review the pull request
        ///
        /// This can be `None` when a review is requested for a team.
        requested_reviewer: Option<User>,
    },
    ReviewRequestRemoved,
    ReadyForReview,
    Synchronize,
    ConvertedToDraft,
    AutoMergeEnabled,
    AutoMergeDisabled,
    Enqueued,
    Dequeued,
}

pub fn deserialize_payload<T: serde::de::DeserializeOwned>(v: &str) -> anyhow::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(v);
    let res: Result<T, _> = serde_path_to_error::deserialize(&mut deserializer);
    match res {
        Ok(r) => Ok(r),
        Err(e) => {
            let ctx = format!("at {:?}", e.path());
            Err(e.into_inner()).context(ctx)
        }
    }
}

pub async fn webhook(
    headers: HeaderMap,
    State(ctx): State<Arc<crate::handlers::Context>>,
    body: Bytes,
) -> axum::response::Response {
    // Extract X-GitHub-Event header
    let Some(ev) = headers.get("X-GitHub-Event") else {
        tracing::error!("X-GitHub-Event header must be set");
        return (StatusCode::BAD_REQUEST, "X-GitHub-Event header must be set").into_response();
    };
    let Ok(ev) = ev.to_str() else {
        tracing::error!("X-GitHub-Event header must be UTF-8 encoded");
        return (
            StatusCode::BAD_REQUEST,
            "X-GitHub-Event header must be UTF-8 encoded",
        )
            .into_response();
    };
    let Ok(event) = ev.parse::<EventName>();

    debug!("event={event}");

    let Ok(payload) = std::str::from_utf8(&body) else {
        tracing::error!("payload not utf-8");
        return (StatusCode::BAD_REQUEST, "Payload must be UTF-8").into_response();
    };

    match process_payload(event, payload, &ctx).await {
        Ok(true) => ("processed request",).into_response(),
        Ok(false) => ("ignored request",).into_response(),
        Err(err) => {
            tracing::error!("{err:?}");
            let body = format!("request failed: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

async fn process_payload(
    event: EventName,
    payload: &str,
    ctx: &crate::handlers::Context,
) -> anyhow::Result<bool> {
    let event = match event {
        EventName::PullRequest => {
            let mut payload = deserialize_payload::<IssuesEvent>(payload)
                .context("failed to deserialize IssuesEvent")?;

            payload.issue.pull_request = Some(PullRequestDetails::new());

            log::info!("handling pull request event {payload:?}");

            Event::Issue(payload)
        }
        // Other events need not be handled
        EventName::Other => {
            return Ok(false);
        }
    };
    let errors = crate::handlers::handle(ctx, &event).await;
    let mut other_error = false;
    let mut message = String::new();
    for err in errors {
        match err {
            HandlerError::Message(msg) => {
                if !message.is_empty() {
                    message.push_str("\n\n");
                }
                message.push_str(&msg);
            }
            HandlerError::Other(err) => {
                log::error!("handling event failed: {err:?}");
                other_error = true;
            }
        }
    }
    if !message.is_empty() {
        anyhow::bail!(message);
    }
    if other_error {
        Err(anyhow::anyhow!("handling failed, error logged"))
    } else {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened_pr_payload() -> serde_json::Value {
        serde_json::json!({
            "action": "opened",
            "number": 1347,
            "pull_request": {
                "number": 1347,
                "title": "Example PR",
                "html_url": "https://github.com/octocat/Hello-World/pull/1347",
                "user": { "login": "octocat", "id": 583231 },
                "assignees": [],
                "comments_url": "https://api.github.com/repos/octocat/Hello-World/issues/1347/comments",
                "state": "open",
            },
            "repository": {
                "full_name": "octocat/Hello-World",
                "default_branch": "main",
            },
        })
    }

    #[test]
    fn pull_request_opened_deserializes() {
        let payload = opened_pr_payload().to_string();
        let event = deserialize_payload::<IssuesEvent>(&payload).unwrap();
        assert!(matches!(event.action, IssuesAction::Opened));
        assert_eq!(event.issue.number, 1347);
        assert_eq!(event.issue.title, "Example PR");
        assert_eq!(event.issue.user.login, "octocat");
        assert_eq!(event.repository.full_name, "octocat/Hello-World");
    }

    #[test]
    fn event_name_round_trip() {
        let name: EventName = "pull_request".parse().unwrap();
        assert!(matches!(name, EventName::PullRequest));
        assert_eq!(name.to_string(), "pull_request");
        let other: EventName = "workflow_run".parse().unwrap();
        assert!(matches!(other, EventName::Other));
    }
}
