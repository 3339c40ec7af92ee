use crate::config::{self, AssignmentConfig, ConfigurationError};
use crate::github::{Event, GithubClient, IssuesAction, IssuesEvent};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum HandlerError {
    Message(String),
    Other(anyhow::Error),
}

impl std::error::Error for HandlerError {}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandlerError::Message(msg) => write!(f, "{}", msg),
            HandlerError::Other(_) => write!(f, "An internal error occurred."),
        }
    }
}

mod auto_assign;

pub async fn handle(ctx: &Context, event: &Event) -> Vec<HandlerError> {
    let mut errors = Vec::new();

    let Event::Issue(event) = event;

    // Assignment only reacts to newly opened pull requests; don't resolve
    // configuration (and surface its errors) for anything else.
    if !matches!(event.action, IssuesAction::Opened) || !event.issue.is_pr() {
        return errors;
    }

    let config = config::get(&ctx.github, &event.repository).await;
    handle_issue(ctx, event, &config, &mut errors).await;

    errors
}

async fn handle_issue(
    ctx: &Context,
    event: &IssuesEvent,
    config: &Result<Arc<AssignmentConfig>, ConfigurationError>,
    errors: &mut Vec<HandlerError>,
) {
    let config = match config {
        Ok(config) => config,
        Err(e @ ConfigurationError::Missing) => {
            return errors.push(HandlerError::Message(e.to_string()));
        }
        Err(e @ ConfigurationError::Toml(_)) => {
            return errors.push(HandlerError::Message(e.to_string()));
        }
        Err(e @ ConfigurationError::Http(_)) => {
            return errors.push(HandlerError::Other(e.clone().into()));
        }
    };

    match auto_assign::parse_input(ctx, event, config) {
        Err(err) => errors.push(HandlerError::Message(err)),
        Ok(Some(input)) => {
            auto_assign::handle_input(ctx, config, event, input)
                .await
                .unwrap_or_else(|err| errors.push(HandlerError::Other(err)));
        }
        Ok(None) => {}
    }
}

pub struct Context {
    pub github: GithubClient,
}
