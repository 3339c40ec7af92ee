//! Handles reviewer and assignee auto-assignment on newly opened PRs.
//!
//! When a pull request is opened, this picks a random subset of the
//! configured reviewer pool and requests reviews from it, and likewise picks
//! assignees from the assignee pool (falling back to the reviewer pool when
//! no separate one is configured). The PR author is never selected, except
//! when `add-assignees = "author"` forces a self-assignment.
//!
//! Configuration lives in `assignbot.toml` in the target repository; titles
//! containing a configured skip keyword suppress assignment entirely.

use crate::config::{AssigneePolicy, AssignmentConfig};
use crate::github::{GithubClient, Issue, IssuesAction, IssuesEvent};
use crate::handlers::Context;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing as log;


/// Input for auto-assignment when a PR is created.
pub(super) struct AutoAssignInput {
    author: String,
}

/// Prepares the input when a new PR is opened.
///
/// The skip-keyword check happens here, before any selection work, so a
/// skipped PR costs no API calls.
pub(super) fn parse_input(
    _ctx: &Context,
    event: &IssuesEvent,
    config: &AssignmentConfig,
) -> Result<Option<AutoAssignInput>, String> {
    if !matches!(event.action, IssuesAction::Opened) || !event.issue.is_pr() {
        return Ok(None);
    }

    if let Some(keyword) = find_skip_keyword(&event.issue.title, &config.skip_keywords) {
        log::info!(
            "skipping {}: title contains skip keyword {keyword:?}",
            event.issue.global_id()
        );
        return Ok(None);
    }

    Ok(Some(AutoAssignInput {
        author: event.issue.user.login.clone(),
    }))
}

/// Handles the work of selecting and applying reviewers and assignees for a
/// new PR.
pub(super) async fn handle_input(
    ctx: &Context,
    config: &AssignmentConfig,
    event: &IssuesEvent,
    input: AutoAssignInput,
) -> anyhow::Result<()> {
    let selections = select_assignments(config, &input.author, &mut rand::thread_rng());
    let issuer = GithubIssuer {
        client: &ctx.github,
        issue: &event.issue,
    };
    apply_assignments(&issuer, &event.issue.global_id(), &selections).await;
    Ok(())
}

/// Finds the first configured skip keyword contained in the title,
/// case-insensitively.
fn find_skip_keyword<'a>(title: &str, keywords: &'a [String]) -> Option<&'a str> {
    let title = title.to_lowercase();
    keywords
        .iter()
        .map(String::as_str)
        .find(|keyword| title.contains(&keyword.to_lowercase()))
}

/// Selected review and assignee sets for one pull request.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Selections {
    pub(super) reviewers: Vec<String>,
    pub(super) assignees: Vec<String>,
}

/// Computes both selections from the configuration.
///
/// Disabled sides select nothing, but the corresponding mutation is still
/// attempted with the empty set by [`apply_assignments`].
pub(super) fn select_assignments<R: Rng + ?Sized>(
    config: &AssignmentConfig,
    author: &str,
    rng: &mut R,
) -> Selections {
    let reviewers = if config.add_reviewers {
        choose_users(rng, &config.reviewers, config.number_of_reviewers, author)
    } else {
        Vec::new()
    };

    let assignees = match config.add_assignees {
        AssigneePolicy::Off => Vec::new(),
        // Forced self-assignment bypasses the selector.
        AssigneePolicy::Author => vec![author.to_string()],
        AssigneePolicy::Pool => choose_users(
            rng,
            config.assignee_pool(),
            config.assignee_count(),
            author,
        ),
    };

    Selections {
        reviewers,
        assignees,
    }
}

/// Picks `count` distinct users from `pool`, never picking `exclude`.
///
/// A `count` of zero, or one at least as large as the eligible pool, selects
/// everyone eligible. Sampling is uniform without replacement; the returned
/// order carries no meaning.
pub(super) fn choose_users<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[String],
    count: usize,
    exclude: &str,
) -> Vec<String> {
    // Deduplicate so a login listed twice isn't over-weighted.
    let mut seen = std::collections::HashSet::new();
    let eligible: Vec<&String> = pool
        .iter()
        .filter(|login| login.as_str() != exclude && seen.insert(login.as_str()))
        .collect();
    let chosen = if count == 0 || count >= eligible.len() {
        eligible
    } else {
        eligible.choose_multiple(rng, count).copied().collect()
    };
    chosen.into_iter().cloned().collect()
}

/// The two mutations issued against the hosting API.
///
/// A seam so the orchestration can be exercised without HTTP; the production
/// implementation forwards to [`GithubClient`].
#[async_trait]
pub(super) trait AssignmentIssuer {
    async fn add_assignees(&self, assignees: &[String]) -> anyhow::Result<()>;
    async fn request_review(&self, reviewers: &[String]) -> anyhow::Result<()>;
}

struct GithubIssuer<'a> {
    client: &'a GithubClient,
    issue: &'a Issue,
}

#[async_trait]
impl AssignmentIssuer for GithubIssuer<'_> {
    async fn add_assignees(&self, assignees: &[String]) -> anyhow::Result<()> {
        let assignees: Vec<&str> = assignees.iter().map(String::as_str).collect();
        self.issue
            .add_assignees(self.client, &assignees)
            .await
            .map_err(anyhow::Error::from)
    }

    async fn request_review(&self, reviewers: &[String]) -> anyhow::Result<()> {
        let reviewers: Vec<&str> = reviewers.iter().map(String::as_str).collect();
        self.issue.request_review(self.client, &reviewers).await
    }
}

/// Issues both mutations, assignees first.
///
/// The two attempts are independent: a failure of one is logged and does not
/// prevent or fail the other, and neither failure propagates to the caller.
pub(super) async fn apply_assignments<I: AssignmentIssuer>(
    issuer: &I,
    global_id: &str,
    selections: &Selections,
) {
    if let Err(e) = issuer.add_assignees(&selections.assignees).await {
        log::warn!(
            "failed to add assignees {:?} to {global_id}: {e:?}",
            selections.assignees
        );
    }

    if let Err(e) = issuer.request_review(&selections.reviewers).await {
        log::warn!(
            "failed to request reviews from {:?} on {global_id}: {e:?}",
            selections.reviewers
        );
    }
}
