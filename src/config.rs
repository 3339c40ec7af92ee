use crate::github::{GithubClient, Repository};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};
use std::time::{Duration, Instant};
use tracing as log;

static CONFIG_FILE_NAME: &str = "assignbot.toml";
const REFRESH_EVERY: Duration = Duration::from_secs(2 * 60); // Every two minutes

static CONFIG_CACHE: LazyLock<
    RwLock<HashMap<String, (Result<Arc<AssignmentConfig>, ConfigurationError>, Instant)>>,
> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Per-repository assignment configuration, read from `assignbot.toml` in
/// the root of the default branch.
#[derive(PartialEq, Eq, Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssignmentConfig {
    /// Whether to request reviews on new pull requests.
    #[serde(default)]
    pub add_reviewers: bool,
    /// Whether to add assignees, and from where (`true`, `false`, or
    /// `"author"` to self-assign the PR author).
    #[serde(default)]
    pub add_assignees: AssigneePolicy,
    /// Candidate logins for review requests.
    #[serde(default)]
    pub reviewers: Vec<String>,
    /// Candidate logins for assignment. Falls back to `reviewers` when
    /// absent or empty.
    #[serde(default)]
    pub assignees: Vec<String>,
    /// How many reviewers to pick. 0 means the whole eligible pool.
    #[serde(default)]
    pub number_of_reviewers: usize,
    /// How many assignees to pick. Falls back to `number-of-reviewers`.
    pub number_of_assignees: Option<usize>,
    /// Case-insensitive substrings that suppress assignment when present in
    /// the PR title.
    #[serde(default)]
    pub skip_keywords: Vec<String>,
}

impl AssignmentConfig {
    /// The candidate pool for assignees.
    pub fn assignee_pool(&self) -> &[String] {
        if self.assignees.is_empty() {
            &self.reviewers
        } else {
            &self.assignees
        }
    }

    /// How many assignees to pick. 0 means the whole eligible pool.
    pub fn assignee_count(&self) -> usize {
        self.number_of_assignees
            .unwrap_or(self.number_of_reviewers)
    }
}

/// The `add-assignees` key: a plain toggle, or `"author"` to assign the pull
/// request to its own author.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum AssigneePolicy {
    #[default]
    Off,
    Pool,
    Author,
}

impl<'de> serde::Deserialize<'de> for AssigneePolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Toggle(bool),
            Keyword(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Toggle(false) => Ok(AssigneePolicy::Off),
            Raw::Toggle(true) => Ok(AssigneePolicy::Pool),
            Raw::Keyword(s) if s == "author" => Ok(AssigneePolicy::Author),
            Raw::Keyword(s) => Err(serde::de::Error::custom(format!(
                "unknown `add-assignees` value `{s}`, expected a boolean or \"author\""
            ))),
        }
    }
}

pub async fn get(
    gh: &GithubClient,
    repo: &Repository,
) -> Result<Arc<AssignmentConfig>, ConfigurationError> {
    if let Some(config) = get_cached_config(&repo.full_name) {
        log::trace!("returning config for {} from cache", repo.full_name);
        config
    } else {
        log::trace!("fetching fresh config for {}", repo.full_name);
        let res = get_fresh_config(gh, repo).await;
        CONFIG_CACHE
            .write()
            .unwrap()
            .insert(repo.full_name.clone(), (res.clone(), Instant::now()));
        res
    }
}

fn get_cached_config(repo: &str) -> Option<Result<Arc<AssignmentConfig>, ConfigurationError>> {
    let cache = CONFIG_CACHE.read().unwrap();
    cache.get(repo).and_then(|(config, fetch_time)| {
        if fetch_time.elapsed() < REFRESH_EVERY {
            Some(config.clone())
        } else {
            None
        }
    })
}

async fn get_fresh_config(
    gh: &GithubClient,
    repo: &Repository,
) -> Result<Arc<AssignmentConfig>, ConfigurationError> {
    let contents = gh
        .raw_file(&repo.full_name, &repo.default_branch, CONFIG_FILE_NAME)
        .await
        .map_err(|e| ConfigurationError::Http(Arc::new(e)))?
        .ok_or(ConfigurationError::Missing)?;
    let contents = String::from_utf8_lossy(&contents);
    let config =
        Arc::new(toml::from_str::<AssignmentConfig>(&contents).map_err(ConfigurationError::Toml)?);
    log::debug!("fresh configuration for {}: {:?}", repo.full_name, config);
    Ok(config)
}

#[derive(Clone, Debug)]
pub enum ConfigurationError {
    Missing,
    Toml(toml::de::Error),
    Http(Arc<anyhow::Error>),
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigurationError::Missing => write!(
                f,
                "the configuration file failed to load\n\
                 Add an `assignbot.toml` in the root of the default branch to enable it."
            ),
            ConfigurationError::Toml(e) => {
                write!(f, "Malformed `assignbot.toml` in default branch.\n{e}")
            }
            ConfigurationError::Http(_) => {
                write!(f, "Failed to query configuration for this repository.")
            }
        }
    }
}
