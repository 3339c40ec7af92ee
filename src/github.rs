pub(crate) mod client;
pub(crate) mod issue;
pub(crate) mod repos;
mod webhook;

pub use client::{GithubClient, default_token_from_env};
pub use issue::*;
pub use repos::*;
pub use webhook::*;

pub type UserId = u64;
