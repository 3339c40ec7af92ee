use super::UserId;

// User

#[derive(Debug, PartialEq, Eq, Hash, serde::Deserialize, Clone)]
pub struct User {
    pub login: String,
    pub id: UserId,
}

// Repository

#[derive(Debug, serde::Deserialize)]
pub struct Repository {
    /// `owner/name` as reported by the webhook payload.
    pub full_name: String,
    pub default_branch: String,
}

impl Repository {
    pub fn owner(&self) -> &str {
        self.full_name.split_once('/').map(|(owner, _)| owner).unwrap_or(&self.full_name)
    }

    pub fn name(&self) -> &str {
        self.full_name.split_once('/').map(|(_, name)| name).unwrap_or(&self.full_name)
    }
}
