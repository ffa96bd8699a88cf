use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("group {0} not found")]
    GroupNotFound(String),

    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory responded with status {0}")]
    UnexpectedStatus(u16),

    #[error("invalid directory url: {0}")]
    InvalidUrl(String),
}

/// User and group lookups served by the user-admin service.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn user_exists(&self, user_id: &str) -> Result<bool, DirectoryError>;

    /// Member user ids of `group_id`, or `GroupNotFound`.
    async fn group_members(&self, group_id: &str) -> Result<Vec<String>, DirectoryError>;
}

#[derive(Debug, Deserialize)]
struct GroupPayload {
    #[serde(default)]
    usernames: Vec<String>,
}

#[derive(Clone)]
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `{base}/{collection}/{id}` with `id` encoded as exactly one path segment.
    fn endpoint(&self, collection: &str, id: &str) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DirectoryError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(collection)
            .push(id);

        Ok(url)
    }
}

/// Ids that cannot name a single path segment never resolve.
fn is_resolvable(id: &str) -> bool {
    !matches!(id, "" | "." | "..")
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn user_exists(&self, user_id: &str) -> Result<bool, DirectoryError> {
        if !is_resolvable(user_id) {
            return Ok(false);
        }

        let url = self.endpoint("users", user_id)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                tracing::warn!("user lookup for {} returned {}", user_id, status);
                Err(DirectoryError::UnexpectedStatus(status.as_u16()))
            }
        }
    }

    async fn group_members(&self, group_id: &str) -> Result<Vec<String>, DirectoryError> {
        if !is_resolvable(group_id) {
            return Err(DirectoryError::GroupNotFound(group_id.to_string()));
        }

        let url = self.endpoint("groups", group_id)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let group: GroupPayload = response.json().await?;
                Ok(group.usernames)
            }
            StatusCode::NOT_FOUND => Err(DirectoryError::GroupNotFound(group_id.to_string())),
            status => {
                tracing::warn!("group lookup for {} returned {}", group_id, status);
                Err(DirectoryError::UnexpectedStatus(status.as_u16()))
            }
        }
    }
}
