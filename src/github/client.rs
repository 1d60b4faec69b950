use crate::client::{ApiClient, Result};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn is_starred(&self, owner: &str, repo: &str) -> Result<bool>;
    async fn star(&self, owner: &str, repo: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct DefaultGithubClient {
    client: ApiClient,
    api_base: String,
}

impl DefaultGithubClient {
    pub const API_BASE: &'static str = "https://api.github.com";

    pub fn new<B: Into<String>, T: Into<String>>(api_base: B, token: T) -> Result<Self> {
        Ok(Self {
            client: ApiClient::from_token(token)?,
            api_base: api_base.into(),
        })
    }

    fn make_starred_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/user/starred/{}/{}",
            self.api_base.trim_end_matches('/'),
            owner,
            repo
        )
    }
}

#[async_trait]
impl GithubClient for DefaultGithubClient {
    async fn is_starred(&self, owner: &str, repo: &str) -> Result<bool> {
        let url = self.make_starred_url(owner, repo);
        // 204 when starred, 404 when not
        match self.client.get_empty(&url).await {
            Ok(()) => Ok(true),
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn star(&self, owner: &str, repo: &str) -> Result<()> {
        let url = self.make_starred_url(owner, repo);
        self.client.put_empty(&url).await
    }
}
