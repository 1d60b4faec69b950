use super::GithubClient;
use crate::client;
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarError {
    #[error("Error checking if repo is starred")]
    CheckStatus(#[source] client::Error),

    #[error("Error starring repository")]
    Star(#[source] client::Error),
}

/// Stars repositories on behalf of the authenticated user, leaving already starred ones alone.
pub struct RepositoryStarrer<G: ?Sized> {
    github: Arc<G>,
}

impl<G> RepositoryStarrer<G>
where
    G: GithubClient + ?Sized,
{
    pub fn new(github: Arc<G>) -> Self {
        Self { github }
    }

    /// Returns `true` if the repository was starred by this call, `false` if it already was.
    pub async fn star_repository(&self, owner: &str, repo: &str) -> Result<bool, StarError> {
        let starred = self
            .github
            .is_starred(owner, repo)
            .await
            .map_err(|e| Self::log_failure(StarError::CheckStatus, e))?;
        if starred {
            info!("Repository {}/{} is already starred", owner, repo);
            return Ok(false);
        }
        self.github
            .star(owner, repo)
            .await
            .map_err(|e| Self::log_failure(StarError::Star, e))?;
        info!("Starred repository {}/{}", owner, repo);
        Ok(true)
    }

    fn log_failure(make: fn(client::Error) -> StarError, error: client::Error) -> StarError {
        if error.unauthorized() {
            warn!("GitHub rejected the access token: {}", error);
        }
        make(error)
    }
}
