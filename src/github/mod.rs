pub mod client;
pub mod star;

pub use client::{DefaultGithubClient, GithubClient};
pub use star::{RepositoryStarrer, StarError};
