use crate::config::CredentialsError;
use crate::github::StarError;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] crate::client::Error),

    #[error("malformed webhook payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Star(#[from] StarError),

    #[error("{0}")]
    Generic(Cow<'static, str>),
}

impl Error {
    pub fn as_generic<T>(message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self::Generic(message.into())
    }
}
