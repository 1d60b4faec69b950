use backoff::{backoff::Backoff, ExponentialBackoff};
use log::info;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use std::future::Future;
use thiserror::Error;
use tokio::time::sleep;

static USER_AGENT: &str = "travis-bot";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug)]
pub enum Authentication {
    None,
    Bearer(String),
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    auth: Authentication,
    retry_rate_limits: bool,
}

impl ApiClient {
    pub fn anonymous() -> Result<Self> {
        ApiClient::new(Authentication::None)
    }

    pub fn from_token<T: Into<String>>(token: T) -> Result<Self> {
        ApiClient::new(Authentication::Bearer(token.into()))
    }

    fn new(auth: Authentication) -> Result<Self> {
        let client = ClientBuilder::new().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            auth,
            retry_rate_limits: true,
        })
    }

    /// Makes `429 Too Many Requests` fail like any other status instead of backing off.
    pub fn without_rate_limit_retries(mut self) -> Self {
        self.retry_rate_limits = false;
        self
    }

    /// Fetches the body of `endpoint` as plain text.
    pub async fn get_text(&self, endpoint: &str) -> Result<String> {
        retry_request_if_needed(self.retry_rate_limits, move || async move {
            let response = self.submit(self.client.get(endpoint)).await?;
            Ok::<_, Error>(response.text().await?)
        })
        .await
    }

    /// Issues a GET whose only interesting outcome is the status code, e.g. `204 No Content`.
    pub async fn get_empty(&self, endpoint: &str) -> Result<()> {
        retry_request_if_needed(self.retry_rate_limits, move || async move {
            self.submit(self.client.get(endpoint)).await?;
            Ok::<_, Error>(())
        })
        .await
    }

    pub async fn put_empty(&self, endpoint: &str) -> Result<()> {
        retry_request_if_needed(self.retry_rate_limits, move || async move {
            // GitHub requires an explicit zero length for body-less PUTs
            let builder = self
                .client
                .put(endpoint)
                .header(reqwest::header::CONTENT_LENGTH, 0);
            self.submit(builder).await?;
            Ok::<_, Error>(())
        })
        .await
    }

    async fn submit(&self, builder: RequestBuilder) -> Result<Response> {
        let builder = match &self.auth {
            Authentication::None => builder,
            Authentication::Bearer(token) => builder.bearer_auth(token),
        };
        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Error::Http(response.status()))
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("rate limited max attempts reached")]
    RateLimitRetries,

    #[error("request failed with status code {0}")]
    Http(StatusCode),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    pub fn not_found(&self) -> bool {
        matches!(self, Self::Http(StatusCode::NOT_FOUND))
    }

    pub fn unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Http(StatusCode::UNAUTHORIZED) | Self::Http(StatusCode::FORBIDDEN)
        )
    }

    pub fn too_many_requests(&self) -> bool {
        matches!(self, Self::Http(StatusCode::TOO_MANY_REQUESTS))
    }
}

async fn retry_request_if_needed<F, R, O>(retry_rate_limits: bool, requestor: F) -> Result<O>
where
    F: Fn() -> R,
    R: Future<Output = Result<O>>,
{
    let mut backoff = ExponentialBackoff::default();
    loop {
        match requestor().await {
            Err(e) if retry_rate_limits && e.too_many_requests() => {
                let delay = backoff.next_backoff();
                match delay {
                    Some(delay) => {
                        info!("Rate limit hit, sleeping for {}s", delay.as_secs());
                        sleep(delay).await
                    }
                    None => return Err(Error::RateLimitRetries),
                }
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rstest]
    #[case(StatusCode::NOT_FOUND, true, false)]
    #[case(StatusCode::UNAUTHORIZED, false, true)]
    #[case(StatusCode::FORBIDDEN, false, true)]
    #[case(StatusCode::BAD_GATEWAY, false, false)]
    fn status_predicates(
        #[case] status: StatusCode,
        #[case] not_found: bool,
        #[case] unauthorized: bool,
    ) {
        let error = Error::Http(status);
        assert_eq!(error.not_found(), not_found);
        assert_eq!(error.unauthorized(), unauthorized);
        assert!(!error.too_many_requests());
    }

    #[tokio::test]
    async fn non_rate_limit_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let result: Result<()> = retry_request_if_needed(true, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Http(StatusCode::INTERNAL_SERVER_ERROR))
        })
        .await;
        assert!(matches!(
            result,
            Err(Error::Http(StatusCode::INTERNAL_SERVER_ERROR))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limits_fail_fast_when_retries_are_disabled() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let result: Result<()> = retry_request_if_needed(false, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Http(StatusCode::TOO_MANY_REQUESTS))
        })
        .await;
        assert!(matches!(result, Err(e) if e.too_many_requests()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
