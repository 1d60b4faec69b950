use super::TravisClient;
use crate::client::Result;
use crate::config::TravisConfig;
use log::{debug, info};
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::sleep;

/// Travis appends a line starting with this once a job's log is complete.
pub const DONE_MARKER: &str = "Done.";

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl From<&TravisConfig> for PollConfig {
    fn from(config: &TravisConfig) -> Self {
        Self {
            max_attempts: config.max_attempts_to_get_done,
            delay: config.poll_interval(),
        }
    }
}

/// Re-fetches a job's log until it ends with the [`DONE_MARKER`] line or the attempt bound is hit.
pub struct LogPoller<C: ?Sized> {
    client: Arc<C>,
    config: PollConfig,
}

impl<C> LogPoller<C>
where
    C: TravisClient + ?Sized,
{
    pub fn new(client: Arc<C>, config: PollConfig) -> Self {
        Self { client, config }
    }

    /// Returns the ANSI-stripped log once it is complete.
    ///
    /// Running out of attempts is not an error: the last fetched log is returned as is. Errors
    /// fetching the log are returned right away without retrying. `context` only shows up in
    /// log records.
    pub async fn fetch_completed_log<D>(&self, job_id: u64, context: &D) -> Result<String>
    where
        D: Debug + ?Sized,
    {
        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;
        loop {
            let log = self.client.job_log(job_id).await?;
            if is_done(&log) {
                info!(
                    "Done found for job {} after {}/{} attempts",
                    job_id, attempt, max_attempts
                );
                debug!("Job {} context: {:?}", job_id, context);
                return Ok(strip_ansi(&log).into_owned());
            }
            if attempt >= max_attempts {
                info!(
                    "Max attempts reached for job {}, giving up on waiting for done",
                    job_id
                );
                return Ok(strip_ansi(&log).into_owned());
            }
            info!(
                "Done not found for job {}, requesting log again ({}/{})",
                job_id, attempt, max_attempts
            );
            debug!("Job {} context: {:?}", job_id, context);
            sleep(self.config.delay).await;
            attempt += 1;
        }
    }
}

/// Whether the last line of the trimmed log starts with [`DONE_MARKER`].
pub fn is_done(log: &str) -> bool {
    log.trim()
        .lines()
        .last()
        .map_or(false, |line| line.starts_with(DONE_MARKER))
}

pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let ansi = ANSI.get_or_init(|| {
        Regex::new(concat!(
            r"[\x1b\x{9b}][\[\]()#;?]*(?:",
            r"(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)",
            r"|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-ntqry=><~])",
            r")"
        ))
        .expect("ANSI pattern is valid")
    });
    ansi.replace_all(text, "")
}
