pub mod client;
pub mod models;
pub mod poller;

pub use client::{DefaultTravisClient, TravisClient};
pub use models::{BuildConfig, JobConfig, JobState, MatrixJob, Repository, WebhookPayload};
pub use poller::{is_done, strip_ansi, LogPoller, PollConfig, DONE_MARKER};
