pub mod client;
pub mod config;
pub mod github;
pub mod processing;
pub mod travis;

pub use crate::config::{Credentials, TravisBotConfig};
pub use processing::{map_payload, BuildDescription, BuildReport, BuildReporter, JobSummary};
pub use travis::{LogPoller, PollConfig, WebhookPayload};
