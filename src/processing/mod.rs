pub mod error;
pub mod mapper;
pub mod reporter;

pub use error::Error;
pub use mapper::{job_display_name, map_payload, ordinal, BuildDescription, JobSummary};
pub use reporter::{BuildReport, BuildReporter, JobLog};
