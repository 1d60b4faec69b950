use crate::travis::{JobState, MatrixJob, WebhookPayload};
use serde_derive::Serialize;
use serde_json::Value;

/// What downstream consumers need to know about a finished build.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BuildDescription {
    pub params: Value,
    pub owner: String,
    pub repo: String,
    pub pull_request: Option<u64>,
    pub pull_request_title: Option<String>,
    pub build_number: u64,
    pub jobs: Vec<JobSummary>,
    pub author: String,
    pub state: String,
    pub branch: String,
    pub travis_type: String,
    pub language: Option<String>,
    pub scripts: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub id: u64,
    pub display_name: String,
}

pub fn map_payload(payload: &WebhookPayload, params: Value) -> BuildDescription {
    let jobs = payload
        .matrix
        .iter()
        .filter(|job| job.state == JobState::Failed)
        .enumerate()
        .map(|(index, job)| JobSummary {
            id: job.id,
            display_name: job_display_name(job, index),
        })
        .collect();
    BuildDescription {
        params,
        owner: payload.repository.owner_name.clone(),
        repo: payload.repository.name.clone(),
        pull_request: payload.pull_request_number,
        pull_request_title: payload.pull_request_title.clone(),
        build_number: payload.id,
        jobs,
        author: payload.author_name.clone(),
        state: payload.state.clone(),
        branch: payload.branch.clone(),
        travis_type: payload.event_type.clone(),
        language: payload.config.language.clone(),
        scripts: payload.config.script.clone(),
    }
}

/// `index` is the job's position among the failed jobs, not within the whole matrix.
pub fn job_display_name(job: &MatrixJob, index: usize) -> String {
    if job.config.language.as_deref() == Some("node_js") {
        let version = job.config.node_js.as_deref().unwrap_or("undefined");
        return format!("Node.js: {}", version);
    }
    format!("{} Build", ordinal(index + 1))
}

/// English ordinal for `n`: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
