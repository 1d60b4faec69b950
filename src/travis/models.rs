use serde::Deserializer;
use serde_derive::Deserialize;
use std::io::Read;

/// The body Travis CI posts to a webhook once a build finishes.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    pub id: u64,
    pub repository: Repository,
    pub pull_request_number: Option<u64>,
    pub pull_request_title: Option<String>,
    pub matrix: Vec<MatrixJob>,
    pub author_name: String,
    pub state: String,
    pub branch: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub config: BuildConfig,
}

impl WebhookPayload {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Repository {
    pub owner_name: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MatrixJob {
    pub id: u64,
    pub state: JobState,
    pub config: JobConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum JobState {
    #[serde(rename = "passed")]
    Passed,

    #[serde(rename = "failed")]
    Failed,

    #[serde(rename = "errored")]
    Errored,

    #[serde(rename = "canceled")]
    Canceled,

    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct JobConfig {
    pub language: Option<String>,

    #[serde(default, deserialize_with = "version_string")]
    pub node_js: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BuildConfig {
    pub language: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub script: Vec<String>,
}

// `.travis.yml` lets `node_js: 14` be written as a bare number.
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Number(serde_json::Number),
    }

    let version = <Option<Version> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(version.map(|version| match version {
        Version::Text(text) => text,
        Version::Number(number) => number.to_string(),
    }))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scripts {
        One(String),
        Many(Vec<String>),
    }

    let scripts = <Option<Scripts> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(match scripts {
        Some(Scripts::One(script)) => vec![script],
        Some(Scripts::Many(scripts)) => scripts,
        None => Vec::new(),
    })
}
