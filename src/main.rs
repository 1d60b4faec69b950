use env_logger::Env;
use log::{error, info};
use serde_json::Value;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use structopt::StructOpt;
use travis_bot::{
    github::{DefaultGithubClient, RepositoryStarrer},
    processing::Error,
    travis::DefaultTravisClient,
    BuildReporter, Credentials, LogPoller, PollConfig, TravisBotConfig, WebhookPayload,
};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "travis-bot",
    about = "Waits for the logs of a finished Travis CI build and reports on its failed jobs"
)]
struct Options {
    /// Path to the config file
    #[structopt(short, long, default_value = "~/.travis-bot.yaml")]
    config: String,

    /// Extra JSON passed through untouched to the report
    #[structopt(short, long)]
    params: Option<String>,

    /// Star the build's repository using the GitHub access token
    #[structopt(long)]
    star: bool,

    /// Webhook payload file, or `-` to read it from stdin
    #[structopt(parse(from_os_str))]
    payload: PathBuf,

    /// Extra arguments, e.g. `githubAccessToken=<token>`
    args: Vec<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let options = Options::from_args();
    if let Err(e) = run(options).await {
        error!("Error processing build: {}", e);
        process::exit(1);
    }
}

async fn run(options: Options) -> Result<(), Error> {
    let config = TravisBotConfig::new(&options.config)?;
    info!(
        "Max attempts to get done is: {}",
        config.travis.max_attempts_to_get_done
    );

    let payload = read_payload(&options.payload)?;
    let params = match &options.params {
        Some(params) => serde_json::from_str(params)
            .map_err(|e| Error::as_generic(format!("invalid params JSON: {}", e)))?,
        None => Value::Null,
    };

    let travis = DefaultTravisClient::new(config.travis.api_base.clone())?;
    let poller = LogPoller::new(Arc::new(travis), PollConfig::from(&config.travis));
    let starrer = if options.star {
        let credentials = Credentials::new(config.github.access_token.clone(), options.args);
        let token = credentials.resolve_access_token()?;
        let github = DefaultGithubClient::new(config.github.api_base.clone(), token)?;
        Some(RepositoryStarrer::new(Arc::new(github)))
    } else {
        None
    };

    let reporter = BuildReporter::new(poller, starrer);
    let report = reporter.report(&payload, params).await?;
    let output = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::as_generic(format!("failed to serialize report: {}", e)))?;
    println!("{}", output);
    Ok(())
}

fn read_payload(path: &Path) -> Result<WebhookPayload, Error> {
    let payload = if path.as_os_str() == "-" {
        WebhookPayload::from_reader(io::stdin().lock())?
    } else {
        let file = File::open(path).map_err(|e| {
            Error::as_generic(format!("failed to open {}: {}", path.display(), e))
        })?;
        WebhookPayload::from_reader(io::BufReader::new(file))?
    };
    Ok(payload)
}
