use super::mapper::{map_payload, BuildDescription};
use super::Error;
use crate::github::{GithubClient, RepositoryStarrer};
use crate::travis::{LogPoller, TravisClient, WebhookPayload};
use log::{debug, info};
use serde_derive::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JobLog {
    pub id: u64,
    pub display_name: String,
    pub log: String,
}

/// A build description plus the logs of its failed jobs, ready to be handed downstream.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub build: BuildDescription,
    pub logs: Vec<JobLog>,
    pub starred: Option<bool>,
}

pub struct BuildReporter<T: ?Sized, G: ?Sized> {
    poller: LogPoller<T>,
    starrer: Option<RepositoryStarrer<G>>,
}

impl<T, G> BuildReporter<T, G>
where
    T: TravisClient + ?Sized,
    G: GithubClient + ?Sized,
{
    pub fn new(poller: LogPoller<T>, starrer: Option<RepositoryStarrer<G>>) -> Self {
        Self { poller, starrer }
    }

    pub async fn report(
        &self,
        payload: &WebhookPayload,
        params: Value,
    ) -> Result<BuildReport, Error> {
        let build = map_payload(payload, params);
        info!(
            "Processing build {} of {}/{} ({} failed jobs)",
            build.build_number,
            build.owner,
            build.repo,
            build.jobs.len()
        );

        let mut logs = Vec::with_capacity(build.jobs.len());
        for job in &build.jobs {
            debug!("Fetching log for job '{}' ({})", job.display_name, job.id);
            let log = self.poller.fetch_completed_log(job.id, &build).await?;
            logs.push(JobLog {
                id: job.id,
                display_name: job.display_name.clone(),
                log,
            });
        }

        let starred = match &self.starrer {
            Some(starrer) => Some(starrer.star_repository(&build.owner, &build.repo).await?),
            None => None,
        };
        Ok(BuildReport {
            build,
            logs,
            starred,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client;
    use crate::github::client::MockGithubClient;
    use crate::travis::client::MockTravisClient;
    use crate::travis::models::tests::PAYLOAD;
    use crate::travis::PollConfig;
    use mockall::Sequence;
    use reqwest::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;

    fn poller(travis: MockTravisClient) -> LogPoller<MockTravisClient> {
        LogPoller::new(
            Arc::new(travis),
            PollConfig {
                max_attempts: 2,
                delay: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn polls_failed_jobs_in_order() {
        let mut sequence = Sequence::new();
        let mut travis = MockTravisClient::new();
        for job_id in [1, 3, 4] {
            travis
                .expect_job_log()
                .withf(move |id| *id == job_id)
                .times(1)
                .in_sequence(&mut sequence)
                .returning(move |id| Ok(format!("job {}\nDone. Your build exited with 1.", id)));
        }
        let reporter: BuildReporter<_, MockGithubClient> =
            BuildReporter::new(poller(travis), None);

        let payload = WebhookPayload::from_json(PAYLOAD).unwrap();
        let report = reporter.report(&payload, Value::Null).await.unwrap();
        let logs: Vec<_> = report
            .logs
            .iter()
            .map(|log| (log.id, log.display_name.as_str(), log.log.as_str()))
            .collect();
        assert_eq!(
            logs,
            vec![
                (1, "1st Build", "job 1\nDone. Your build exited with 1."),
                (3, "Node.js: 14", "job 3\nDone. Your build exited with 1."),
                (4, "3rd Build", "job 4\nDone. Your build exited with 1."),
            ]
        );
        assert_eq!(report.build.build_number, 4242);
        assert_eq!(report.starred, None);
    }

    #[tokio::test]
    async fn stars_repository() {
        let mut travis = MockTravisClient::new();
        travis.expect_job_log().returning(|_| Ok("Done.".into()));
        let mut github = MockGithubClient::new();
        github
            .expect_is_starred()
            .withf(|owner, repo| owner == "octocat" && repo == "hello-world")
            .returning(|_, _| Ok(false));
        github.expect_star().times(1).returning(|_, _| Ok(()));
        let reporter = BuildReporter::new(
            poller(travis),
            Some(RepositoryStarrer::new(Arc::new(github))),
        );

        let payload = WebhookPayload::from_json(PAYLOAD).unwrap();
        let report = reporter.report(&payload, Value::Null).await.unwrap();
        assert_eq!(report.starred, Some(true));
        assert_eq!(report.logs.len(), 3);
    }

    #[tokio::test]
    async fn log_errors_abort_the_report() {
        let mut travis = MockTravisClient::new();
        travis
            .expect_job_log()
            .times(1)
            .returning(|_| Err(client::Error::Http(StatusCode::SERVICE_UNAVAILABLE)));
        let mut github = MockGithubClient::new();
        github.expect_is_starred().never();
        let reporter = BuildReporter::new(
            poller(travis),
            Some(RepositoryStarrer::new(Arc::new(github))),
        );

        let payload = WebhookPayload::from_json(PAYLOAD).unwrap();
        let result = reporter.report(&payload, Value::Null).await;
        assert!(matches!(
            result,
            Err(Error::Client(client::Error::Http(
                StatusCode::SERVICE_UNAVAILABLE
            )))
        ));
    }
}
