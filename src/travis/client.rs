use crate::client::{ApiClient, Result};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TravisClient: Send + Sync {
    /// Fetches the raw log of a job, with ANSI escapes removed server side where supported.
    async fn job_log(&self, job_id: u64) -> Result<String>;
}

pub struct DefaultTravisClient {
    client: ApiClient,
    api_base: String,
}

impl DefaultTravisClient {
    pub const API_BASE: &'static str = "https://api.travis-ci.org";

    /// Any failed fetch, rate limiting included, is returned to the caller as is.
    pub fn new<S: Into<String>>(api_base: S) -> Result<Self> {
        Ok(Self {
            client: ApiClient::anonymous()?.without_rate_limit_retries(),
            api_base: api_base.into(),
        })
    }

    fn make_log_url(&self, job_id: u64) -> String {
        format!(
            "{}/jobs/{}/log.txt?deansi=true",
            self.api_base.trim_end_matches('/'),
            job_id
        )
    }
}

#[async_trait]
impl TravisClient for DefaultTravisClient {
    async fn job_log(&self, job_id: u64) -> Result<String> {
        let url = self.make_log_url(job_id);
        self.client.get_text(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Error;
    use reqwest::StatusCode;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    // Answers every request with the given raw status line and counts connections.
    fn serve_status(status_line: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let seen = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => break,
                };
                seen.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut buffer = [0; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match stream.read(&mut buffer) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buffer[..read]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{}", address), requests)
    }

    #[tokio::test]
    async fn rate_limited_log_fetch_is_not_retried() {
        let (api_base, requests) = serve_status("429 Too Many Requests");
        let client = DefaultTravisClient::new(api_base).unwrap();

        let result = client.job_log(1).await;
        assert!(matches!(
            result,
            Err(Error::Http(StatusCode::TOO_MANY_REQUESTS))
        ));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn log_url() {
        let client = DefaultTravisClient::new(DefaultTravisClient::API_BASE).unwrap();
        assert_eq!(
            client.make_log_url(1337),
            "https://api.travis-ci.org/jobs/1337/log.txt?deansi=true"
        );

        let client = DefaultTravisClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.make_log_url(7),
            "http://localhost:8080/jobs/7/log.txt?deansi=true"
        );
    }
}
