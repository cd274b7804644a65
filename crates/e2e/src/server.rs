//! Server readiness - waiting for the server under test to answer HTTP

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Polls a server until it answers or the startup timeout runs out
#[derive(Debug, Clone)]
pub struct ServerProbe {
    pub base_url: String,
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
}

impl ServerProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            startup_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_timeout(mut self, startup_timeout: Duration) -> Self {
        self.startup_timeout = startup_timeout;
        self
    }

    /// Wait for any HTTP answer from the server root.
    ///
    /// An error status still proves the server is up; only transport
    /// failures count as "not yet".
    pub async fn wait_until_ready(&self) -> E2eResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < self.startup_timeout {
            attempts += 1;

            match client.get(&self.base_url).send().await {
                Ok(resp) => {
                    info!("Server is up at {} ({})", self.base_url, resp.status());
                    return Ok(());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for server at {}...", self.base_url);
                    }
                    // Connection refused is expected while the server is starting
                    if !e.is_connect() {
                        warn!("Readiness check error: {}", e);
                    }
                }
            }

            sleep(self.poll_interval).await;
        }

        Err(E2eError::ServerUnavailable {
            url: self.base_url.clone(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_error_status_counts_as_ready() {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        ServerProbe::new(server.url()).wait_until_ready().await.unwrap();
        root.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = ServerProbe::new(format!("http://127.0.0.1:{}", port))
            .with_timeout(Duration::from_millis(300));
        let err = probe.wait_until_ready().await.unwrap_err();
        match err {
            E2eError::ServerUnavailable { attempts, .. } => assert!(attempts >= 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
