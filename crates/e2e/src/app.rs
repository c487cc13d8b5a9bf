//! The bank frontend under test - readiness probing

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to an already-running frontend
pub struct AppUnderTest {
    config: AppConfig,
}

impl AppUnderTest {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn ready_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.ready_path.trim_start_matches('/')
        )
    }

    /// Poll the readiness endpoint until it answers 2xx
    pub async fn wait_until_ready(&self) -> E2eResult<()> {
        let ready_url = self.ready_url();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match client.get(&ready_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Frontend is ready at {}", self.config.base_url);
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Readiness check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for frontend at {}...", self.config.base_url);
                    }
                    // Connection refused is expected while the frontend starts
                    if e.is_connect() {
                        debug!("Readiness check: {}", e);
                    } else {
                        warn!("Readiness check error: {}", e);
                    }
                }
            }

            if start.elapsed() >= self.config.startup_timeout {
                break;
            }
            sleep(self.config.poll_interval).await;
        }

        Err(E2eError::AppNotReady { url: ready_url, attempts })
    }
}

/// Where the frontend lives and how long to wait for it
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,

    /// Path answering 2xx once the frontend can serve pages
    pub ready_path: String,

    pub startup_timeout: Duration,

    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            ready_path: "/ready".to_string(),
            startup_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}
