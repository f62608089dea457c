//! Health check utilities for the engine server.

use anyhow::Result;
use reqwest::Client;
use tokio::time::{Duration, Instant, sleep};
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Single `GET {base_url}/health` probe.
pub async fn check_http_health(client: &Client, base_url: &str) -> bool {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!("Health check failed: {}", e);
            false
        }
    }
}

/// Wait for the engine health check to succeed.
///
/// Polls `/health` once per second until it returns 2xx or `timeout`
/// elapses. Model loading can take minutes, so callers pass generous
/// timeouts.
pub async fn wait_for_http_health(base_url: &str, timeout: Duration) -> Result<()> {
    info!("Waiting for inference engine to be ready at {}/health", base_url);

    let client = Client::builder().timeout(Duration::from_secs(2)).build()?;
    let deadline = Instant::now() + timeout;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if check_http_health(&client, base_url).await {
            info!(attempt, "Inference engine is ready at {}", base_url);
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(anyhow::anyhow!(
                "Inference engine at {} did not become healthy within {}s",
                base_url,
                timeout.as_secs()
            ));
        }

        debug!(attempt, "Engine not ready yet, retrying...");
        sleep(POLL_INTERVAL).await;
    }
}
