//! ERP target - health checking the system under test
//!
//! The ERP runs outside the harness; nothing is spawned here. Before a suite
//! starts we only wait until its health endpoint answers.

use erpqa_common::{poll_until_eq, PollConfig, PollError};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::TargetConfig;
use crate::error::{E2eError, E2eResult};

/// Handle to the ERP instance under test
pub struct ErpTarget {
    client: reqwest::Client,
    base_url: String,
    health_url: String,
}

impl ErpTarget {
    pub fn new(config: &TargetConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let health_url = format!("{}{}", base_url, config.health_path);

        Ok(Self {
            client,
            base_url,
            health_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single health probe
    pub async fn is_healthy(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("Health check returned {}", resp.status());
                false
            }
            Err(e) => {
                // Connection refused is expected while the ERP is still starting
                if !e.is_connect() {
                    warn!("Health check error: {}", e);
                }
                false
            }
        }
    }

    /// Wait for the ERP to respond to health checks; returns the number of probes
    pub async fn wait_until_healthy(&self, poll: &PollConfig) -> E2eResult<usize> {
        info!("Waiting for ERP at {}...", self.base_url);

        let target = self;
        let probe = move || async move { Ok::<_, E2eError>(target.is_healthy().await) };

        match poll_until_eq(probe, &true, poll).await {
            Ok(converged) => {
                info!("ERP is healthy at {} ({} probes)", self.base_url, converged.attempts);
                Ok(converged.attempts)
            }
            Err(PollError::Timeout(timeout)) => Err(E2eError::TargetUnreachable {
                url: self.health_url.clone(),
                attempts: timeout.attempts,
            }),
            Err(PollError::Read(e)) => Err(e),
        }
    }
}
