//! Daemon module for hetzner-ddns
//!
//! Drives the update pipeline on a fixed interval and reports every outcome
//! to the shared health state.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::CycleError;
use crate::health::{HealthServer, HealthState};
use crate::pipeline::{CycleOutcome, UpdatePipeline};

/// Redacts the API token from log messages
///
/// # Examples
///
/// ```
/// use hetzner_ddns::daemon::redact_secrets;
///
/// let redacted = redact_secrets("token=secret123", "secret123");
/// assert_eq!(redacted, "token=***REDACTED***");
/// ```
#[must_use]
pub fn redact_secrets(message: &str, api_token: &str) -> String {
    if api_token.is_empty() {
        return message.to_string();
    }
    message.replace(api_token, "***REDACTED***")
}

//==============================================================================
// Daemon
//==============================================================================

/// Scheduler that runs one cycle per tick, strictly one at a time
///
/// The delay between cycles is measured from the end of the previous cycle,
/// so a slow provider stretches the period instead of causing back-to-back
/// cycles.
pub struct Daemon {
    config: Arc<Config>,
    pipeline: UpdatePipeline,
    health: HealthState,
    /// Address committed by the last successful cycle
    last_ip: Option<String>,
}

impl Daemon {
    pub fn new(config: Arc<Config>, pipeline: UpdatePipeline, health: HealthState) -> Self {
        Self {
            config,
            pipeline,
            health,
            last_ip: None,
        }
    }

    pub fn last_ip(&self) -> Option<&str> {
        self.last_ip.as_deref()
    }

    /// Runs until SIGTERM or Ctrl-C
    ///
    /// Signals are only observed between cycles; a cycle in progress is
    /// always allowed to finish.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting hetzner-ddns daemon");
        info!(
            "Record: {} in zone {}",
            self.pipeline.target().subdomain,
            self.pipeline.target().domain
        );
        info!("IPv4 URL: {}", self.config.ipv4_url);
        info!("Interval: {} minutes", self.config.interval_minutes());
        debug!(
            "Effective configuration: {}",
            redact_secrets(&format!("{:?}", self.config), &self.config.api_token)
        );

        let mut health_server = self.start_health_server().await?;

        // Installed up front so a signal arriving mid-cycle is seen once it ends
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        loop {
            if let Err(e) = self.tick().await {
                debug!("Cycle ended with {}, retrying after the interval", e.reason());
            }

            info!(
                "Waiting {} minutes before next check",
                self.config.interval_minutes()
            );
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("SIGTERM received");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Interrupt received");
                    break;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        if let Some(server) = health_server.as_mut() {
            server.stop();
        }
        info!("Daemon stopped");
        Ok(())
    }

    /// Starts the health endpoint unless `health_port` is 0
    pub async fn start_health_server(&self) -> Result<Option<HealthServer>> {
        if self.config.health_port == 0 {
            info!("Health check endpoint disabled");
            return Ok(None);
        }
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.health_port));
        Ok(Some(HealthServer::start(addr, self.health.clone()).await?))
    }

    /// Runs a single cycle and records its outcome
    pub async fn tick(&mut self) -> Result<CycleOutcome, CycleError> {
        info!("Starting DDNS update cycle");
        self.health.record_attempt().await;

        let result = self.pipeline.run_cycle(self.last_ip.as_deref()).await;
        match &result {
            Ok(CycleOutcome::Updated(ip)) => {
                info!("DNS record updated successfully to {}", ip);
                self.health.record_success(ip).await;
                self.last_ip = Some(ip.clone());
            }
            Ok(CycleOutcome::Unchanged(ip)) => {
                info!("IP address has not changed ({}). No update needed.", ip);
                self.health.record_success(ip).await;
            }
            Err(e) => {
                let message = format!(
                    "{}: {}",
                    e.reason(),
                    redact_secrets(&e.to_string(), &self.config.api_token)
                );
                error!("Failed to update DNS record: {}", message);
                if e.is_not_found() {
                    warn!(
                        "Check that zone {} contains a record named {}",
                        self.pipeline.target().domain,
                        self.pipeline.target().subdomain
                    );
                }
                self.health.record_failure(&message).await;
            }
        }
        result
    }
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pipeline::fakes::{failure, populated_provider, FakeIpSource, FakeProvider};
    use crate::pipeline::UpdateTarget;

    fn config() -> Arc<Config> {
        config_with_port(0)
    }

    fn config_with_port(health_port: u16) -> Arc<Config> {
        Arc::new(Config {
            ipv4_url: "http://127.0.0.1:1/ip".to_string(),
            api_token: zeroize::Zeroizing::new("secret_token_123".to_string()),
            domain: "example.com".to_string(),
            subdomain: "home".to_string(),
            ttl: 7200,
            interval: Duration::from_secs(60),
            health_port,
            timeout: Duration::from_secs(5),
            verbose: false,
        })
    }

    fn daemon(ips: Vec<&str>, provider: Arc<FakeProvider>) -> Daemon {
        let config = config();
        let answers = ips
            .into_iter()
            .map(|ip| {
                if ip.is_empty() {
                    Err(failure(503))
                } else {
                    Ok(ip.to_string())
                }
            })
            .collect();
        daemon_with_source(config, Arc::new(FakeIpSource::new(answers)), provider)
    }

    fn daemon_with_source(
        config: Arc<Config>,
        source: Arc<FakeIpSource>,
        provider: Arc<FakeProvider>,
    ) -> Daemon {
        let pipeline = UpdatePipeline::new(UpdateTarget::from(config.as_ref()), source, provider);
        Daemon::new(config, pipeline, HealthState::new())
    }

    #[test]
    fn test_redact_secrets() {
        let redacted = redact_secrets("call with secret_token_123 failed", "secret_token_123");
        assert!(!redacted.contains("secret_token_123"));
        assert!(redacted.contains("***REDACTED***"));
    }

    #[test]
    fn test_redact_secrets_empty() {
        let message = "API call with no secrets";
        assert_eq!(redact_secrets(message, ""), message);
    }

    #[test]
    fn test_config_dump_is_redacted() {
        let config = config();
        let dump = redact_secrets(&format!("{:?}", config), &config.api_token);
        assert!(!dump.contains("secret_token_123"));
        assert!(dump.contains("example.com"));
    }

    #[tokio::test]
    async fn test_update_then_unchanged() {
        let provider = Arc::new(populated_provider());
        let mut d = daemon(vec!["203.0.113.7", "203.0.113.7"], provider.clone());

        let first = d.tick().await.unwrap();
        assert_eq!(first, CycleOutcome::Updated("203.0.113.7".into()));
        assert_eq!(d.last_ip(), Some("203.0.113.7"));

        let second = d.tick().await.unwrap();
        assert_eq!(second, CycleOutcome::Unchanged("203.0.113.7".into()));
        assert_eq!(provider.updates().len(), 1);
        assert_eq!(provider.calls().len(), 3);

        let snap = d.health.snapshot().await;
        assert!(snap.is_healthy);
        assert_eq!(snap.current_ip, "203.0.113.7");
        assert!(snap.last_update_attempt.is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_ip_and_retries_next_cycle() {
        let provider = Arc::new(FakeProvider {
            update_status: Some(500),
            ..populated_provider()
        });
        let mut d = daemon(vec!["203.0.113.7", "203.0.113.7"], provider.clone());

        let err = d.tick().await.unwrap_err();
        assert_eq!(err.reason(), "update-error");
        assert_eq!(d.last_ip(), None);

        let snap = d.health.snapshot().await;
        assert!(!snap.is_healthy);
        assert!(snap.last_error.starts_with("update-error: "));
        assert_eq!(snap.current_ip, "unknown");

        // Same address again: not a no-op, because nothing was committed
        assert!(d.tick().await.is_err());
        assert_eq!(
            provider
                .calls()
                .iter()
                .filter(|c| c.starts_with("update_record"))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_recovery_after_fetch_failure() {
        let provider = Arc::new(populated_provider());
        let mut d = daemon(vec!["203.0.113.7", "", "203.0.113.7"], provider.clone());

        d.tick().await.unwrap();
        let err = d.tick().await.unwrap_err();
        assert_eq!(err.reason(), "fetch-ip-error");
        assert_eq!(d.last_ip(), Some("203.0.113.7"));
        assert!(!d.health.snapshot().await.is_healthy);

        let outcome = d.tick().await.unwrap();
        assert_eq!(outcome, CycleOutcome::Unchanged("203.0.113.7".into()));
        let snap = d.health.snapshot().await;
        assert!(snap.is_healthy);
        assert_eq!(snap.last_error, "");
    }

    #[tokio::test]
    async fn test_changed_ip_updates_again() {
        let provider = Arc::new(populated_provider());
        let mut d = daemon(vec!["203.0.113.7", "203.0.113.8"], provider.clone());

        d.tick().await.unwrap();
        let outcome = d.tick().await.unwrap();
        assert_eq!(outcome, CycleOutcome::Updated("203.0.113.8".into()));
        assert_eq!(d.last_ip(), Some("203.0.113.8"));

        let values: Vec<_> = provider
            .updates()
            .into_iter()
            .map(|(_, req)| req.value)
            .collect();
        assert_eq!(values, ["203.0.113.7", "203.0.113.8"]);
    }

    #[tokio::test]
    async fn test_health_port_zero_starts_no_server() {
        let d = daemon(vec![], Arc::new(populated_provider()));
        assert!(d.start_health_server().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_health_server_listens_on_configured_port() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let d = daemon_with_source(
            config_with_port(port),
            Arc::new(FakeIpSource::default()),
            Arc::new(populated_provider()),
        );

        let mut server = d.start_health_server().await.unwrap().expect("server started");
        assert_eq!(server.local_addr().port(), port);
        assert!(tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok());
        server.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_interval_after_each_cycle() {
        let source = Arc::new(FakeIpSource::new(
            (0..5).map(|_| Ok("203.0.113.7".to_string())).collect(),
        ));
        let provider = Arc::new(populated_provider());
        let mut d = daemon_with_source(config(), source.clone(), provider.clone());
        let handle = tokio::spawn(async move { d.run().await });

        // Offsets stay clear of the 60s cycle boundaries
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(source.fetches(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetches(), 3);

        assert_eq!(provider.updates().len(), 1);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
