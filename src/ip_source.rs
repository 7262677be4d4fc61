//! Public IPv4 detection
//!
//! Asks an "echo my IP" web service for the caller's address. The service
//! answers with the bare address as plain text, usually followed by a newline.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::constants::USER_AGENT;
use crate::error::ClientError;
use crate::validation::parse_ipv4;

/// Source of the caller's current public IPv4 address
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Returns the address as a trimmed dotted-quad string
    async fn fetch_ipv4(&self) -> Result<String, ClientError>;
}

/// [`IpSource`] backed by a plain HTTP GET
pub struct HttpIpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpIpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn fetch_ipv4(&self) -> Result<String, ClientError> {
        debug!("GET {}", self.url);
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        debug!("IP echo response: status={} body={:?}", status, body);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match parse_ipv4(&body) {
            Some(addr) => Ok(addr.to_string()),
            None => Err(ClientError::InvalidAddress(body.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer, body: ResponseTemplate) -> HttpIpSource {
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(body)
            .mount(server)
            .await;
        HttpIpSource::new(format!("{}/ip", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_trailing_newline_is_trimmed() {
        let server = MockServer::start().await;
        let source =
            source_for(&server, ResponseTemplate::new(200).set_body_string("203.0.113.7\n")).await;

        assert_eq!(source.fetch_ipv4().await.unwrap(), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_non_ipv4_body_is_rejected() {
        let server = MockServer::start().await;
        let source =
            source_for(&server, ResponseTemplate::new(200).set_body_string("2001:db8::1\n")).await;

        let err = source.fetch_ipv4().await.unwrap_err();
        match err {
            ClientError::InvalidAddress(body) => assert_eq!(body, "2001:db8::1"),
            other => panic!("expected invalid address, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        let source = source_for(&server, ResponseTemplate::new(503)).await;

        let err = source.fetch_ipv4().await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source =
            HttpIpSource::new(format!("http://127.0.0.1:{port}/ip"), Duration::from_secs(2))
                .unwrap();
        let err = source.fetch_ipv4().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
