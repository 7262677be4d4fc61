//! Hetzner DNS API client
//!
//! Uses reqwest with rustls for HTTP requests. Every exchange is logged at
//! debug level (request target, status, raw body) before the status code is
//! checked, so `--verbose` shows exactly what the provider answered.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{HETZNER_API_BASE, HETZNER_AUTH_HEADER, USER_AGENT};
use crate::dns_provider::{DnsProvider, DnsRecord, UpdateRequest, Zone};
use crate::error::ClientError;

/// Page size requested when listing zones (provider maximum)
const ZONES_PER_PAGE: u32 = 100;

//==============================================================================
// Wire Types
//==============================================================================

#[derive(Debug, Deserialize)]
struct ZoneList {
    #[serde(default)]
    zones: Option<Vec<Zone>>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Pagination {
    #[serde(default)]
    last_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Option<Vec<DnsRecord>>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    record: DnsRecord,
}

//==============================================================================
// Timestamps
//==============================================================================

/// Lenient decoding of the provider's `created`/`modified` timestamps
///
/// Hetzner formats them as `2024-01-31 10:20:30.123 +0000 UTC` with zero,
/// three or six fractional digits. RFC 3339 is accepted as well. Values that
/// match neither decode to `None`; they are informational only.
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const HETZNER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z UTC";

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        DateTime::parse_from_str(raw, HETZNER_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }
}

//==============================================================================
// Client
//==============================================================================

pub struct HetznerClient {
    api_token: Zeroizing<String>,
    base_url: String,
    client: reqwest::Client,
}

impl HetznerClient {
    pub fn new(api_token: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_token, timeout, HETZNER_API_BASE)
    }

    /// Creates a client against a different API root (used by tests)
    pub fn with_base_url(
        api_token: &str,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            api_token: Zeroizing::new(api_token.to_string()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Sends an authenticated request and returns the body of a 2xx answer
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<String, ClientError> {
        let resp = request
            .header(HETZNER_AUTH_HEADER, self.api_token.as_str())
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        debug!("Hetzner DNS API response ({}): status={} body={}", what, status, body);

        if !status.is_success() {
            warn!("{} failed with HTTP {}", what, status.as_u16());
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn zones_page(&self, page: u32) -> Result<ZoneList, ClientError> {
        let url = format!(
            "{}/zones?page={}&per_page={}",
            self.base_url, page, ZONES_PER_PAGE
        );
        debug!("GET {}", url);
        let body = self.execute(self.client.get(&url), "fetch zones").await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DnsProvider for HetznerClient {
    async fn list_zones(&self) -> Result<Vec<Zone>, ClientError> {
        let mut zones = Vec::new();
        let mut page = 1;
        loop {
            let list = self.zones_page(page).await?;
            zones.extend(list.zones.unwrap_or_default());

            let last_page = list
                .meta
                .and_then(|m| m.pagination)
                .and_then(|p| p.last_page)
                .unwrap_or(page);
            if page >= last_page {
                break;
            }
            page += 1;
        }
        debug!("Fetched {} zones", zones.len());
        Ok(zones)
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, ClientError> {
        let url = format!("{}/records?zone_id={}", self.base_url, encode(zone_id));
        debug!("GET {}", url);
        let body = self.execute(self.client.get(&url), "fetch records").await?;
        let list: RecordList = serde_json::from_str(&body)?;
        let records = list.records.unwrap_or_default();
        debug!("Fetched {} records for zone {}", records.len(), zone_id);
        Ok(records)
    }

    async fn update_record(
        &self,
        record_id: &str,
        request: &UpdateRequest,
    ) -> Result<(), ClientError> {
        let url = format!("{}/records/{}", self.base_url, encode(record_id));
        debug!("PUT {}", url);
        let body = self
            .execute(self.client.put(&url).json(request), "update record")
            .await?;

        match serde_json::from_str::<RecordResponse>(&body) {
            Ok(resp) => debug!("Provider now holds {}", resp.record),
            Err(e) => debug!("Update response not decoded as record: {}", e),
        }
        Ok(())
    }
}

//==============================================================================
// Tests
//==============================================================================
