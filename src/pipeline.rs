//! One update cycle: fetch IP, compare, resolve zone, resolve record, update
//!
//! The first failing step ends the cycle. The pipeline itself is stateless;
//! the caller owns the previously known IP and decides when to commit a new one.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::dns_provider::{DnsProvider, DnsRecord, UpdateRequest, Zone};
use crate::error::CycleError;
use crate::ip_source::IpSource;

/// Which record the pipeline keeps in sync, and with which TTL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTarget {
    /// Zone name, e.g. `example.com`
    pub domain: String,
    /// Record name inside the zone, e.g. `home`
    pub subdomain: String,
    pub ttl: u32,
}

impl From<&Config> for UpdateTarget {
    fn from(config: &Config) -> Self {
        Self {
            domain: config.domain.clone(),
            subdomain: config.subdomain.clone(),
            ttl: config.ttl,
        }
    }
}

/// Successful end of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The record now points at this address
    Updated(String),
    /// The address matched the previous one; the provider was not contacted
    Unchanged(String),
}

impl CycleOutcome {
    pub fn ip(&self) -> &str {
        match self {
            Self::Updated(ip) | Self::Unchanged(ip) => ip,
        }
    }
}

pub struct UpdatePipeline {
    target: UpdateTarget,
    ip_source: Arc<dyn IpSource>,
    provider: Arc<dyn DnsProvider>,
}

impl UpdatePipeline {
    pub fn new(
        target: UpdateTarget,
        ip_source: Arc<dyn IpSource>,
        provider: Arc<dyn DnsProvider>,
    ) -> Self {
        Self {
            target,
            ip_source,
            provider,
        }
    }

    pub fn target(&self) -> &UpdateTarget {
        &self.target
    }

    /// Runs one cycle against `previous_ip`
    ///
    /// # Errors
    ///
    /// Returns the [`CycleError`] of the first step that failed. No step
    /// after it is attempted.
    pub async fn run_cycle(&self, previous_ip: Option<&str>) -> Result<CycleOutcome, CycleError> {
        let ip = self
            .ip_source
            .fetch_ipv4()
            .await
            .map_err(CycleError::FetchIp)?;
        info!("Fetched public IPv4 address: {}", ip);

        if previous_ip == Some(ip.as_str()) {
            return Ok(CycleOutcome::Unchanged(ip));
        }

        let zones = self
            .provider
            .list_zones()
            .await
            .map_err(CycleError::ZoneFetch)?;
        let zone = find_zone(&zones, &self.target.domain)
            .ok_or_else(|| CycleError::ZoneNotFound(self.target.domain.clone()))?;
        debug!("Resolved zone {} -> {}", zone.name, zone.id);

        let records = self
            .provider
            .list_records(&zone.id)
            .await
            .map_err(|source| CycleError::RecordFetch {
                zone_id: zone.id.clone(),
                source,
            })?;
        let record = find_record(&records, &self.target.subdomain).ok_or_else(|| {
            CycleError::RecordNotFound {
                zone: zone.name.clone(),
                name: self.target.subdomain.clone(),
            }
        })?;
        debug!("Resolved record {} ({})", record, record.id);

        let request = UpdateRequest::a_record(record, &zone.id, &ip, Some(self.target.ttl));
        self.provider
            .update_record(&record.id, &request)
            .await
            .map_err(|source| CycleError::Update {
                record_id: record.id.clone(),
                source,
            })?;

        Ok(CycleOutcome::Updated(ip))
    }
}

/// First zone named exactly `name`
pub fn find_zone<'a>(zones: &'a [Zone], name: &str) -> Option<&'a Zone> {
    zones.iter().find(|z| z.name == name)
}

/// First record named exactly `name`
pub fn find_record<'a>(records: &'a [DnsRecord], name: &str) -> Option<&'a DnsRecord> {
    records.iter().find(|r| r.name == name)
}

//==============================================================================
// Tests
//==============================================================================
