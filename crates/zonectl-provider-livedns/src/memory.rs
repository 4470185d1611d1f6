// In-process implementation of the zone-versioning API.
//
// Keeps every zone version ever created so callers can inspect what a swap
// left behind. Counts calls per operation for tests and demos.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use zonectl_core::{Error, Result};

use crate::api::{DomainApi, DomainInfo, RecordInfo, ZoneApi, ZoneInfo};

const PROVIDER: &str = "livedns";

#[derive(Debug, Default)]
struct State {
    domains: HashMap<String, DomainInfo>,
    zones: HashMap<String, (ZoneInfo, Vec<RecordInfo>)>,
    next_zone: u64,
}

impl State {
    fn new_zone(&mut self, name: &str) -> String {
        self.next_zone += 1;
        let id = format!("zone-{}", self.next_zone);
        let info = ZoneInfo {
            id: id.clone(),
            name: name.to_string(),
        };
        self.zones.insert(id.clone(), (info, Vec::new()));
        id
    }
}

/// Per-operation call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    zone_info: AtomicUsize,
    create_zone: AtomicUsize,
    create_record: AtomicUsize,
    attach_zone: AtomicUsize,
}

impl CallCounts {
    pub fn zone_info(&self) -> usize {
        self.zone_info.load(Ordering::SeqCst)
    }

    pub fn create_zone(&self) -> usize {
        self.create_zone.load(Ordering::SeqCst)
    }

    pub fn create_record(&self) -> usize {
        self.create_record.load(Ordering::SeqCst)
    }

    pub fn attach_zone(&self) -> usize {
        self.attach_zone.load(Ordering::SeqCst)
    }
}

/// Zone-versioning service held in memory
///
/// `fail_create_record` makes record creation fail, which leaves a
/// half-filled zone version that no domain points at.
#[derive(Debug, Clone, Default)]
pub struct MemoryLiveDns {
    state: Arc<RwLock<State>>,
    calls: Arc<CallCounts>,
    fail_create_record: bool,
}

impl MemoryLiveDns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `create_record` call
    pub fn failing_record_creation(mut self) -> Self {
        self.fail_create_record = true;
        self
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Register a domain served by a fresh zone holding `records`
    pub async fn add_domain(&self, fqdn: &str, nameservers: &[&str], records: Vec<RecordInfo>) -> String {
        let mut state = self.state.write().await;
        let zone_id = state.new_zone(&format!("{} zone", fqdn));
        if let Some((_, zone_records)) = state.zones.get_mut(&zone_id) {
            *zone_records = records;
        }
        state.domains.insert(
            fqdn.to_string(),
            DomainInfo {
                fqdn: fqdn.to_string(),
                zone_id: zone_id.clone(),
                nameservers: nameservers.iter().map(|s| s.to_string()).collect(),
            },
        );
        zone_id
    }

    /// Zone version currently served for `fqdn`
    pub async fn active_zone(&self, fqdn: &str) -> Option<String> {
        self.state.read().await.domains.get(fqdn).map(|d| d.zone_id.clone())
    }

    /// Record sets stored in a zone version
    pub async fn zone_records(&self, zone_id: &str) -> Vec<RecordInfo> {
        self.state
            .read()
            .await
            .zones
            .get(zone_id)
            .map(|(_, records)| records.clone())
            .unwrap_or_default()
    }

    pub async fn zone_count(&self) -> usize {
        self.state.read().await.zones.len()
    }
}

fn unknown_domain(domain: &str) -> Error {
    Error::provider(PROVIDER, format!("unknown domain {}", domain))
}

fn unknown_zone(zone_id: &str) -> Error {
    Error::provider(PROVIDER, format!("unknown zone {}", zone_id))
}

#[async_trait]
impl DomainApi for MemoryLiveDns {
    async fn domain_info(&self, domain: &str) -> Result<DomainInfo> {
        self.state
            .read()
            .await
            .domains
            .get(domain)
            .cloned()
            .ok_or_else(|| unknown_domain(domain))
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<RecordInfo>> {
        let state = self.state.read().await;
        let info = state.domains.get(domain).ok_or_else(|| unknown_domain(domain))?;
        state
            .zones
            .get(&info.zone_id)
            .map(|(_, records)| records.clone())
            .ok_or_else(|| unknown_zone(&info.zone_id))
    }

    async fn attach_zone(&self, domain: &str, zone_id: &str) -> Result<()> {
        self.calls.attach_zone.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        if !state.zones.contains_key(zone_id) {
            return Err(unknown_zone(zone_id));
        }
        let info = state.domains.get_mut(domain).ok_or_else(|| unknown_domain(domain))?;
        debug!("{}: {} -> {}", domain, info.zone_id, zone_id);
        info.zone_id = zone_id.to_string();
        Ok(())
    }
}

#[async_trait]
impl ZoneApi for MemoryLiveDns {
    async fn zone_info(&self, zone_id: &str) -> Result<ZoneInfo> {
        self.calls.zone_info.fetch_add(1, Ordering::SeqCst);
        self.state
            .read()
            .await
            .zones
            .get(zone_id)
            .map(|(info, _)| info.clone())
            .ok_or_else(|| unknown_zone(zone_id))
    }

    async fn create_zone(&self, seed: &ZoneInfo) -> Result<String> {
        self.calls.create_zone.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.write().await.new_zone(&seed.name))
    }

    async fn create_record(&self, zone_id: &str, record: &RecordInfo) -> Result<()> {
        self.calls.create_record.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_record {
            return Err(Error::provider(PROVIDER, "record creation rejected"));
        }
        let mut state = self.state.write().await;
        let (_, records) = state.zones.get_mut(zone_id).ok_or_else(|| unknown_zone(zone_id))?;
        records.push(record.clone());
        Ok(())
    }
}
