// # Memory Provider
//
// In-memory DNS provider and registrar.
//
// ## Purpose
//
// Holds zones in a map protected by a RwLock and patches them in place, one
// correction per changed record group. Nothing survives a restart.
//
// ## When to Use
//
// - Testing environments
// - Embedding zonectl where the "provider" is another component's state
// - Dry runs against a snapshot of a real zone

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::diff::{Change, Differ};
use crate::error::Result;
use crate::models::{Correction, DomainConfig, Nameserver, RecordConfig, strings_to_nameservers};
use crate::normalize::post_process_records;
use crate::traits::{
    DnsProviderFactory, DnsServiceProvider, ProviderSettings, Registrar, RegistrarFactory,
};

type Zones = Arc<RwLock<HashMap<String, Vec<RecordConfig>>>>;

/// In-memory DNS provider
///
/// # Example
///
/// ```rust,no_run
/// use zonectl_core::providers::MemoryProvider;
/// use zonectl_core::models::{RecordConfig, RecordType};
///
/// #[tokio::main]
/// async fn main() {
///     let provider = MemoryProvider::new();
///     provider
///         .set_zone("example.com", vec![
///             RecordConfig::new(RecordType::A, "www", "example.com").with_target("1.2.3.4"),
///         ])
///         .await;
///     assert_eq!(provider.zone("example.com").await.len(), 1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    zones: Zones,
    nameservers: Vec<Nameserver>,
}

impl MemoryProvider {
    /// Create a provider with no zones and no nameservers
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these nameservers for every domain
    pub fn with_nameservers(mut self, nameservers: Vec<Nameserver>) -> Self {
        self.nameservers = nameservers;
        self
    }

    /// Replace the live records of a zone
    pub async fn set_zone(&self, domain: &str, records: Vec<RecordConfig>) {
        self.zones.write().await.insert(domain.to_string(), records);
    }

    /// Current live records of a zone (empty when unknown)
    pub async fn zone(&self, domain: &str) -> Vec<RecordConfig> {
        self.zones.read().await.get(domain).cloned().unwrap_or_default()
    }

    async fn apply(zones: Zones, domain: String, change: Change) -> Result<()> {
        let mut guard = zones.write().await;
        let records = guard.entry(domain.clone()).or_default();
        let key = change.key().clone();
        records.retain(|r| r.key() != key);
        match change {
            Change::Create { desired } | Change::Modify { desired, .. } => {
                records.extend(desired.records);
            }
            Change::Delete { .. } => {}
        }
        info!("Applied change to {} {} in {}", key.rtype, key.name, domain);
        Ok(())
    }
}

#[async_trait]
impl DnsServiceProvider for MemoryProvider {
    async fn get_nameservers(&self, _domain: &str) -> Result<Vec<Nameserver>> {
        Ok(self.nameservers.clone())
    }

    async fn get_domain_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        let mut live = self.zone(&dc.name).await;
        post_process_records(&mut live);

        let changeset = Differ::new(dc).diff(&live);
        let corrections = changeset
            .changes
            .into_iter()
            .map(|change| {
                let zones = self.zones.clone();
                let domain = dc.name.clone();
                let msg = change.to_string();
                Correction::new(msg, move || Self::apply(zones, domain, change))
            })
            .collect();
        Ok(corrections)
    }

    fn provider_name(&self) -> &'static str {
        "MEMORY"
    }
}

/// In-memory registrar tracking delegated nameservers per domain
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistrar {
    delegations: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl MemoryRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nameservers currently registered for a domain, sorted
    pub async fn delegation(&self, domain: &str) -> Vec<String> {
        self.delegations.read().await.get(domain).cloned().unwrap_or_default()
    }

    pub async fn set_delegation(&self, domain: &str, nameservers: Vec<String>) {
        let mut sorted = nameservers;
        sorted.sort();
        self.delegations.write().await.insert(domain.to_string(), sorted);
    }
}

#[async_trait]
impl Registrar for MemoryRegistrar {
    async fn get_registrar_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        let current = self.delegation(&dc.name).await;
        let mut desired: Vec<String> = dc.nameservers.iter().map(|ns| ns.name.clone()).collect();
        desired.sort();

        if current == desired {
            return Ok(Vec::new());
        }

        let msg = format!(
            "Change nameservers from '{}' to '{}'",
            current.join(","),
            desired.join(",")
        );
        let registrar = self.clone();
        let domain = dc.name.clone();
        Ok(vec![Correction::new(msg, move || async move {
            registrar.set_delegation(&domain, desired).await;
            Ok(())
        })])
    }

    fn registrar_name(&self) -> &'static str {
        "MEMORY"
    }
}

/// Builds [`MemoryProvider`]s; setting `nameservers` is a comma list
pub struct MemoryProviderFactory;

impl DnsProviderFactory for MemoryProviderFactory {
    fn create(
        &self,
        settings: &ProviderSettings,
        _meta: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn DnsServiceProvider>> {
        let names: Vec<&str> = settings
            .get("nameservers")
            .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Ok(Arc::new(
            MemoryProvider::new().with_nameservers(strings_to_nameservers(&names)),
        ))
    }
}

pub struct MemoryRegistrarFactory;

impl RegistrarFactory for MemoryRegistrarFactory {
    fn create(&self, _settings: &ProviderSettings) -> Result<Arc<dyn Registrar>> {
        Ok(Arc::new(MemoryRegistrar::new()))
    }
}
