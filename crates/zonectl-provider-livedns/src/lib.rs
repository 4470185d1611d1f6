// # LiveDNS Provider
//
// DNS provider for services that version whole zones instead of editing
// records in place.
//
// ## Update model
//
// A domain points at one zone version. A change never touches that version:
// the single correction this provider returns
//
// 1. reads the zone version the domain currently serves,
// 2. creates a new version seeded from it,
// 3. creates every resulting record set inside the new version,
// 4. repoints the domain at the new version.
//
// A failure before step 4 leaves the domain on the old version; the
// half-built version is left behind unattached.
//
// ## Constraints
//
// - Computing corrections only reads (`list_records`)
// - No retries: a failed call is returned to the orchestrator
// - The correction message lists the complete resulting record set, so it
//   can be shown before anything runs

pub mod api;
pub mod convert;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use zonectl_core::diff::Differ;
use zonectl_core::models::{Correction, DomainConfig, Nameserver, strings_to_nameservers};
use zonectl_core::normalize::post_process_records;
use zonectl_core::traits::{DnsProviderFactory, DnsServiceProvider, ProviderSettings};
use zonectl_core::{Error, ProviderRegistry, Result};

pub use api::{DomainApi, DomainInfo, RecordInfo, ZoneApi, ZoneInfo};
pub use convert::{record_configs_from_info, records_to_info};
pub use memory::MemoryLiveDns;

/// Provider type name used in configuration
pub const PROVIDER_TYPE: &str = "LIVEDNS";

/// Copy-on-write DNS provider over a zone-versioning API
#[derive(Clone)]
pub struct LiveDnsProvider {
    domains: Arc<dyn DomainApi>,
    zones: Arc<dyn ZoneApi>,
}

impl std::fmt::Debug for LiveDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveDnsProvider").finish_non_exhaustive()
    }
}

impl LiveDnsProvider {
    pub fn new(domains: Arc<dyn DomainApi>, zones: Arc<dyn ZoneApi>) -> Self {
        Self { domains, zones }
    }

    /// Provider whose domain and zone calls both go to `api`
    pub fn from_api<A>(api: A) -> Self
    where
        A: DomainApi + ZoneApi + Clone + 'static,
    {
        Self::new(Arc::new(api.clone()), Arc::new(api))
    }

    async fn swap_zone(
        domains: Arc<dyn DomainApi>,
        zones: Arc<dyn ZoneApi>,
        domain: String,
        records: Vec<RecordInfo>,
    ) -> Result<()> {
        let current = domains.domain_info(&domain).await?;
        let seed = zones.zone_info(&current.zone_id).await?;
        let new_zone = zones.create_zone(&seed).await?;
        debug!("{}: created zone {} from {}", domain, new_zone, seed.id);

        for record in &records {
            zones.create_record(&new_zone, record).await?;
        }

        domains.attach_zone(&domain, &new_zone).await?;
        info!(
            "{}: now served by zone {} ({} record sets)",
            domain,
            new_zone,
            records.len()
        );
        Ok(())
    }
}

#[async_trait]
impl DnsServiceProvider for LiveDnsProvider {
    async fn get_nameservers(&self, domain: &str) -> Result<Vec<Nameserver>> {
        let info = self.domains.domain_info(domain).await?;
        Ok(strings_to_nameservers(&info.nameservers))
    }

    async fn get_domain_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        let infos = self.domains.list_records(&dc.name).await?;
        let mut live = record_configs_from_info(&infos, &dc.name)?;
        post_process_records(&mut live);

        let differ = Differ::new(dc);
        let changeset = differ.diff(&live);
        if changeset.is_empty() {
            return Ok(Vec::new());
        }
        debug!("{}: {} record sets differ", dc.name, changeset.len());

        let resulting = differ.resulting_records(&live);
        let mut msg = format!("Setting dns records for {}:", dc.name);
        for rc in &resulting {
            msg.push('\n');
            msg.push_str(&rc.to_string());
        }

        let records = records_to_info(&resulting);
        let domains = self.domains.clone();
        let zones = self.zones.clone();
        let domain = dc.name.clone();
        Ok(vec![Correction::new(msg, move || {
            Self::swap_zone(domains, zones, domain, records)
        })])
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_TYPE
    }
}

/// Factory for [`LiveDnsProvider`]s backed by one shared API instance
pub struct LiveDnsFactory<A> {
    api: A,
}

impl<A> LiveDnsFactory<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A> DnsProviderFactory for LiveDnsFactory<A>
where
    A: DomainApi + ZoneApi + Clone + 'static,
{
    fn create(
        &self,
        settings: &ProviderSettings,
        _meta: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn DnsServiceProvider>> {
        match settings.get("apikey") {
            Some(key) if key.trim().is_empty() => {
                Err(Error::config("LIVEDNS apikey must not be empty"))
            }
            _ => Ok(Arc::new(LiveDnsProvider::from_api(self.api.clone()))),
        }
    }
}

/// Register the LiveDNS provider under [`PROVIDER_TYPE`]
///
/// # Example
///
/// ```rust
/// use zonectl_core::ProviderRegistry;
/// use zonectl_provider_livedns::MemoryLiveDns;
///
/// let registry = ProviderRegistry::new();
/// zonectl_provider_livedns::register(&registry, MemoryLiveDns::new());
/// assert!(registry.has_provider("LIVEDNS"));
/// ```
pub fn register<A>(registry: &ProviderRegistry, api: A)
where
    A: DomainApi + ZoneApi + Clone + 'static,
{
    registry.register_provider(PROVIDER_TYPE, Box::new(LiveDnsFactory::new(api)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonectl_core::models::{RecordConfig, RecordType};

    const ORIGIN: &str = "example.com";

    fn a_set(values: &[&str]) -> RecordInfo {
        RecordInfo {
            name: "www".to_string(),
            rtype: "A".to_string(),
            ttl: 500,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn desired() -> DomainConfig {
        let a = |ip: &str| {
            RecordConfig::new(RecordType::A, "www", ORIGIN)
                .with_target(ip)
                .with_ttl(500)
        };
        let mut dc = DomainConfig::new(ORIGIN, "reg");
        dc.records = vec![a("127.0.0.1"), a("127.1.0.1")];
        dc
    }

    #[tokio::test]
    async fn test_identical_zone_needs_no_correction() {
        let api = MemoryLiveDns::new();
        api.add_domain(ORIGIN, &[], vec![a_set(&["127.0.0.1", "127.1.0.1"])]).await;
        let provider = LiveDnsProvider::from_api(api);

        let corrections = provider.get_domain_corrections(&mut desired()).await.unwrap();
        assert!(corrections.is_empty());
    }

    #[tokio::test]
    async fn test_zone_swap_calls_each_step_once() {
        let api = MemoryLiveDns::new();
        let old_zone = api.add_domain(ORIGIN, &[], vec![a_set(&["127.0.0.1"])]).await;
        let provider = LiveDnsProvider::from_api(api.clone());

        let corrections = provider.get_domain_corrections(&mut desired()).await.unwrap();
        assert_eq!(corrections.len(), 1);
        assert_eq!(
            corrections[0].msg,
            "Setting dns records for example.com:\nA www.example.com 127.0.0.1 500\nA www.example.com 127.1.0.1 500"
        );
        // nothing written yet
        assert_eq!(api.calls().create_zone(), 0);
        assert_eq!(api.active_zone(ORIGIN).await.as_deref(), Some(old_zone.as_str()));

        for c in corrections {
            c.run().await.unwrap();
        }

        let calls = api.calls();
        assert_eq!(calls.zone_info(), 1);
        assert_eq!(calls.create_zone(), 1);
        assert_eq!(calls.create_record(), 1);
        assert_eq!(calls.attach_zone(), 1);

        let new_zone = api.active_zone(ORIGIN).await.unwrap();
        assert_ne!(new_zone, old_zone);
        assert_eq!(api.zone_records(&new_zone).await, vec![a_set(&["127.0.0.1", "127.1.0.1"])]);
        // the old version is untouched
        assert_eq!(api.zone_records(&old_zone).await, vec![a_set(&["127.0.0.1"])]);

        assert!(provider.get_domain_corrections(&mut desired()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_before_attach_keeps_old_zone() {
        let api = MemoryLiveDns::new().failing_record_creation();
        let old_zone = api.add_domain(ORIGIN, &[], vec![a_set(&["127.0.0.1"])]).await;
        let provider = LiveDnsProvider::from_api(api.clone());

        let mut corrections = provider.get_domain_corrections(&mut desired()).await.unwrap();
        let err = corrections.remove(0).run().await.unwrap_err();
        assert!(err.to_string().contains("record creation rejected"));

        assert_eq!(api.calls().attach_zone(), 0);
        assert_eq!(api.active_zone(ORIGIN).await, Some(old_zone));
        assert_eq!(api.zone_count().await, 2);
    }

    #[tokio::test]
    async fn test_ignored_labels_survive_the_swap() {
        let api = MemoryLiveDns::new();
        let manual = RecordInfo {
            name: "manual".to_string(),
            rtype: "TXT".to_string(),
            ttl: 300,
            values: vec!["\"hand made\"".to_string()],
        };
        api.add_domain(ORIGIN, &[], vec![manual.clone()]).await;
        let provider = LiveDnsProvider::from_api(api.clone());

        let mut dc = desired();
        dc.ignored_labels = vec!["manual".to_string()];
        for c in provider.get_domain_corrections(&mut dc).await.unwrap() {
            c.run().await.unwrap();
        }

        let zone = api.active_zone(ORIGIN).await.unwrap();
        let records = api.zone_records(&zone).await;
        assert!(records.contains(&manual));
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_nameservers_come_from_domain_info() {
        let api = MemoryLiveDns::new();
        api.add_domain(ORIGIN, &["ns1.example.net.", "ns2.example.net"], Vec::new()).await;
        let provider = LiveDnsProvider::from_api(api);

        let ns = provider.get_nameservers(ORIGIN).await.unwrap();
        let names: Vec<&str> = ns.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["ns1.example.net", "ns2.example.net"]);
    }

    #[tokio::test]
    async fn test_unknown_domain_is_a_provider_error() {
        let provider = LiveDnsProvider::from_api(MemoryLiveDns::new());
        let err = provider.get_domain_corrections(&mut desired()).await.unwrap_err();
        assert!(err.to_string().contains("unknown domain example.com"));
    }

    #[test]
    fn test_factory_rejects_empty_apikey() {
        let factory = LiveDnsFactory::new(MemoryLiveDns::new());
        let mut settings = ProviderSettings::new();
        assert!(factory.create(&settings, None).is_ok());
        settings.insert("apikey".to_string(), " ".to_string());
        assert!(factory.create(&settings, None).is_err());
    }
}
