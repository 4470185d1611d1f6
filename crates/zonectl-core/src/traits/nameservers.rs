// # Nameserver resolution
//
// Decides which nameservers a domain is delegated to before any provider
// computes corrections. The result is stored on the domain and mirrored as
// apex NS records.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{DomainConfig, Nameserver, RecordConfig, RecordType};
use crate::registry::Providers;

/// TTL of injected NS records unless the domain sets `ns_ttl`
pub const DEFAULT_NS_TTL: u32 = 300;

/// Trait for nameserver resolution strategies
#[async_trait]
pub trait NameserverResolver: Send + Sync {
    async fn resolve(&self, dc: &DomainConfig, providers: &Providers) -> Result<Vec<Nameserver>>;
}

/// Configured nameservers plus those reported by delegating providers
///
/// A provider binding with count `n > 0` contributes at most its first `n`
/// nameservers; a count of zero or below contributes none. Bindings to a
/// provider that was never initialized contribute none either.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderNameservers;

#[async_trait]
impl NameserverResolver for ProviderNameservers {
    async fn resolve(&self, dc: &DomainConfig, providers: &Providers) -> Result<Vec<Nameserver>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut result = Vec::new();

        for ns in &dc.nameservers {
            if seen.insert(ns.name.clone()) {
                result.push(ns.clone());
            }
        }

        for binding in dc.dns_providers.iter().filter(|b| b.nameservers > 0) {
            // Reported at the provider step, where the failure stays with this domain
            let Some(provider) = providers.dns_providers.get(&binding.name) else {
                warn!(
                    "{}: DNS provider {} is not initialized, no nameservers from it",
                    dc.name, binding.name
                );
                continue;
            };

            let reported = provider.get_nameservers(&dc.name).await?;
            let take = usize::try_from(binding.nameservers).unwrap_or(usize::MAX);
            debug!(
                "{} reports {} nameservers for {}, using up to {}",
                binding.name,
                reported.len(),
                dc.name,
                take
            );
            for ns in reported.into_iter().take(take) {
                if seen.insert(ns.name.clone()) {
                    result.push(ns);
                }
            }
        }

        Ok(result)
    }
}

/// Add an apex NS record for every nameserver not already present
pub fn add_ns_records(dc: &mut DomainConfig) {
    let ttl = dc
        .metadata
        .get("ns_ttl")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_NS_TTL);

    let mut new_records = Vec::new();
    for ns in &dc.nameservers {
        let target = format!("{}.", ns.name);
        let present = dc
            .records
            .iter()
            .any(|r| r.rtype == RecordType::Ns && r.name == "@" && r.target == target);
        if !present {
            new_records.push(
                RecordConfig::new(RecordType::Ns, "@", &dc.name)
                    .with_target(target)
                    .with_ttl(ttl),
            );
        }
    }
    dc.records.extend(new_records);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::strings_to_nameservers;

    #[tokio::test]
    async fn test_uninitialized_provider_contributes_nothing() {
        let mut dc = DomainConfig::new("example.com", "reg").with_provider("ghost", 1);
        dc.nameservers = strings_to_nameservers(&["ns1.example.net"]);

        let ns = ProviderNameservers.resolve(&dc, &Providers::new()).await.unwrap();
        let names: Vec<&str> = ns.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["ns1.example.net"]);
    }

    #[test]
    fn test_add_ns_records() {
        let mut dc = DomainConfig::new("example.com", "reg");
        dc.nameservers = strings_to_nameservers(&["ns1.example.net", "ns2.example.net"]);
        dc.records.push(RecordConfig::new(RecordType::Ns, "@", "example.com").with_target("ns1.example.net."));
        dc.metadata.insert("ns_ttl".into(), "86400".into());

        add_ns_records(&mut dc);
        let ns: Vec<_> = dc.records.iter().filter(|r| r.rtype == RecordType::Ns).collect();
        assert_eq!(ns.len(), 2);
        assert_eq!(ns[1].target, "ns2.example.net.");
        assert_eq!(ns[1].ttl, 86400);
        assert_eq!(ns[1].name_fqdn, "example.com");
    }
}
