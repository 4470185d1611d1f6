// # Provider and Registrar Traits
//
// Defines the interface every adapter implements.
//
// ## Implementations
//
// - `MEMORY`, `JSONFILE` and the `NONE` registrar: `zonectl_core::providers`
// - Copy-on-write zone versioning: `zonectl-provider-livedns` crate
//
// ## Usage
//
// ```rust,ignore
// use zonectl_core::DnsServiceProvider;
//
// let mut dc = domain.clone();
// for correction in provider.get_domain_corrections(&mut dc).await? {
//     println!("{}", correction.msg);
//     correction.run().await?;
// }
// ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Correction, DomainConfig, Nameserver};

/// Settings for one provider instance, as read from the credentials file
pub type ProviderSettings = HashMap<String, String>;

/// Trait for DNS service provider adapters
///
/// # Contract
///
/// `get_domain_corrections` reads the live state of `dc.name` and returns
/// the corrections that converge it to `dc.records`:
///
/// - Identical live and desired state yields an empty list.
/// - Each correction's `msg` describes the complete result of its scope and
///   is computable without running any earlier correction.
/// - Nothing is written until a correction is run.
///
/// The orchestrator hands every provider its own copy of the domain, so an
/// adapter may transform `dc` (combine compound targets, drop unsupported
/// records) freely.
///
/// Adapters must not retry or sleep; a failed read is returned as an error
/// and contained by the orchestrator at the domain level.
#[async_trait]
pub trait DnsServiceProvider: Send + Sync {
    /// Nameservers this provider serves `domain` from
    async fn get_nameservers(&self, domain: &str) -> Result<Vec<Nameserver>>;

    /// Corrections that bring the live zone in line with `dc`
    async fn get_domain_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>>;

    /// Provider type name for logging, e.g. `"MEMORY"`
    fn provider_name(&self) -> &'static str;
}

/// Trait for registrar adapters
///
/// A registrar only owns delegation: its corrections bring the registered
/// nameservers of `dc.name` in line with `dc.nameservers`.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn get_registrar_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>>;

    fn registrar_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a provider from its credentials entry and optional metadata
    fn create(
        &self,
        settings: &ProviderSettings,
        meta: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn DnsServiceProvider>>;

    /// Whether a credentials entry is mandatory for this type
    fn requires_settings(&self) -> bool {
        false
    }
}

/// Helper trait for constructing registrars from configuration
pub trait RegistrarFactory: Send + Sync {
    fn create(&self, settings: &ProviderSettings) -> Result<Arc<dyn Registrar>>;

    fn requires_settings(&self) -> bool {
        false
    }
}
