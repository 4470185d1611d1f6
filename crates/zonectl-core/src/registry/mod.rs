//! Plugin-based provider registry
//!
//! The registry maps provider type names (`"MEMORY"`, `"JSONFILE"`, ...) to
//! factories, so adapters living in other crates can be plugged in without
//! touching the orchestrator.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonectl_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! zonectl_core::providers::register_builtin(&registry);
//! zonectl_provider_livedns::register(&registry);
//!
//! let providers = registry.initialize(&dns_config, &provider_configs)?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{ProviderConfigs, is_excluded_from_defaults};
use crate::error::{Error, Result};
use crate::models::DnsConfig;
use crate::traits::{
    DnsProviderFactory, DnsServiceProvider, ProviderSettings, Registrar, RegistrarFactory,
};

/// Live adapter instances for one run, keyed by their configured names
#[derive(Clone, Default)]
pub struct Providers {
    pub registrars: HashMap<String, Arc<dyn Registrar>>,
    pub dns_providers: HashMap<String, Arc<dyn DnsServiceProvider>>,
    /// Providers and registrars that only run when explicitly selected
    pub non_default: HashSet<String>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_registrar(&mut self, name: impl Into<String>, registrar: Arc<dyn Registrar>) {
        self.registrars.insert(name.into(), registrar);
    }

    pub fn add_dns_provider(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn DnsServiceProvider>,
        non_default: bool,
    ) {
        let name = name.into();
        if non_default {
            self.non_default.insert(name.clone());
        }
        self.dns_providers.insert(name, provider);
    }

    pub fn is_non_default(&self, name: &str) -> bool {
        self.non_default.contains(name)
    }
}

/// Provider registry for plugin-based adapter creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,
    registrars: RwLock<HashMap<String, Box<dyn RegistrarFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory under a type name
    pub fn register_provider(&self, kind: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(kind.into(), factory);
    }

    /// Register a registrar factory under a type name
    pub fn register_registrar(&self, kind: impl Into<String>, factory: Box<dyn RegistrarFactory>) {
        let mut registrars = self.registrars.write().unwrap_or_else(PoisonError::into_inner);
        registrars.insert(kind.into(), factory);
    }

    pub fn has_provider(&self, kind: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(kind)
    }

    pub fn has_registrar(&self, kind: &str) -> bool {
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);
        registrars.contains_key(kind)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<String> = providers.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// List all registered registrar types
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<String> = registrars.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Create every registrar and DNS provider declared in `cfg`
    ///
    /// # Errors
    ///
    /// A config error for an unregistered type, or for a type that needs
    /// credentials when `creds` has no entry under the declared name.
    pub fn initialize(&self, cfg: &DnsConfig, creds: &ProviderConfigs) -> Result<Providers> {
        let empty = ProviderSettings::new();
        let mut out = Providers::new();

        {
            let factories = self.registrars.read().unwrap_or_else(PoisonError::into_inner);
            for reg in &cfg.registrars {
                let factory = factories.get(&reg.kind).ok_or_else(|| {
                    Error::config(format!("Unknown registrar type: {}", reg.kind))
                })?;
                let settings = settings_for(&reg.name, factory.requires_settings(), creds, &empty)?;
                out.add_registrar(reg.name.clone(), factory.create(settings)?);
                if is_excluded_from_defaults(settings) {
                    out.non_default.insert(reg.name.clone());
                }
            }
        }

        {
            let factories = self.providers.read().unwrap_or_else(PoisonError::into_inner);
            for prov in &cfg.dns_providers {
                let factory = factories.get(&prov.kind).ok_or_else(|| {
                    Error::config(format!("Unknown provider type: {}", prov.kind))
                })?;
                let settings = settings_for(&prov.name, factory.requires_settings(), creds, &empty)?;
                let provider = factory.create(settings, prov.meta.as_ref())?;
                out.add_dns_provider(prov.name.clone(), provider, is_excluded_from_defaults(settings));
            }
        }

        tracing::info!(
            "Initialized {} registrars and {} dns service providers.",
            out.registrars.len(),
            out.dns_providers.len()
        );
        Ok(out)
    }
}

fn settings_for<'a>(
    name: &str,
    required: bool,
    creds: &'a ProviderConfigs,
    empty: &'a ProviderSettings,
) -> Result<&'a ProviderSettings> {
    match creds.get(name) {
        Some(settings) => Ok(settings),
        None if required => Err(Error::config(format!(
            "No credentials found for {:?}",
            name
        ))),
        None => Ok(empty),
    }
}
