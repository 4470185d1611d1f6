//! Configuration loading for zonectl
//!
//! Two JSON documents drive a run:
//!
//! - the DNS configuration ([`DnsConfig`]): registrars, providers, domains
//! - the credentials file ([`ProviderConfigs`]): one string map per
//!   provider or registrar name
//!
//! ```json
//! {
//!   "cloud": { "directory": "/var/lib/zonectl" },
//!   "slow":  { "exclude_from_defaults": "true" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use tokio::fs;

use crate::error::{Error, Result};
use crate::models::DnsConfig;
use crate::traits::ProviderSettings;

/// Credentials keyed by provider or registrar name
pub type ProviderConfigs = HashMap<String, ProviderSettings>;

/// Setting that makes a provider opt-in
pub const EXCLUDE_FROM_DEFAULTS: &str = "exclude_from_defaults";

const LEGACY_EXCLUDE_FROM_DEFAULTS: &str = "_exclude_from_defaults";

/// Parse a DNS configuration document
pub fn parse_dns_config(json: &str) -> Result<DnsConfig> {
    serde_json::from_str(json).map_err(|e| Error::config(format!("invalid DNS configuration: {}", e)))
}

/// Load the DNS configuration from a JSON file
pub async fn load_dns_config<P: AsRef<Path>>(path: P) -> Result<DnsConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Failed to read DNS configuration {}: {}", path.display(), e))
    })?;
    let config = parse_dns_config(&content)?;
    tracing::debug!(
        "Loaded {} domains from {}",
        config.domains.len(),
        path.display()
    );
    Ok(config)
}

/// Parse a credentials document
pub fn parse_provider_configs(json: &str) -> Result<ProviderConfigs> {
    serde_json::from_str(json).map_err(|e| Error::config(format!("invalid credentials file: {}", e)))
}

/// Load provider credentials; a missing file means no credentials
pub async fn load_provider_configs<P: AsRef<Path>>(path: P) -> Result<ProviderConfigs> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("Credentials file does not exist: {}", path.display());
        return Ok(ProviderConfigs::new());
    }
    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Failed to read credentials {}: {}", path.display(), e))
    })?;
    parse_provider_configs(&content)
}

/// Whether a provider's settings mark it as opt-in
pub fn is_excluded_from_defaults(settings: &ProviderSettings) -> bool {
    [EXCLUDE_FROM_DEFAULTS, LEGACY_EXCLUDE_FROM_DEFAULTS]
        .iter()
        .any(|key| settings.get(*key).is_some_and(|v| v == "true"))
}
