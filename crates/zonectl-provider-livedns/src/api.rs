// # Zone-versioning API
//
// The surface a LiveDNS-style service exposes. Domains point at exactly one
// zone version; zone versions are never edited once a domain points at them,
// new content goes into a fresh version which the domain is then repointed
// to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zonectl_core::Result;

/// A domain as seen by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    pub fqdn: String,
    /// Zone version the domain currently serves
    pub zone_id: String,
    #[serde(default)]
    pub nameservers: Vec<String>,
}

/// A zone version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub id: String,
    pub name: String,
}

/// One record set: every value shares label, type and TTL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub ttl: u32,
    pub values: Vec<String>,
}

/// Domain-level calls
#[async_trait]
pub trait DomainApi: Send + Sync {
    async fn domain_info(&self, domain: &str) -> Result<DomainInfo>;

    /// Record sets of the zone the domain currently serves
    async fn list_records(&self, domain: &str) -> Result<Vec<RecordInfo>>;

    /// Point the domain at another zone version
    async fn attach_zone(&self, domain: &str, zone_id: &str) -> Result<()>;
}

/// Zone-version calls
#[async_trait]
pub trait ZoneApi: Send + Sync {
    async fn zone_info(&self, zone_id: &str) -> Result<ZoneInfo>;

    /// Create an empty zone version named after `seed`; returns its id
    async fn create_zone(&self, seed: &ZoneInfo) -> Result<String>;

    async fn create_record(&self, zone_id: &str, record: &RecordInfo) -> Result<()>;
}
