// # JSON File Provider
//
// Serves each zone from `<directory>/<domain>.json`.
//
// ## Writes
//
// - Atomic writes: the new zone is written to a temporary file, then renamed
// - Backup: the previous zone file is kept as `<domain>.backup`
// - Recovery: a zone file that fails to parse is replaced by its backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "domain": "example.com",
//   "updated_at": "2025-01-09T12:00:00Z",
//   "records": [
//     { "name": "www", "name_fqdn": "www.example.com", "type": "A", "ttl": 300, "target": "1.2.3.4" }
//   ]
// }
// ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::diff::Differ;
use crate::error::{Error, Result};
use crate::models::{Correction, DomainConfig, Nameserver, RecordConfig, strings_to_nameservers};
use crate::normalize::post_process_records;
use crate::traits::{DnsProviderFactory, DnsServiceProvider, ProviderSettings};

/// Zone file format version
const ZONE_FILE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ZoneFile {
    version: String,
    domain: String,
    updated_at: DateTime<Utc>,
    records: Vec<RecordConfig>,
}

/// DNS provider backed by one JSON file per zone
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    directory: PathBuf,
    nameservers: Vec<Nameserver>,
}

impl JsonFileProvider {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            nameservers: Vec::new(),
        }
    }

    pub fn with_nameservers(mut self, nameservers: Vec<Nameserver>) -> Self {
        self.nameservers = nameservers;
        self
    }

    /// Path of the zone file for `domain`
    pub fn zone_path(&self, domain: &str) -> PathBuf {
        self.directory.join(format!("{}.json", domain))
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.to_path_buf();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Live records of `domain`, falling back to the backup on corruption
    pub async fn load_zone(&self, domain: &str) -> Result<Vec<RecordConfig>> {
        let path = self.zone_path(domain);
        match Self::read_zone(&path).await {
            Ok(records) => Ok(records),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Zone file {} appears corrupted: {}. Attempting recovery from backup.",
                    path.display(),
                    e
                );
                let backup = Self::backup_path(&path);
                if !backup.exists() {
                    return Err(Error::provider(
                        "JSONFILE",
                        format!("{} is corrupted and has no backup", path.display()),
                    ));
                }
                let records = Self::read_zone(&backup).await?;
                fs::copy(&backup, &path).await?;
                tracing::info!("Recovered {} from backup: {} records", domain, records.len());
                Ok(records)
            }
            Err(e) => Err(e),
        }
    }

    async fn read_zone(path: &Path) -> Result<Vec<RecordConfig>> {
        if !path.exists() {
            tracing::debug!("Zone file does not exist: {}", path.display());
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).await?;
        let zone: ZoneFile = serde_json::from_str(&content)?;
        if zone.version != ZONE_FILE_VERSION {
            tracing::warn!(
                "Zone file version mismatch: expected {}, got {}. Attempting to load anyway.",
                ZONE_FILE_VERSION,
                zone.version
            );
        }
        Ok(zone.records)
    }

    async fn write_zone(path: PathBuf, domain: String, records: Vec<RecordConfig>) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let zone = ZoneFile {
            version: ZONE_FILE_VERSION.to_string(),
            domain,
            updated_at: Utc::now(),
            records,
        };
        let json = serde_json::to_string_pretty(&zone)?;

        let temp_path = Self::temp_path(&path);
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if path.exists() {
            if let Err(e) = fs::copy(&path, Self::backup_path(&path)).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &path).await.map_err(|e| {
            Error::provider(
                "JSONFILE",
                format!(
                    "Failed to rename {} to {}: {}",
                    temp_path.display(),
                    path.display(),
                    e
                ),
            )
        })?;

        tracing::info!("Zone written to file: {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl DnsServiceProvider for JsonFileProvider {
    async fn get_nameservers(&self, _domain: &str) -> Result<Vec<Nameserver>> {
        Ok(self.nameservers.clone())
    }

    async fn get_domain_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        let mut live = self.load_zone(&dc.name).await?;
        post_process_records(&mut live);

        let differ = Differ::new(dc);
        let changeset = differ.diff(&live);
        if changeset.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("{}: {} record groups differ", dc.name, changeset.len());

        let path = self.zone_path(&dc.name);
        let records = differ.resulting_records(&live);
        let lines: Vec<String> = records.iter().map(ToString::to_string).collect();
        let msg = format!("Writing zone file {}:\n{}", path.display(), lines.join("\n"));
        let domain = dc.name.clone();

        Ok(vec![Correction::new(msg, move || {
            Self::write_zone(path, domain, records)
        })])
    }

    fn provider_name(&self) -> &'static str {
        "JSONFILE"
    }
}

/// Builds [`JsonFileProvider`]s from the `directory` setting
pub struct JsonFileProviderFactory;

impl DnsProviderFactory for JsonFileProviderFactory {
    fn create(
        &self,
        settings: &ProviderSettings,
        _meta: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn DnsServiceProvider>> {
        let directory = settings
            .get("directory")
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::config("JSONFILE provider requires a \"directory\" setting"))?;
        let names: Vec<&str> = settings
            .get("nameservers")
            .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Ok(Arc::new(
            JsonFileProvider::new(directory).with_nameservers(strings_to_nameservers(&names)),
        ))
    }

    fn requires_settings(&self) -> bool {
        true
    }
}
