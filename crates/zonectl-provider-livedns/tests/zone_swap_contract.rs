//! Architectural Contract Test: Copy-on-Write Zone Swap
//!
//! Runs a LIVEDNS provider built through the registry under the orchestrator.
//!
//! Constraints verified:
//! - Preview never creates a zone version
//! - A push produces exactly one zone version and repoints the domain once
//! - The pushed zone is converged: the next run reports nothing
//! - A swap that fails before repointing leaves the domain where it was
//!
//! If this test fails, a partially written zone can go live.

use std::io::Write;
use std::sync::{Arc, Mutex};

use zonectl_core::config::{parse_dns_config, parse_provider_configs};
use zonectl_core::engine::{CorrectionStatus, Orchestrator, RunMode};
use zonectl_core::normalize::normalize_and_validate_config;
use zonectl_core::providers::register_builtin;
use zonectl_core::registry::{ProviderRegistry, Providers};
use zonectl_core::{DnsConfig, RunSummary};
use zonectl_provider_livedns::{MemoryLiveDns, RecordInfo};

const CONFIG: &str = r#"{
    "registrars": [{"name": "none", "type": "NONE"}],
    "dns_providers": [{"name": "live", "type": "LIVEDNS"}],
    "domains": [{
        "name": "example.com",
        "registrar": "none",
        "dnsProviders": {"live": 0},
        "records": [
            {"name": "www", "type": "A", "target": "127.0.0.1", "ttl": 500},
            {"name": "www", "type": "A", "target": "127.1.0.1", "ttl": 500},
            {"name": "@", "type": "MX", "target": "mail.example.com.", "mx_preference": 10}
        ]
    }]
}"#;

#[derive(Clone, Default)]
struct Output(Arc<Mutex<Vec<u8>>>);

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn setup(api: &MemoryLiveDns) -> (DnsConfig, Providers) {
    let registry = ProviderRegistry::new();
    register_builtin(&registry);
    zonectl_provider_livedns::register(&registry, api.clone());

    let mut cfg = parse_dns_config(CONFIG).unwrap();
    let errors = normalize_and_validate_config(&mut cfg);
    assert!(errors.is_empty(), "{:?}", errors);

    let creds = parse_provider_configs(r#"{"live": {"apikey": "secret"}}"#).unwrap();
    let providers = registry.initialize(&cfg, &creds).unwrap();
    (cfg, providers)
}

async fn run(mode: RunMode, cfg: &DnsConfig, providers: &Providers) -> RunSummary {
    Orchestrator::new(mode)
        .with_output(Output::default())
        .run(cfg, providers)
        .await
        .unwrap()
}

fn stale_zone() -> Vec<RecordInfo> {
    vec![RecordInfo {
        name: "www".to_string(),
        rtype: "A".to_string(),
        ttl: 500,
        values: vec!["127.0.0.1".to_string()],
    }]
}

#[tokio::test]
async fn push_swaps_zone_once_and_converges() {
    let api = MemoryLiveDns::new();
    let old_zone = api.add_domain("example.com", &[], stale_zone()).await;
    let (cfg, providers) = setup(&api);

    let preview = run(RunMode::Preview, &cfg, &providers).await;
    assert_eq!(preview.total_corrections, 1);
    assert_eq!(api.calls().create_zone(), 0);

    let push = run(RunMode::Push, &cfg, &providers).await;
    assert!(!push.any_errors);
    assert_eq!(push.outcomes[0].status, CorrectionStatus::Applied);
    assert!(push.outcomes[0].msg.starts_with("Setting dns records for example.com:\n"));

    assert_eq!(api.calls().create_zone(), 1);
    assert_eq!(api.calls().attach_zone(), 1);
    // one record set per (label, type)
    assert_eq!(api.calls().create_record(), 2);

    let active = api.active_zone("example.com").await.unwrap();
    assert_ne!(active, old_zone);
    assert_eq!(api.zone_records(&old_zone).await, stale_zone());

    let again = run(RunMode::Push, &cfg, &providers).await;
    assert_eq!(again.total_corrections, 0);
}

#[tokio::test]
async fn failed_swap_keeps_the_old_zone_live() {
    let api = MemoryLiveDns::new().failing_record_creation();
    let old_zone = api.add_domain("example.com", &[], stale_zone()).await;
    let (cfg, providers) = setup(&api);

    let push = run(RunMode::Push, &cfg, &providers).await;
    assert!(push.any_errors);
    assert!(matches!(push.outcomes[0].status, CorrectionStatus::Failed(_)));

    assert_eq!(api.calls().attach_zone(), 0);
    assert_eq!(api.active_zone("example.com").await, Some(old_zone));
}
