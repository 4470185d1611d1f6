//! Minimal embedding example for zonectl-core
//!
//! This example demonstrates using zonectl-core as a library in a custom
//! application: the desired state is built in code, the "registrar" is
//! application state, and the DNS provider is the in-process LiveDNS
//! backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use zonectl_core::models::{
    Correction, DnsProviderConfig, DomainConfig, RecordConfig, RecordType, RegistrarConfig,
};
use zonectl_core::traits::Registrar;
use zonectl_core::{
    DnsConfig, Orchestrator, Providers, Result, RunMode, normalize_and_validate_config,
};
use zonectl_provider_livedns::{LiveDnsProvider, MemoryLiveDns, RecordInfo};

/// Registrar whose delegations live in the application
#[derive(Clone, Default)]
struct EmbeddedRegistrar {
    delegations: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

#[async_trait::async_trait]
impl Registrar for EmbeddedRegistrar {
    async fn get_registrar_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        let desired: Vec<String> = dc.nameservers.iter().map(|ns| ns.name.clone()).collect();
        let current = self
            .delegations
            .lock()
            .map(|d| d.get(&dc.name).cloned().unwrap_or_default())
            .unwrap_or_default();
        if current == desired {
            return Ok(Vec::new());
        }

        let delegations = self.delegations.clone();
        let domain = dc.name.clone();
        let msg = format!("[Embedded] Delegate {} to {}", domain, desired.join(", "));
        Ok(vec![Correction::new(msg, move || async move {
            if let Ok(mut d) = delegations.lock() {
                d.insert(domain, desired);
            }
            Ok(())
        })])
    }

    fn registrar_name(&self) -> &'static str {
        "EMBEDDED"
    }
}

fn desired_state() -> Result<DnsConfig> {
    let origin = "example.com";
    let mut mx = RecordConfig::new(RecordType::Mx, "@", origin);
    mx.set_target_mx(10, "mail.example.com.")?;

    let domain = DomainConfig::new(origin, "app")
        .with_provider("live", 2)
        .with_record(RecordConfig::new(RecordType::A, "@", origin).with_target("192.0.2.1"))
        .with_record(RecordConfig::new(RecordType::A, "www", origin).with_target("192.0.2.1"))
        .with_record(mx);

    Ok(DnsConfig {
        registrars: vec![RegistrarConfig {
            name: "app".to_string(),
            kind: "EMBEDDED".to_string(),
            meta: None,
        }],
        dns_providers: vec![DnsProviderConfig {
            name: "live".to_string(),
            kind: "LIVEDNS".to_string(),
            meta: None,
        }],
        domains: vec![domain],
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).init();

    println!("=== Embedded zonectl-core Example ===\n");

    // Live state: one stale record served from the first zone version
    let api = MemoryLiveDns::new();
    api.add_domain(
        "example.com",
        &["ns1.livedns.example", "ns2.livedns.example"],
        vec![RecordInfo {
            name: "www".to_string(),
            rtype: "A".to_string(),
            ttl: 300,
            values: vec!["198.51.100.7".to_string()],
        }],
    )
    .await;

    let registrar = EmbeddedRegistrar::default();
    let mut providers = Providers::new();
    providers.add_dns_provider("live", Arc::new(LiveDnsProvider::from_api(api.clone())), false);
    providers.add_registrar("app", Arc::new(registrar.clone()));

    let mut config = desired_state()?;
    let mut errors = normalize_and_validate_config(&mut config);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        return Err(errors.swap_remove(0));
    }

    println!("1. Preview");
    let preview = Orchestrator::new(RunMode::Preview).run(&config, &providers).await?;

    println!("\n2. Push");
    let push = Orchestrator::new(RunMode::Push).run(&config, &providers).await?;

    println!("\n3. Preview again");
    let again = Orchestrator::new(RunMode::Preview).run(&config, &providers).await?;

    println!("\n=== Summary ===");
    println!("previewed: {}", preview.total_corrections);
    println!("pushed:    {} (errors: {})", push.total_corrections, push.any_errors);
    println!("remaining: {}", again.total_corrections);
    println!(
        "zone versions created: {}, domain repointed: {} time(s)",
        api.calls().create_zone(),
        api.calls().attach_zone()
    );

    Ok(())
}
