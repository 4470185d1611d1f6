//! Test doubles and common utilities for orchestration contract tests
//!
//! The doubles count every call so tests can assert on what the
//! orchestrator did, not only on what it printed.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zonectl_core::error::{Error, Result};
use zonectl_core::models::{
    Correction, DnsConfig, DnsProviderConfig, DomainConfig, Nameserver, RecordConfig, RecordType,
    RegistrarConfig, strings_to_nameservers,
};
use zonectl_core::registry::Providers;
use zonectl_core::traits::{Confirmer, DnsServiceProvider, Registrar};

/// Captures operator output
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// How a [`CountingProvider`] answers `get_domain_corrections`
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return this many corrections; the ones listed in `failing` fail
    Corrections { count: usize, failing: Vec<usize> },
    /// Fail with a provider error
    Fail,
    /// Fail with an integrity violation
    Integrity,
}

/// A DnsServiceProvider that tracks calls
#[derive(Clone)]
pub struct CountingProvider {
    name: &'static str,
    behavior: Behavior,
    nameservers: Vec<Nameserver>,
    /// Call counter for get_domain_corrections()
    get_calls: Arc<AtomicUsize>,
    /// Call counter for correction actions
    run_calls: Arc<AtomicUsize>,
    /// Domains passed to get_domain_corrections(), in call order
    seen: Arc<Mutex<Vec<DomainConfig>>>,
}

impl CountingProvider {
    pub fn new(name: &'static str, behavior: Behavior) -> Self {
        Self {
            name,
            behavior,
            nameservers: Vec::new(),
            get_calls: Arc::new(AtomicUsize::new(0)),
            run_calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn corrections(name: &'static str, count: usize) -> Self {
        Self::new(
            name,
            Behavior::Corrections {
                count,
                failing: Vec::new(),
            },
        )
    }

    pub fn with_nameservers(mut self, names: &[&str]) -> Self {
        self.nameservers = strings_to_nameservers(names);
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<DomainConfig> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsServiceProvider for CountingProvider {
    async fn get_nameservers(&self, _domain: &str) -> Result<Vec<Nameserver>> {
        Ok(self.nameservers.clone())
    }

    async fn get_domain_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(dc.clone());
        // Scribble on our copy; other adapters must not see this
        dc.records.clear();
        dc.name = format!("mutated-by-{}", self.name);

        match &self.behavior {
            Behavior::Fail => Err(Error::provider(self.name, "zone unavailable")),
            Behavior::Integrity => Err(Error::integrity("record merged twice")),
            Behavior::Corrections { count, failing } => Ok((0..*count)
                .map(|i| {
                    let runs = self.run_calls.clone();
                    let fails = failing.contains(&i);
                    let name = self.name;
                    Correction::new(format!("{} change {}", self.name, i + 1), move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        if fails {
                            Err(Error::provider(name, "write rejected"))
                        } else {
                            Ok(())
                        }
                    })
                })
                .collect()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "COUNTING"
    }
}

/// A Registrar that tracks calls and returns one correction
#[derive(Clone, Default)]
pub struct CountingRegistrar {
    get_calls: Arc<AtomicUsize>,
    run_calls: Arc<AtomicUsize>,
    nameservers_seen: Arc<Mutex<Vec<Vec<Nameserver>>>>,
}

impl CountingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn nameservers_seen(&self) -> Vec<Vec<Nameserver>> {
        self.nameservers_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Registrar for CountingRegistrar {
    async fn get_registrar_corrections(&self, dc: &mut DomainConfig) -> Result<Vec<Correction>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.nameservers_seen.lock().unwrap().push(dc.nameservers.clone());
        let runs = self.run_calls.clone();
        Ok(vec![Correction::new(
            format!("Delegate {}", dc.name),
            move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )])
    }

    fn registrar_name(&self) -> &'static str {
        "COUNTING"
    }
}

/// A Confirmer answering from a script, then "no"
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    asked: Arc<AtomicUsize>,
}

impl ScriptedConfirmer {
    pub fn new(answers: &[bool]) -> (Self, Arc<AtomicUsize>) {
        let asked = Arc::new(AtomicUsize::new(0));
        let confirmer = Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: asked.clone(),
        };
        (confirmer, asked)
    }
}

#[async_trait::async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// A normalized-looking domain with one A record and `no_ns` set
pub fn domain(name: &str, registrar: &str, providers: &[&str]) -> DomainConfig {
    let mut dc = DomainConfig::new(name, registrar)
        .with_record(RecordConfig::new(RecordType::A, "www", name).with_target("192.0.2.1"));
    for p in providers {
        dc = dc.with_provider(*p, 0);
    }
    dc.metadata.insert("no_ns".to_string(), "true".to_string());
    dc
}

/// Config declaring every registrar and provider the domains use
pub fn config(domains: Vec<DomainConfig>) -> DnsConfig {
    let mut registrars: Vec<String> = domains.iter().map(|d| d.registrar.clone()).collect();
    registrars.sort();
    registrars.dedup();
    let mut providers: Vec<String> = domains
        .iter()
        .flat_map(|d| d.dns_providers.iter().map(|b| b.name.clone()))
        .collect();
    providers.sort();
    providers.dedup();

    DnsConfig {
        registrars: registrars
            .into_iter()
            .map(|name| RegistrarConfig {
                name,
                kind: "COUNTING".to_string(),
                meta: None,
            })
            .collect(),
        dns_providers: providers
            .into_iter()
            .map(|name| DnsProviderConfig {
                name,
                kind: "COUNTING".to_string(),
                meta: None,
            })
            .collect(),
        domains,
    }
}
