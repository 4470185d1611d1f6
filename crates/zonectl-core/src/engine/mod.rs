//! Core reconciliation engine
//!
//! The Orchestrator is responsible for:
//! - Selecting domains and providers through a [`Filter`]
//! - Resolving nameservers and mirroring them as apex NS records
//! - Asking every provider, then the registrar, for corrections
//! - Printing corrections and, in push mode, running them
//!
//! ## Flow
//!
//! ```text
//!                    ┌──────────────┐
//!   DnsConfig ──────▶│ Orchestrator │──────▶ RunSummary
//!                    └──────────────┘
//!                           │  per domain, in order
//!         ┌─────────────────┼─────────────────┐
//!         ▼                 ▼                 ▼
//! ┌──────────────┐  ┌───────────────┐  ┌─────────────┐
//! │ Nameserver   │  │ DNS providers │  │  Registrar  │
//! │ resolution   │  │ (declared     │  │  (after all │
//! │              │  │  order)       │  │  providers) │
//! └──────────────┘  └───────────────┘  └─────────────┘
//! ```
//!
//! ## Failure containment
//!
//! A provider that fails to produce corrections marks the run as errored and
//! abandons the rest of that domain (remaining providers and the registrar);
//! other domains still run. A correction that fails to apply is reported and
//! the next correction runs. An integrity violation anywhere ends the run.

use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::filter::{Filter, SelectionFilter};
use crate::models::{Correction, DnsConfig, DomainConfig};
use crate::registry::Providers;
use crate::traits::{
    Confirmer, NameserverResolver, ProviderNameservers, StdinConfirmer, add_ns_records,
};

/// Whether corrections are only listed or also executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Preview,
    Push,
}

/// What happened to one correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionStatus {
    /// Listed only (preview mode)
    Previewed,
    Applied,
    /// The operator declined it
    Skipped,
    Failed(String),
}

/// A correction as seen by the run, after the fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub domain: String,
    /// Provider or registrar name that produced the correction
    pub source: String,
    pub msg: String,
    pub status: CorrectionStatus,
}

/// Result of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_corrections: usize,
    pub any_errors: bool,
    pub outcomes: Vec<CorrectionOutcome>,
}

impl RunSummary {
    /// Outcomes of one domain, in the order they happened
    pub fn for_domain<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a CorrectionOutcome> {
        self.outcomes.iter().filter(move |o| o.domain == domain)
    }
}

/// Sequences preview, push and interactive push across domains
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = Orchestrator::new(RunMode::Preview)
///     .with_filter(SelectionFilter::from_lists("example.com", ""));
/// let summary = orchestrator.run(&config, &providers).await?;
/// println!("{} corrections", summary.total_corrections);
/// ```
pub struct Orchestrator {
    mode: RunMode,
    interactive: bool,
    filter: Box<dyn Filter>,
    resolver: Box<dyn NameserverResolver>,
    confirmer: Box<dyn Confirmer>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Orchestrator {
    /// Create an orchestrator printing to stdout and selecting every
    /// default provider
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            interactive: false,
            filter: Box::new(SelectionFilter::new()),
            resolver: Box::new(ProviderNameservers),
            confirmer: Box::new(StdinConfirmer::stdin()),
            out: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Ask before running each correction (push mode only)
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_resolver(mut self, resolver: impl NameserverResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_confirmer(mut self, confirmer: impl Confirmer + 'static) -> Self {
        self.confirmer = Box::new(confirmer);
        self
    }

    /// Send operator output somewhere other than stdout
    pub fn with_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Mutex::new(Box::new(out));
        self
    }

    fn write_out(&self, args: fmt::Arguments<'_>, newline: bool) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let res = if newline {
            writeln!(out, "{}", args)
        } else {
            write!(out, "{}", args).and_then(|_| out.flush())
        };
        if let Err(e) = res {
            warn!("Failed to write output: {}", e);
        }
    }

    fn say(&self, args: fmt::Arguments<'_>) {
        self.write_out(args, true);
    }

    /// Run every selected domain of `cfg` against `providers`
    ///
    /// `cfg` is expected to be normalized already.
    ///
    /// # Errors
    ///
    /// Only run-fatal errors are returned: integrity violations and
    /// nameserver resolution failures. Provider failures are contained and
    /// reported through [`RunSummary::any_errors`].
    pub async fn run(&self, cfg: &DnsConfig, providers: &Providers) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for domain in &cfg.domains {
            if !self.filter.should_run_domain(&domain.name) {
                debug!("Domain {} not selected, skipping", domain.name);
                continue;
            }
            self.say(format_args!("******************** Domain: {}", domain.name));
            self.run_domain(domain, providers, &mut summary).await?;
        }

        info!(
            "Run finished: {} corrections, errors: {}",
            summary.total_corrections, summary.any_errors
        );
        self.say(format_args!("Done. {} corrections.", summary.total_corrections));
        Ok(summary)
    }

    async fn run_domain(
        &self,
        domain: &DomainConfig,
        providers: &Providers,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut dc = domain.clone();
        dc.nameservers = self.resolver.resolve(&dc, providers).await?;
        add_ns_records(&mut dc);

        for binding in &dc.dns_providers {
            let name = binding.name.as_str();
            let non_default = providers.is_non_default(name);
            if !self.filter.should_run_provider(name, &dc.name, non_default) {
                self.say(format_args!("----- DNS Provider: {}... (skipping)", name));
                continue;
            }
            self.write_out(format_args!("----- DNS Provider: {}... ", name), false);

            let result = match providers.dns_providers.get(name) {
                Some(provider) => {
                    let mut copy = dc.clone();
                    provider.get_domain_corrections(&mut copy).await
                }
                None => Err(Error::config(format!("DNS provider {} is not initialized", name))),
            };

            let corrections = match result {
                Ok(corrections) => corrections,
                Err(e) if e.is_integrity() => return Err(e),
                Err(e) => {
                    self.say(format_args!("ERROR"));
                    self.say(format_args!("Error getting corrections: {}", e));
                    error!("Provider {} failed for {}: {}", name, dc.name, e);
                    summary.any_errors = true;
                    return Ok(());
                }
            };

            let n = corrections.len();
            self.say(format_args!("{} correction{}", n, if n == 1 { "" } else { "s" }));
            summary.total_corrections += n;
            self.print_or_run(&dc.name, name, corrections, summary).await?;
        }

        let non_default = providers.is_non_default(&dc.registrar);
        if !self.filter.should_run_provider(&dc.registrar, &dc.name, non_default) {
            debug!("Registrar {} not selected for {}", dc.registrar, dc.name);
            return Ok(());
        }
        self.say(format_args!("----- Registrar: {}", dc.registrar));
        if dc.nameservers.is_empty() && dc.metadata.get("no_ns").map(String::as_str) != Some("true") {
            self.say(format_args!(
                "No nameservers declared; skipping registrar. Add {{no_ns:'true'}} to force."
            ));
            return Ok(());
        }

        let result = match providers.registrars.get(&dc.registrar) {
            Some(registrar) => {
                let mut copy = dc.clone();
                registrar.get_registrar_corrections(&mut copy).await
            }
            None => Err(Error::config(format!("Registrar {} is not initialized", dc.registrar))),
        };

        match result {
            Ok(corrections) => {
                summary.total_corrections += corrections.len();
                self.print_or_run(&dc.name, &dc.registrar, corrections, summary).await
            }
            Err(e) if e.is_integrity() => Err(e),
            Err(e) => {
                self.say(format_args!("Error getting corrections: {}", e));
                error!("Registrar {} failed for {}: {}", dc.registrar, dc.name, e);
                summary.any_errors = true;
                Ok(())
            }
        }
    }

    async fn print_or_run(
        &self,
        domain: &str,
        source: &str,
        corrections: Vec<Correction>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for (i, correction) in corrections.into_iter().enumerate() {
            let msg = correction.msg.clone();
            self.say(format_args!("#{}: {}", i + 1, msg));

            let status = self.execute(correction).await?;
            if matches!(status, CorrectionStatus::Failed(_)) {
                summary.any_errors = true;
            }
            summary.outcomes.push(CorrectionOutcome {
                domain: domain.to_string(),
                source: source.to_string(),
                msg,
                status,
            });
        }
        Ok(())
    }

    async fn execute(&self, correction: Correction) -> Result<CorrectionStatus> {
        if self.mode == RunMode::Preview {
            return Ok(CorrectionStatus::Previewed);
        }

        if self.interactive {
            self.write_out(format_args!("Run? (Y/n): "), false);
            if !self.confirmer.confirm().await {
                self.say(format_args!("Skipping"));
                return Ok(CorrectionStatus::Skipped);
            }
        }

        match correction.run().await {
            Ok(()) => {
                self.say(format_args!("SUCCESS!"));
                Ok(CorrectionStatus::Applied)
            }
            Err(e) if e.is_integrity() => Err(e),
            Err(e) => {
                self.say(format_args!("FAILURE! {}", e));
                error!("Correction failed: {}", e);
                Ok(CorrectionStatus::Failed(e.to_string()))
            }
        }
    }
}
