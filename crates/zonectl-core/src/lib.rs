// # zonectl-core
//
// Core library for declarative DNS reconciliation.
//
// ## Architecture Overview
//
// A desired configuration is normalized, compared against the live state of
// every provider, and turned into corrections that are previewed or applied:
//
// - **models**: records, the target codec, domains and corrections
// - **normalize**: validation and canonical form of the desired state
// - **diff**: the record-group comparison shared by adapters
// - **DnsServiceProvider** / **Registrar**: adapter traits
// - **ProviderRegistry**: plugin-based registry for adapters
// - **Orchestrator**: sequences domains, providers and registrars
//
// ## Design Principles
//
// 1. **Library-First**: the binary is a thin runner over this crate
// 2. **Plugin-Based**: adapters are registered by type name, no if-else chains
// 3. **Deferred effects**: computing corrections never writes anything
// 4. **Contained failures**: one broken provider does not stop other domains

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{ProviderConfigs, load_dns_config, load_provider_configs};
pub use engine::{CorrectionOutcome, CorrectionStatus, Orchestrator, RunMode, RunSummary};
pub use error::{Error, ErrorCategory, Result};
pub use filter::{Filter, SelectionFilter};
pub use models::{Correction, DnsConfig, DomainConfig, RecordConfig, RecordType};
pub use normalize::normalize_and_validate_config;
pub use registry::{ProviderRegistry, Providers};
pub use traits::{Confirmer, DnsServiceProvider, NameserverResolver, Registrar};
