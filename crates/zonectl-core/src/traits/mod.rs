//! Core traits for zonectl
//!
//! This module defines the seams between the orchestrator and everything it
//! talks to.
//!
//! - [`DnsServiceProvider`] / [`Registrar`]: adapters that compute corrections
//! - [`NameserverResolver`]: decides the delegation of a domain
//! - [`Confirmer`]: answers the interactive "Run?" question

pub mod confirm;
pub mod nameservers;
pub mod provider;

pub use confirm::{AlwaysConfirm, Confirmer, NeverConfirm, ReaderConfirmer, StdinConfirmer};
pub use nameservers::{NameserverResolver, ProviderNameservers, add_ns_records};
pub use provider::{
    DnsProviderFactory, DnsServiceProvider, ProviderSettings, Registrar, RegistrarFactory,
};
