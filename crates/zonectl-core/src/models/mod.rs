//! Data model shared by the normalizer, the diff and every adapter
//!
//! - [`RecordConfig`]: one desired or live record
//! - [`DomainConfig`]: a zone with its bindings and records
//! - [`Correction`]: a described, deferred change

pub mod correction;
pub mod domain;
pub mod names;
pub mod record;
pub mod target;

pub use correction::{Correction, CorrectionFuture};
pub use domain::{
    DnsConfig, DnsProviderConfig, DomainConfig, Nameserver, ProviderBinding, RegistrarConfig,
    strings_to_nameservers,
};
pub use names::{APEX, add_origin, trim_origin};
pub use record::{
    Compound, DEFAULT_TTL, RecordConfig, RecordKey, RecordType, TypePolicy, interface_to_ip,
};
pub use target::{TargetFields, split_combined};
