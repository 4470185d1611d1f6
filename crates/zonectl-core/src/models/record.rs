//! The record model: one resource record that should exist in a zone.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::names::{add_origin, trim_origin};
use crate::error::{Error, Result};

/// TTL applied to any record without an explicit one
pub const DEFAULT_TTL: u32 = 300;

/// Record types understood by zonectl
///
/// Pseudo types (`URL`, `CF_REDIRECT`, `R53_ALIAS`, ...) are not real RR
/// types; they are provider extensions that still flow through the same
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
    #[serde(rename = "ALIAS")]
    Alias,
    #[serde(rename = "ANAME")]
    Aname,
    #[serde(rename = "CAA")]
    Caa,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "MX")]
    Mx,
    #[serde(rename = "NS")]
    Ns,
    #[serde(rename = "PTR")]
    Ptr,
    #[serde(rename = "SOA")]
    Soa,
    #[serde(rename = "SRV")]
    Srv,
    #[serde(rename = "TLSA")]
    Tlsa,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "URL")]
    Url,
    #[serde(rename = "URL301")]
    Url301,
    #[serde(rename = "FRAME")]
    Frame,
    #[serde(rename = "IMPORT_TRANSFORM")]
    ImportTransform,
    #[serde(rename = "CF_REDIRECT")]
    CfRedirect,
    #[serde(rename = "CF_TEMP_REDIRECT")]
    CfTempRedirect,
    #[serde(rename = "R53_ALIAS")]
    R53Alias,
}

/// Which structured fields a type carries next to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compound {
    /// Target is the whole value
    None,
    /// Preference + exchange host
    Mx,
    /// Priority, weight, port + target host
    Srv,
    /// Flag, tag + value
    Caa,
    /// Usage, selector, matching type + certificate data
    Tlsa,
}

/// Per-type behavior consulted by every transform that switches on type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypePolicy {
    /// Target is case-insensitive and folded to lowercase
    pub fold_target: bool,
    /// Target is a hostname and goes through IDNA conversion
    pub punycode_target: bool,
    /// Structured fields merged into the target by the codec
    pub compound: Compound,
    /// Not a wire RR type; content is the bare target
    pub pseudo: bool,
}

impl RecordType {
    /// Every supported type, in declaration order
    pub const ALL: [RecordType; 20] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Alias,
        RecordType::Aname,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Ptr,
        RecordType::Soa,
        RecordType::Srv,
        RecordType::Tlsa,
        RecordType::Txt,
        RecordType::Url,
        RecordType::Url301,
        RecordType::Frame,
        RecordType::ImportTransform,
        RecordType::CfRedirect,
        RecordType::CfTempRedirect,
        RecordType::R53Alias,
    ];

    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Alias => "ALIAS",
            RecordType::Aname => "ANAME",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
            RecordType::Tlsa => "TLSA",
            RecordType::Txt => "TXT",
            RecordType::Url => "URL",
            RecordType::Url301 => "URL301",
            RecordType::Frame => "FRAME",
            RecordType::ImportTransform => "IMPORT_TRANSFORM",
            RecordType::CfRedirect => "CF_REDIRECT",
            RecordType::CfTempRedirect => "CF_TEMP_REDIRECT",
            RecordType::R53Alias => "R53_ALIAS",
        }
    }

    /// The behavior table entry for this type
    pub fn policy(&self) -> TypePolicy {
        use Compound as C;
        let (fold_target, punycode_target, compound, pseudo) = match self {
            RecordType::A => (false, false, C::None, false),
            RecordType::Aaaa => (false, false, C::None, false),
            RecordType::Alias => (false, true, C::None, true),
            RecordType::Aname => (true, true, C::None, true),
            RecordType::Caa => (false, false, C::Caa, false),
            RecordType::Cname => (true, true, C::None, false),
            RecordType::Mx => (true, true, C::Mx, false),
            RecordType::Ns => (true, true, C::None, false),
            RecordType::Ptr => (true, true, C::None, false),
            RecordType::Soa => (false, false, C::None, false),
            RecordType::Srv => (false, true, C::Srv, false),
            RecordType::Tlsa => (false, false, C::Tlsa, false),
            RecordType::Txt => (false, false, C::None, false),
            RecordType::Url => (false, true, C::None, true),
            RecordType::Url301 => (false, true, C::None, true),
            RecordType::Frame => (false, true, C::None, true),
            RecordType::ImportTransform => (false, false, C::None, true),
            RecordType::CfRedirect => (false, false, C::None, true),
            RecordType::CfTempRedirect => (false, false, C::None, true),
            RecordType::R53Alias => (false, true, C::None, true),
        };
        TypePolicy {
            fold_target,
            punycode_target,
            compound,
            pseudo,
        }
    }

    /// Whether this type keeps structured fields next to its target
    pub fn is_compound(&self) -> bool {
        self.policy().compound != Compound::None
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| Error::validation(format!("unsupported record type {:?}", s)))
    }
}

/// Reconciliation identity of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub name: String,
    pub rtype: RecordType,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rtype, self.name)
    }
}

/// One record that should be present in a zone
///
/// Compound types keep their extra fields (`mx_preference`, `srv_*`,
/// `caa_*`, `tlsa_*`) next to a host-only `target` until
/// [`RecordConfig::merge_to_target`] folds them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Relative label, `@` for the apex
    pub name: String,

    /// Absolute name without trailing dot
    #[serde(default, rename = "name_fqdn")]
    pub name_fqdn: String,

    #[serde(rename = "type")]
    pub rtype: RecordType,

    /// Zero means "not specified" until normalization applies the default
    #[serde(default)]
    pub ttl: u32,

    /// Numeric JSON values are read as packed IPv4 addresses
    #[serde(default, deserialize_with = "deserialize_target")]
    pub target: String,

    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub mx_preference: u16,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub srv_priority: u16,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub srv_weight: u16,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub srv_port: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub caa_tag: String,
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub caa_flag: u8,
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub tlsa_usage: u8,
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub tlsa_selector: u8,
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub tlsa_matching_type: u8,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txt_segments: Vec<String>,

    /// Set once the structured fields live inside `target`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub combined_target: bool,

    #[serde(default, rename = "meta", skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    /// Provider-native form this record was read from (debugging only)
    #[serde(skip)]
    pub original: Option<serde_json::Value>,
}

/// Convert a configuration value into an IP address
///
/// Accepts a dotted/colon string or a number holding a big-endian IPv4
/// address.
pub fn interface_to_ip(value: &serde_json::Value) -> Result<IpAddr> {
    match value {
        serde_json::Value::String(s) => s
            .parse::<IpAddr>()
            .map_err(|_| Error::validation(format!("{:?} is not an IP address", s))),
        serde_json::Value::Number(n) => {
            let packed = n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Error::validation(format!("{} is not a packed IPv4 address", n)))?;
            Ok(IpAddr::V4(Ipv4Addr::from(packed)))
        }
        other => Err(Error::validation(format!("cannot convert {} to an IP address", other))),
    }
}

fn deserialize_target<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        other @ serde_json::Value::Number(_) => interface_to_ip(&other)
            .map(|ip| ip.to_string())
            .map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("invalid target {}", other))),
    }
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

fn is_zero_u8(v: &u8) -> bool {
    *v == 0
}

impl RecordConfig {
    /// Create a record of `rtype` named `name` inside `origin`
    pub fn new(rtype: RecordType, name: impl Into<String>, origin: &str) -> Self {
        let name = name.into();
        let name_fqdn = add_origin(&name, origin);
        Self {
            name,
            name_fqdn,
            rtype,
            ttl: DEFAULT_TTL,
            target: String::new(),
            mx_preference: 0,
            srv_priority: 0,
            srv_weight: 0,
            srv_port: 0,
            caa_tag: String::new(),
            caa_flag: 0,
            tlsa_usage: 0,
            tlsa_selector: 0,
            tlsa_matching_type: 0,
            txt_segments: Vec::new(),
            combined_target: false,
            metadata: BTreeMap::new(),
            original: None,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the plain target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Attach a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Identity of this record for reconciliation
    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            rtype: self.rtype,
        }
    }

    /// Set the label and recompute the FQDN for `origin`
    pub fn set_label(&mut self, name: impl Into<String>, origin: &str) {
        self.name = name.into();
        self.name_fqdn = add_origin(&self.name, origin);
    }

    /// Set the FQDN and recompute the label for `origin`
    pub fn set_label_from_fqdn(&mut self, fqdn: impl Into<String>, origin: &str) {
        self.name_fqdn = fqdn.into();
        self.name = trim_origin(&self.name_fqdn, origin);
    }

    /// Verify the name/FQDN pair agrees with `origin` in both directions
    pub fn check_name_fqdn(&self, origin: &str) -> Result<()> {
        let expected_short = trim_origin(&self.name_fqdn, origin);
        if self.name != expected_short {
            return Err(Error::integrity(format!(
                "name/fqdn mismatch: short=({}) but ({})-({})->({})",
                self.name, self.name_fqdn, origin, expected_short
            )));
        }
        let expected_fqdn = add_origin(&self.name, origin);
        if self.name_fqdn != expected_fqdn {
            return Err(Error::integrity(format!(
                "name/fqdn mismatch: fqdn=({}) but ({})+({})->({})",
                self.name_fqdn, self.name, origin, expected_fqdn
            )));
        }
        Ok(())
    }
}
