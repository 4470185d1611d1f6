//! Desired configuration: domains, their records, and who serves them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::record::{RecordConfig, RecordType};
use crate::error::{Error, Result};

/// The whole desired configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default)]
    pub registrars: Vec<RegistrarConfig>,
    #[serde(default)]
    pub dns_providers: Vec<DnsProviderConfig>,
    #[serde(default)]
    pub domains: Vec<DomainConfig>,
}

impl DnsConfig {
    /// Find a domain by exact name
    pub fn find_domain(&self, name: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Find a domain by exact name, mutably
    pub fn find_domain_mut(&mut self, name: &str) -> Option<&mut DomainConfig> {
        self.domains.iter_mut().find(|d| d.name == name)
    }
}

/// A registrar declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// A DNS service provider declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsProviderConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// A nameserver assigned to a domain (FQDN, no trailing dot)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nameserver {
    pub name: String,
}

impl Nameserver {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_suffix('.').map(str::to_string).unwrap_or(name);
        Self { name }
    }
}

/// Build nameservers from a list of FQDNs
pub fn strings_to_nameservers<S: AsRef<str>>(names: &[S]) -> Vec<Nameserver> {
    names.iter().map(|n| Nameserver::new(n.as_ref())).collect()
}

/// A DNS provider bound to a domain
///
/// `nameservers` is how many of the provider's nameservers should be
/// delegated to; zero means the provider serves records but takes no part
/// in delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBinding {
    pub name: String,
    pub nameservers: i32,
}

/// One zone and everything that should be true about it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Zone name without trailing dot
    pub name: String,

    pub registrar: String,

    /// Providers in declaration order
    #[serde(default, rename = "dnsProviders", with = "ordered_bindings")]
    pub dns_providers: Vec<ProviderBinding>,

    #[serde(default, rename = "meta", skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    #[serde(default)]
    pub records: Vec<RecordConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<Nameserver>,

    /// Leave live records that are not in `records` alone
    #[serde(default, rename = "keepunknown")]
    pub keep_unknown: bool,

    /// Labels that are never created, modified or deleted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_labels: Vec<String>,
}

impl DomainConfig {
    pub fn new(name: impl Into<String>, registrar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registrar: registrar.into(),
            ..Default::default()
        }
    }

    /// Bind a provider, keeping declaration order
    pub fn with_provider(mut self, name: impl Into<String>, nameservers: i32) -> Self {
        self.dns_providers.push(ProviderBinding {
            name: name.into(),
            nameservers,
        });
        self
    }

    pub fn with_record(mut self, record: RecordConfig) -> Self {
        self.records.push(record);
        self
    }

    /// Whether a record with this type and label exists
    pub fn has_record_type_name(&self, rtype: RecordType, name: &str) -> bool {
        self.records.iter().any(|r| r.rtype == rtype && r.name == name)
    }

    /// Keep only the records matching `f`
    pub fn filter<F>(&mut self, f: F)
    where
        F: FnMut(&RecordConfig) -> bool,
    {
        let mut f = f;
        self.records.retain(|r| f(r));
    }

    /// Fail on a trailing dot or any record whose name and FQDN disagree
    pub fn check_integrity(&self) -> Result<()> {
        if self.name.ends_with('.') {
            return Err(Error::integrity(format!("domain name {} ends with dot", self.name)));
        }
        for rc in &self.records {
            rc.check_name_fqdn(&self.name)
                .map_err(|e| Error::integrity(format!("domain {}: {}", self.name, e)))?;
        }
        Ok(())
    }

    /// Convert labels, FQDNs and hostname targets to their ASCII form
    pub fn punycode(&mut self) -> Result<()> {
        for rc in &mut self.records {
            rc.name = to_ascii(&rc.name)?;
            rc.name_fqdn = to_ascii(&rc.name_fqdn)?;
            if rc.rtype.policy().punycode_target {
                rc.target = to_ascii(&rc.target)?;
            }
        }
        Ok(())
    }

    /// Convert labels, FQDNs and hostname targets to their Unicode form
    pub fn to_unicode(&mut self) -> Result<()> {
        for rc in &mut self.records {
            rc.name = to_unicode(&rc.name)?;
            rc.name_fqdn = to_unicode(&rc.name_fqdn)?;
            if rc.rtype.policy().punycode_target {
                rc.target = to_unicode(&rc.target)?;
            }
        }
        Ok(())
    }

    fn combine_type(&mut self, rtype: RecordType) -> Result<()> {
        for rc in self.records.iter_mut().filter(|r| r.rtype == rtype) {
            rc.merge_to_target()?;
            trace!("combined {} {} -> {}", rtype, rc.name, rc.target);
        }
        Ok(())
    }

    /// Merge preferences into the target of every MX record
    pub fn combine_mxs(&mut self) -> Result<()> {
        self.combine_type(RecordType::Mx)
    }

    /// Merge priority, weight and port into the target of every SRV record
    pub fn combine_srvs(&mut self) -> Result<()> {
        self.combine_type(RecordType::Srv)
    }

    /// Merge flag and tag into the target of every CAA record
    pub fn combine_caas(&mut self) -> Result<()> {
        self.combine_type(RecordType::Caa)
    }

    /// Merge the fields of every compound record
    pub fn combine_all(&mut self) -> Result<()> {
        for rc in self.records.iter_mut().filter(|r| r.rtype.is_compound()) {
            rc.merge_to_target()?;
        }
        Ok(())
    }

    /// Split every combined record back into structured fields
    pub fn split_all(&mut self) -> Result<()> {
        for rc in self.records.iter_mut().filter(|r| r.combined_target) {
            rc.split_target()?;
        }
        Ok(())
    }
}

// Labels like `@`, `*` and `_sip._tcp` are not valid IDNA input; only
// labels that need conversion are passed through the codec.
pub(crate) fn to_ascii(name: &str) -> Result<String> {
    if name.is_ascii() {
        return Ok(name.to_string());
    }
    idna::domain_to_ascii(name)
        .map_err(|e| Error::validation(format!("cannot convert {:?} to punycode: {:?}", name, e)))
}

fn to_unicode(name: &str) -> Result<String> {
    if !name
        .split('.')
        .any(|l| l.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("xn--")))
    {
        return Ok(name.to_string());
    }
    let (converted, result) = idna::domain_to_unicode(name);
    result.map_err(|e| Error::validation(format!("cannot decode punycode {:?}: {:?}", name, e)))?;
    Ok(converted)
}

/// Serializes `Vec<ProviderBinding>` as a JSON object, keeping key order
mod ordered_bindings {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::ProviderBinding;

    pub fn serialize<S: Serializer>(bindings: &[ProviderBinding], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(bindings.len()))?;
        for b in bindings {
            map.serialize_entry(&b.name, &b.nameservers)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ProviderBinding>, D::Error> {
        struct BindingVisitor;

        impl<'de> Visitor<'de> for BindingVisitor {
            type Value = Vec<ProviderBinding>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of provider name to nameserver count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut bindings = Vec::new();
                while let Some((name, nameservers)) = access.next_entry::<String, i32>()? {
                    bindings.push(ProviderBinding { name, nameservers });
                }
                Ok(bindings)
            }
        }

        d.deserialize_map(BindingVisitor)
    }
}
