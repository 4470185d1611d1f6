//! Normalization and validation of the desired configuration
//!
//! [`normalize_and_validate_config`] is the single entry point run before any
//! provider is contacted. It collects every validation problem instead of
//! stopping at the first one, and leaves the input untouched unless the whole
//! configuration is valid.

pub mod transform;

use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::debug;

use crate::error::Error;
use crate::models::domain::to_ascii;
use crate::models::{DEFAULT_TTL, DnsConfig, DomainConfig, RecordConfig, RecordType, add_origin};

pub use transform::{downcase, fix_txt, post_process_records};

const CAA_TAGS: [&str; 3] = ["issue", "issuewild", "iodef"];

/// Normalize `config` in place and return every validation error found
///
/// On any error `config` is left exactly as it was passed in.
pub fn normalize_and_validate_config(config: &mut DnsConfig) -> Vec<Error> {
    let mut working = config.clone();
    let mut errors = Vec::new();

    let registrars: HashSet<&str> = config.registrars.iter().map(|r| r.name.as_str()).collect();
    let providers: HashSet<&str> = config.dns_providers.iter().map(|p| p.name.as_str()).collect();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for dc in &mut working.domains {
        if let Err(e) = normalize_domain_name(dc) {
            errors.push(e);
            continue;
        }

        let count = seen.entry(dc.name.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            errors.push(Error::validation(format!("domain {} is declared more than once", dc.name)));
        }

        if !registrars.contains(dc.registrar.as_str()) {
            errors.push(Error::validation(format!(
                "domain {} uses undefined registrar {:?}",
                dc.name, dc.registrar
            )));
        }
        for binding in &dc.dns_providers {
            if !providers.contains(binding.name.as_str()) {
                errors.push(Error::validation(format!(
                    "domain {} uses undefined DNS provider {:?}",
                    dc.name, binding.name
                )));
            }
        }

        errors.extend(normalize_records(dc));
        if let Err(e) = dc.punycode() {
            errors.push(e);
        }
        errors.extend(check_cnames(dc));

        downcase(&mut dc.records);
        fix_txt(&mut dc.records);

        if let Err(e) = dc.check_integrity() {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        debug!("configuration valid: {} domains", working.domains.len());
        *config = working;
    }
    errors
}

fn normalize_domain_name(dc: &mut DomainConfig) -> Result<(), Error> {
    if dc.name.is_empty() {
        return Err(Error::validation("domain with empty name"));
    }
    if dc.name.ends_with('.') {
        return Err(Error::validation(format!(
            "domain name {} must not end with a dot",
            dc.name
        )));
    }
    dc.name = to_ascii(&dc.name.to_lowercase())?;
    Ok(())
}

fn normalize_records(dc: &mut DomainConfig) -> Vec<Error> {
    let mut errors = Vec::new();
    let origin = dc.name.clone();

    for rc in &mut dc.records {
        if rc.ttl == 0 {
            rc.ttl = DEFAULT_TTL;
        }
        if rc.name.is_empty() {
            rc.name = "@".to_string();
        }
        if rc.name.ends_with('.') {
            errors.push(Error::validation(format!(
                "{} record {:?} in {}: label must be relative, not fully qualified",
                rc.rtype, rc.name, origin
            )));
            continue;
        }
        rc.name = rc.name.to_lowercase();
        rc.name_fqdn = add_origin(&rc.name, &origin);

        if let Err(e) = check_target(rc) {
            errors.push(Error::validation(format!("{} in {}: {}", rc.name_fqdn, origin, e)));
        }
    }
    errors
}

fn check_target(rc: &RecordConfig) -> Result<(), String> {
    match rc.rtype {
        RecordType::A => rc
            .target
            .parse::<Ipv4Addr>()
            .map(|_| ())
            .map_err(|_| format!("A target {:?} is not an IPv4 address", rc.target)),
        RecordType::Aaaa => rc
            .target
            .parse::<Ipv6Addr>()
            .map(|_| ())
            .map_err(|_| format!("AAAA target {:?} is not an IPv6 address", rc.target)),
        RecordType::Cname
        | RecordType::Mx
        | RecordType::Ns
        | RecordType::Ptr
        | RecordType::Srv
        | RecordType::Alias
        | RecordType::Aname => check_hostname_target(rc),
        RecordType::Caa => {
            if CAA_TAGS.contains(&rc.caa_tag.as_str()) || rc.combined_target {
                Ok(())
            } else {
                Err(format!("CAA tag {:?} is not one of {:?}", rc.caa_tag, CAA_TAGS))
            }
        }
        RecordType::Soa
        | RecordType::Tlsa
        | RecordType::Txt
        | RecordType::Url
        | RecordType::Url301
        | RecordType::Frame
        | RecordType::ImportTransform
        | RecordType::CfRedirect
        | RecordType::CfTempRedirect
        | RecordType::R53Alias => Ok(()),
    }
}

fn check_hostname_target(rc: &RecordConfig) -> Result<(), String> {
    let target = rc.target.as_str();
    if target.is_empty() {
        return Err(format!("{} target must not be empty", rc.rtype));
    }
    if rc.combined_target || target == "@" || target.ends_with('.') || !target.contains('.') {
        return Ok(());
    }
    Err(format!(
        "{} target {:?} contains dots but does not end with one",
        rc.rtype, target
    ))
}

// A CNAME owns its label: it cannot sit at the apex or next to other records.
fn check_cnames(dc: &DomainConfig) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut per_label: HashMap<&str, Vec<RecordType>> = HashMap::new();
    for rc in &dc.records {
        per_label.entry(rc.name.as_str()).or_default().push(rc.rtype);
    }

    for (label, types) in per_label {
        if !types.contains(&RecordType::Cname) {
            continue;
        }
        if label == "@" {
            errors.push(Error::validation(format!("{}: CNAME is not allowed at the apex", dc.name)));
        } else if types.len() > 1 {
            errors.push(Error::validation(format!(
                "{}: label {} has a CNAME and other records",
                dc.name, label
            )));
        }
    }
    errors
}
