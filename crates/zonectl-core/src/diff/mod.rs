// # Record-set diff
//
// Shared comparison used by every adapter. Records are grouped by
// `(label, type)`; two groups are equal when they hold the same set of
// values (order-insensitive) with the same TTL.
//
// ## TTL policy
//
// A group carries a single TTL. When the records of one group disagree,
// the largest TTL wins and a warning is logged. A TTL difference between the
// desired and the live group is a change like any other.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use crate::models::{DomainConfig, RecordConfig, RecordKey};

/// All records sharing one `(label, type)` key
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub key: RecordKey,
    pub fqdn: String,
    pub ttl: u32,
    pub records: Vec<RecordConfig>,
}

impl RecordGroup {
    fn new(first: &RecordConfig) -> Self {
        Self {
            key: first.key(),
            fqdn: first.name_fqdn.clone(),
            ttl: first.ttl,
            records: Vec::new(),
        }
    }

    /// Sorted, distinct record contents
    pub fn values(&self) -> Vec<String> {
        let mut values: Vec<String> = self.records.iter().map(RecordConfig::content).collect();
        values.sort();
        values.dedup();
        values
    }

    fn same_as(&self, other: &RecordGroup) -> bool {
        self.ttl == other.ttl && self.values() == other.values()
    }
}

impl fmt::Display for RecordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} ttl={}",
            self.key.rtype,
            self.fqdn,
            self.values().join(", "),
            self.ttl
        )
    }
}

/// Group records by key, resolving the group TTL to the maximum
pub fn group_records(records: &[RecordConfig]) -> BTreeMap<RecordKey, RecordGroup> {
    let mut groups: BTreeMap<RecordKey, RecordGroup> = BTreeMap::new();
    for rc in records {
        let group = groups.entry(rc.key()).or_insert_with(|| RecordGroup::new(rc));
        if rc.ttl != group.ttl {
            let resolved = group.ttl.max(rc.ttl);
            warn!(
                "conflicting TTLs for {} {} ({} vs {}), using {}",
                group.key.rtype, group.fqdn, group.ttl, rc.ttl, resolved
            );
            group.ttl = resolved;
        }
        group.records.push(rc.clone());
    }
    groups
}

/// One group-level difference
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Create { desired: RecordGroup },
    Modify { existing: RecordGroup, desired: RecordGroup },
    Delete { existing: RecordGroup },
}

impl Change {
    pub fn key(&self) -> &RecordKey {
        match self {
            Change::Create { desired } | Change::Modify { desired, .. } => &desired.key,
            Change::Delete { existing } => &existing.key,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Create { desired } => write!(f, "CREATE {}", desired),
            Change::Modify { existing, desired } => write!(
                f,
                "MODIFY {} {}: ({} ttl={}) -> ({} ttl={})",
                desired.key.rtype,
                desired.fqdn,
                existing.values().join(", "),
                existing.ttl,
                desired.values().join(", "),
                desired.ttl
            ),
            Change::Delete { existing } => write!(f, "DELETE {}", existing),
        }
    }
}

/// Differences between live and desired records, in key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub changes: Vec<Change>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Compares live records against a domain's desired records
pub struct Differ<'a> {
    dc: &'a DomainConfig,
}

impl<'a> Differ<'a> {
    pub fn new(dc: &'a DomainConfig) -> Self {
        Self { dc }
    }

    fn ignored(&self, rc: &RecordConfig) -> bool {
        self.dc.ignored_labels.iter().any(|l| *l == rc.name)
    }

    /// Records of the domain that take part in reconciliation
    pub fn desired(&self) -> Vec<RecordConfig> {
        self.dc.records.iter().filter(|r| !self.ignored(r)).cloned().collect()
    }

    /// Compute the changeset turning `existing` into the desired records
    pub fn diff(&self, existing: &[RecordConfig]) -> Changeset {
        let live: Vec<RecordConfig> = existing.iter().filter(|r| !self.ignored(r)).cloned().collect();
        let mut live = group_records(&live);
        let desired = group_records(&self.desired());

        let mut changes = Vec::new();
        for (key, want) in desired {
            match live.remove(&key) {
                Some(have) if have.same_as(&want) => {
                    debug!("unchanged {} {}", key.rtype, want.fqdn);
                }
                Some(have) => changes.push(Change::Modify {
                    existing: have,
                    desired: want,
                }),
                None => changes.push(Change::Create { desired: want }),
            }
        }

        for (_, have) in live {
            if self.dc.keep_unknown {
                debug!("keeping unknown {} {}", have.key.rtype, have.fqdn);
                continue;
            }
            changes.push(Change::Delete { existing: have });
        }

        changes.sort_by(|a, b| a.key().cmp(b.key()));
        Changeset { changes }
    }

    /// The complete record set of the zone once every change is applied
    ///
    /// Live records under ignored labels survive, as do unknown live groups
    /// when the domain keeps them.
    pub fn resulting_records(&self, existing: &[RecordConfig]) -> Vec<RecordConfig> {
        let mut result = self.desired();
        let desired_keys: HashSet<RecordKey> = result.iter().map(RecordConfig::key).collect();
        for rc in existing {
            let keep = self.ignored(rc) || (self.dc.keep_unknown && !desired_keys.contains(&rc.key()));
            if keep {
                result.push(rc.clone());
            }
        }
        result
    }
}
