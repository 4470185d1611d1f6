//! Domain and provider selection for a run

use std::collections::HashSet;

/// Decides which domains and providers a run touches
pub trait Filter: Send + Sync {
    fn should_run_domain(&self, domain: &str) -> bool;

    /// `non_default` marks providers excluded unless explicitly selected
    fn should_run_provider(&self, name: &str, domain: &str, non_default: bool) -> bool;
}

/// Selection from comma-separated lists
///
/// An empty domain list selects every domain. An empty provider list selects
/// every default provider; `all` also selects the opt-in ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    domains: Option<HashSet<String>>,
    providers: Option<HashSet<String>>,
    all_providers: bool,
}

fn parse_list(list: &str) -> Option<HashSet<String>> {
    let items: HashSet<String> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() { None } else { Some(items) }
}

impl SelectionFilter {
    /// Select everything except opt-in providers
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lists(domains: &str, providers: &str) -> Self {
        let all_providers = providers.trim().eq_ignore_ascii_case("all");
        Self {
            domains: parse_list(domains),
            providers: if all_providers { None } else { parse_list(providers) },
            all_providers,
        }
    }
}

impl Filter for SelectionFilter {
    fn should_run_domain(&self, domain: &str) -> bool {
        match &self.domains {
            None => true,
            Some(set) => set.contains(domain),
        }
    }

    fn should_run_provider(&self, name: &str, _domain: &str, non_default: bool) -> bool {
        if self.all_providers {
            return true;
        }
        match &self.providers {
            None => !non_default,
            Some(set) => set.contains(name),
        }
    }
}
