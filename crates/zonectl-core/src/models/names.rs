//! Conversions between relative labels and fully-qualified names.
//!
//! Names in this crate never carry a trailing dot. The zone apex is written
//! as `@` in its relative form.

/// Label used for the zone apex
pub const APEX: &str = "@";

/// Join a relative label onto an origin.
///
/// `@` maps to the origin itself; a label that already ends with `.` is
/// treated as absolute and only loses its trailing dot.
pub fn add_origin(name: &str, origin: &str) -> String {
    if name == APEX {
        return origin.to_string();
    }
    if let Some(absolute) = name.strip_suffix('.') {
        return absolute.to_string();
    }
    if origin.is_empty() {
        return name.to_string();
    }
    if name.is_empty() {
        return origin.to_string();
    }
    format!("{}.{}", name, origin)
}

/// Strip an origin from a fully-qualified name.
///
/// Returns `@` for the origin itself. A name outside the origin is returned
/// unchanged, which makes [`add_origin`] disagree with it and lets integrity
/// checks catch the mismatch.
pub fn trim_origin(fqdn: &str, origin: &str) -> String {
    if fqdn == origin {
        return APEX.to_string();
    }
    if origin.is_empty() {
        return fqdn.to_string();
    }
    match fqdn.strip_suffix(origin) {
        Some(prefix) if prefix.len() > 1 && prefix.ends_with('.') => {
            prefix[..prefix.len() - 1].to_string()
        }
        _ => fqdn.to_string(),
    }
}
