//! Key prefix normalization for scoped listings.

/// Normalize a user-supplied listing prefix.
///
/// An empty prefix means "the whole bucket" and becomes `None`. Anything else
/// is kept byte for byte: keys may start with `/` or contain spaces, and
/// altering the prefix would change which objects a run acts on.
///
/// # Arguments
/// * `prefix` - Raw prefix from configuration
///
/// # Returns
/// The prefix to pass to the store, or None for an unscoped listing.
pub fn normalize_prefix(prefix: Option<&str>) -> Option<String> {
    match prefix {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ => None,
    }
}

/// Check whether `key` falls under `prefix`.
///
/// A missing prefix matches every key.
pub fn key_matches_prefix(key: &str, prefix: Option<&str>) -> bool {
    match prefix {
        Some(p) => key.starts_with(p),
        None => true,
    }
}
