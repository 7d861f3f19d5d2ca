//! # Source Precedence
//!
//! Layers property stores from several sources.
//!
//! # Precedence Order
//! Sources are given lowest first; a later source overrides earlier ones.
//! The usual order is:
//! 1. Configuration file (lowest priority)
//! 2. Environment variables
//! 3. Command-line arguments (highest priority)

use crate::properties::PropertyStore;

/// Merge property sources with precedence.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Produces one store where each key holds the value of the last source
/// that defines it. Overridden keys are logged with the overriding source's
/// name; values are not logged since they may hold secrets.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::{merge_sources, parse_properties, properties_from_args, properties_from_env};
///
/// let file = parse_properties("server.port=8080");
/// let env = properties_from_env("APP");
/// let (cli, _rest) = properties_from_args(std::env::args().skip(1));
///
/// let merged = merge_sources(&[("file", file), ("env", env), ("cli", cli)]);
/// println!("{:?}", merged.get("server.port"));
/// ```
pub fn merge_sources(sources: &[(&str, PropertyStore)]) -> PropertyStore {
    let mut merged = PropertyStore::new();
    for (source_name, store) in sources {
        let changes: Vec<&str> = store
            .iter()
            .filter(|(key, value)| merged.get(key).is_some_and(|old| old != *value))
            .map(|(key, _)| key)
            .collect();
        if !changes.is_empty() {
            tracing::info!("Configuration from {}: {:?}", source_name, changes);
        }
        merged.extend_from(store);
    }
    merged
}
