//! HTTP request handlers for the Query API.

pub mod data;
pub mod health;
pub mod metadata;
pub mod metrics;

/// Store path captured by a wildcard route, without its leading slash.
pub(crate) fn store_path(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}
