//! Canonicalización JSON y hashing de snapshots.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, snapshot_fingerprint};
