//! Hash helpers (blake3, salida hex).

use blake3::Hasher;
use serde_json::{Map, Value};

use super::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Fingerprint estable de un snapshot: hash del JSON canónico.
///
/// Dos snapshots con el mismo contenido producen el mismo fingerprint aunque
/// el orden de inserción de sus claves difiera.
pub fn snapshot_fingerprint(snapshot: &Map<String, Value>) -> String {
    hash_str(&to_canonical_json(&Value::Object(snapshot.clone())))
}
