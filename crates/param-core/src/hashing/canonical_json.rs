//! JSON canónico: claves ordenadas lexicográficamente, sin espacios.
//!
//! Los snapshots preservan el orden de inserción para visualización; para
//! comparar o hashear necesitamos una forma independiente de ese orden.

use serde_json::Value;
use std::collections::BTreeMap;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let tree: BTreeMap<&String, String> = map.iter().map(|(k, v)| (k, to_canonical_json(v))).collect();
            let items: Vec<String> = tree.into_iter()
                                         .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v))
                                         .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // null, bool, number y string ya tienen una única representación compacta
        other => other.to_string(),
    }
}
