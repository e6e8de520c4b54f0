//! Motor de snapshots.
//!
//! Recorre el árbol desde el nodo pedido hacia las hojas y produce un mapa
//! ordenado (orden de inserción). Por defecto reporta los valores cacheados:
//! nunca ejecuta un get salvo con `update`, así que dos snapshots seguidos
//! sin get/set intermedios son idénticos.
//!
//! Con `update`, un get fallido se propaga como `Err`: el snapshot nunca omite
//! en silencio un parámetro ni un sub-nodo.

use serde_json::{Map, Value};

use super::ParameterNode;
use crate::clock::format_timestamp;
use crate::constants::{CLASS_KEY, FUNCTION_CLASS, PARAMETER_CLASS};
use crate::errors::Result;
use crate::hashing::snapshot_fingerprint;
use crate::parameter::Parameter;

/// Snapshot ordenado de un nodo o parámetro.
pub type Snapshot = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Fuerza (o desactiva) la forma simplificada en el nodo raíz del
    /// snapshot; `None` usa su `simplify_snapshot`. Los hijos siempre usan
    /// su propia configuración.
    pub simplify: Option<bool>,
    /// Ejecuta get sobre cada parámetro antes de reportarlo.
    pub update: bool,
}

impl SnapshotOptions {
    pub fn simplified(simplify: bool) -> Self {
        Self { simplify: Some(simplify),
               update: false }
    }

    pub fn updated() -> Self {
        Self { simplify: None,
               update: true }
    }
}

/// Clave de un parámetro en la forma simplificada: `nombre` o `nombre (unidad)`.
pub fn simplified_key(name: &str, unit: Option<&str>) -> String {
    match unit {
        Some(unit) if !unit.is_empty() => format!("{name} ({unit})"),
        _ => name.to_string(),
    }
}

impl Parameter {
    /// Resumen completo del parámetro (tag, nombres, etiqueta, valores, timestamp).
    pub fn snapshot(&self, update: bool) -> Result<Snapshot> {
        let snapshot_value = self.snapshot_value();
        if update && snapshot_value {
            self.get()?;
        }
        let mut map = Map::new();
        map.insert(CLASS_KEY.into(), PARAMETER_CLASS.into());
        map.insert("full_name".into(), self.full_name().into());
        map.insert("name".into(), self.name().into());
        map.insert("label".into(), self.label().into());
        if let Some(unit) = self.unit() {
            map.insert("unit".into(), unit.into());
        }
        if snapshot_value {
            map.insert("raw_value".into(), self.raw_value());
            map.insert("value".into(), self.get_latest());
        }
        if let Some(ts) = self.timestamp() {
            map.insert("timestamp".into(), format_timestamp(&ts).into());
        }
        Ok(map)
    }
}

impl ParameterNode {
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.snapshot_with(SnapshotOptions::default())
    }

    pub fn snapshot_with(&self, options: SnapshotOptions) -> Result<Snapshot> {
        let config = self.config();
        let simplify = options.simplify.unwrap_or(config.simplify_snapshot);
        let children = SnapshotOptions { simplify: None,
                                         update: options.update };

        let mut map = Map::new();
        map.insert(CLASS_KEY.into(), config.class_name.into());

        if simplify {
            for (name, parameter) in self.parameters() {
                if !parameter.snapshot_value() {
                    continue;
                }
                if options.update {
                    parameter.get()?;
                }
                let key = simplified_key(&name, parameter.unit().as_deref());
                map.insert(key, parameter.get_latest());
            }
            for (name, node) in self.parameter_nodes() {
                map.insert(name, Value::Object(node.snapshot_with(children)?));
            }
            return Ok(map);
        }

        map.insert("name".into(), self.name().map_or(Value::Null, Value::from));

        let mut parameters = Map::new();
        for (name, parameter) in self.parameters() {
            parameters.insert(name, Value::Object(parameter.snapshot(options.update)?));
        }
        map.insert("parameters".into(), Value::Object(parameters));

        let mut nodes = Map::new();
        for (name, node) in self.parameter_nodes() {
            nodes.insert(name, Value::Object(node.snapshot_with(children)?));
        }
        map.insert("parameter_nodes".into(), Value::Object(nodes));

        let mut functions = Map::new();
        for name in self.function_names() {
            let mut f = Map::new();
            f.insert(CLASS_KEY.into(), FUNCTION_CLASS.into());
            f.insert("name".into(), name.clone().into());
            functions.insert(name, Value::Object(f));
        }
        map.insert("functions".into(), Value::Object(functions));

        let mut submodules = Map::new();
        for (name, node) in self.submodules() {
            submodules.insert(name, Value::Object(node.snapshot_with(children)?));
        }
        map.insert("submodules".into(), Value::Object(submodules));

        Ok(map)
    }

    /// Fingerprint (blake3) del snapshot actual, sin update.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(snapshot_fingerprint(&self.snapshot()?))
    }
}
