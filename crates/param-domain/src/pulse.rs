//! `Pulse`: nodo con los tiempos de un pulso y su amplitud.
//!
//! `t_start` y `duration` se guardan en cache; `t_stop` es delegado:
//! - get: `t_start + duration` (`None` si falta alguno),
//! - set: ajusta `duration` manteniendo `t_start`.
//!
//! Cada cambio de `t_start` o `duration` re-evalúa `t_stop` con `update`, así
//! quien escuche `t_stop` recibe todos sus cambios efectivos.

use log::debug;
use param_core::value::numeric::{add, require_sub};
use param_core::{NodeConfig, Parameter, ParameterNode, Snapshot, SnapshotOptions, Validator};
use serde_json::Value;
use std::ops::Deref;

use crate::DomainError;

/// Tag `__class__` de los pulsos.
pub const PULSE_CLASS: &str = "Pulse";

#[derive(Clone, Debug)]
pub struct Pulse {
    node: ParameterNode,
}

impl Pulse {
    /// Pulso vacío: sin tiempos ni amplitud, habilitado.
    pub fn new(name: Option<&str>) -> Result<Self, DomainError> {
        let config = NodeConfig::default().with_use_as_attributes(true)
                                          .with_simplify_snapshot(true)
                                          .with_class_name(PULSE_CLASS);
        let node = ParameterNode::with_config(name, config);

        node.add_parameter(Parameter::builder("enabled").validator(Validator::Bool)
                                                        .initial_value(true)
                                                        .build()?)?;
        let t_start = node.add_parameter(Parameter::builder("t_start").unit("s")
                                                                      .validator(Validator::numbers())
                                                                      .build()?)?;
        let duration = node.add_parameter(Parameter::builder("duration").unit("s")
                                                                        .validator(Validator::Numbers { min: Some(0.0),
                                                                                                        max: None })
                                                                        .build()?)?;
        let t_stop = node.add_parameter(Parameter::builder("t_stop").unit("s")
                                                                    .validator(Validator::numbers())
                                                                    .delegated()
                                                                    .build()?)?;
        node.add_parameter(Parameter::builder("amplitude").unit("V")
                                                          .validator(Validator::numbers())
                                                          .build()?)?;

        node.register_parameter_getter("t_stop", |n, _| {
                Ok(add(&n.get("t_start")?, &n.get("duration")?).unwrap_or(Value::Null))
            });
        node.register_parameter_setter("t_stop", |n, _, t_stop| {
                let duration = require_sub(&t_stop, &n.get("t_start")?)?;
                n.set("duration", duration)
            });

        for source in [&t_start, &duration] {
            let t_stop = t_stop.clone();
            source.connect_fn(move |_| t_stop.update().map(drop));
        }

        debug!("created pulse '{}'", node.display_name());
        Ok(Self { node })
    }

    pub fn builder(name: impl Into<String>) -> PulseBuilder {
        PulseBuilder { name: Some(name.into()),
                       ..PulseBuilder::default() }
    }

    /// Reconstruye el handle a partir de un nodo creado por `Pulse::new`.
    pub(crate) fn from_node(node: ParameterNode) -> Option<Self> {
        (node.config().class_name == PULSE_CLASS).then_some(Self { node })
    }

    pub fn as_node(&self) -> &ParameterNode {
        &self.node
    }

    pub fn is_enabled(&self) -> bool {
        self.node.parameter("enabled").map(|p| p.get_latest() != Value::Bool(false)).unwrap_or(true)
    }

    pub fn t_start(&self) -> Result<Option<f64>, DomainError> {
        Ok(self.node.get("t_start")?.as_f64())
    }

    pub fn duration(&self) -> Result<Option<f64>, DomainError> {
        Ok(self.node.get("duration")?.as_f64())
    }

    pub fn t_stop(&self) -> Result<Option<f64>, DomainError> {
        Ok(self.node.get("t_stop")?.as_f64())
    }

    /// Copia sin padre con el mismo nombre y los mismos valores.
    pub fn copy(&self) -> Result<Pulse, DomainError> {
        let copy = Pulse::new(self.node.name().as_deref())?;
        for name in ["enabled", "t_start", "duration", "amplitude"] {
            let value = self.node.parameter(name)?.get_latest();
            if !value.is_null() {
                copy.set(name, value)?;
            }
        }
        Ok(copy)
    }

    /// `true` si cada `(parámetro, valor)` coincide. Un parámetro inexistente
    /// no coincide.
    pub fn satisfies(&self, conditions: &[(String, Value)]) -> Result<bool, DomainError> {
        for (name, expected) in conditions {
            if self.node.parameter(name).is_err() {
                return Ok(false);
            }
            if !values_match(&self.node.get(name)?, expected) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Intervalos `[t_start, t_stop)` que se intersectan. Pulsos sin tiempos
    /// definidos no solapan con nada.
    pub fn overlaps(&self, other: &Pulse) -> Result<bool, DomainError> {
        let interval = |p: &Pulse| -> Result<Option<(f64, f64)>, DomainError> {
            Ok(p.t_start()?.zip(p.t_stop()?))
        };
        Ok(match (interval(self)?, interval(other)?) {
            (Some((a0, a1)), Some((b0, b1))) => a0 < b1 && b0 < a1,
            _ => false,
        })
    }
}

/// Igualdad por valores de parámetros; el nombre y el padre no cuentan.
impl PartialEq for Pulse {
    fn eq(&self, other: &Self) -> bool {
        match (value_snapshot(&self.node), value_snapshot(&other.node)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Snapshot simplificado y refrescado; `None` si algún get falla.
pub(crate) fn value_snapshot(node: &ParameterNode) -> Option<Snapshot> {
    node.snapshot_with(SnapshotOptions { simplify: Some(true),
                                         update: true })
        .ok()
}

pub(crate) fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

impl Deref for Pulse {
    type Target = ParameterNode;

    fn deref(&self) -> &ParameterNode {
        &self.node
    }
}

/// Construcción de un pulso con sus valores iniciales.
///
/// `t_stop` y `duration` son excluyentes: ambos fijan el mismo grado de
/// libertad.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct PulseBuilder {
    name: Option<String>,
    t_start: Option<Value>,
    duration: Option<Value>,
    t_stop: Option<Value>,
    amplitude: Option<Value>,
    enabled: Option<bool>,
}

impl PulseBuilder {
    /// Pulso sin nombre (sus parámetros no llevan prefijo en `full_name`).
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn t_start(mut self, t_start: impl Into<Value>) -> Self {
        self.t_start = Some(t_start.into());
        self
    }

    pub fn duration(mut self, duration: impl Into<Value>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn t_stop(mut self, t_stop: impl Into<Value>) -> Self {
        self.t_stop = Some(t_stop.into());
        self
    }

    pub fn amplitude(mut self, amplitude: impl Into<Value>) -> Self {
        self.amplitude = Some(amplitude.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn build(self) -> Result<Pulse, DomainError> {
        if self.duration.is_some() && self.t_stop.is_some() {
            return Err(DomainError::ValidationError("pulse takes either duration or t_stop, not both".to_string()));
        }
        let pulse = Pulse::new(self.name.as_deref())?;
        if let Some(t_start) = self.t_start {
            pulse.set("t_start", t_start)?;
        }
        if let Some(duration) = self.duration {
            pulse.set("duration", duration)?;
        }
        if let Some(t_stop) = self.t_stop {
            pulse.set("t_stop", t_stop)?;
        }
        if let Some(amplitude) = self.amplitude {
            pulse.set("amplitude", amplitude)?;
        }
        if let Some(enabled) = self.enabled {
            pulse.set("enabled", enabled)?;
        }
        Ok(pulse)
    }
}
