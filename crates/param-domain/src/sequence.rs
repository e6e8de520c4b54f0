//! `PulseSequence`: contenedor de pulsos indexados por nombre.
//!
//! Los pulsos cuelgan como nodos hijos, por lo que aparecen en el snapshot de
//! la secuencia y sus parámetros heredan el prefijo (`seq_read_t_start`).
//! `duration` es delegado: vale el mayor `t_stop` de los pulsos habilitados
//! salvo que se fije explícitamente; fijarlo a `None`, añadir o quitar un
//! pulso vuelve al cálculo automático.

use indexmap::IndexMap;
use log::debug;
use param_core::{ListenerId, NodeConfig, Parameter, ParameterNode, RegistryError, Validator};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::Rc;

use crate::pulse::value_snapshot;
use crate::{DomainError, Pulse};

pub const SEQUENCE_CLASS: &str = "PulseSequence";

/// Retardo final por defecto (s).
pub const DEFAULT_FINAL_DELAY: f64 = 0.5e-3;

#[derive(Clone, Debug)]
pub struct PulseSequence {
    node: ParameterNode,
    duration_override: Rc<Cell<Option<f64>>>,
    // Listener de `t_stop` instalado en cada pulso, por nombre.
    t_stop_links: Rc<RefCell<IndexMap<String, ListenerId>>>,
}

/// Filtro de `get_pulses`. Por defecto sólo pulsos habilitados.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PulseQuery {
    include_disabled: bool,
    name: Option<String>,
    conditions: Vec<(String, Value)>,
}

impl PulseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_disabled(mut self) -> Self {
        self.include_disabled = true;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Exige `parameter == value` (los números se comparan como `f64`).
    pub fn with(mut self, parameter: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((parameter.into(), value.into()));
        self
    }
}

impl PulseSequence {
    pub fn new(name: Option<&str>) -> Result<Self, DomainError> {
        let config = NodeConfig::default().with_use_as_attributes(true)
                                          .with_simplify_snapshot(true)
                                          .with_class_name(SEQUENCE_CLASS);
        let node = ParameterNode::with_config(name, config);
        let duration_override = Rc::new(Cell::new(None));

        node.add_parameter(Parameter::builder("allow_pulse_overlap").validator(Validator::Bool)
                                                                    .initial_value(true)
                                                                    .build()?)?;
        node.add_parameter(Parameter::builder("final_delay").unit("s")
                                                            .validator(Validator::numbers())
                                                            .initial_value(DEFAULT_FINAL_DELAY)
                                                            .build()?)?;
        node.add_parameter(Parameter::builder("duration").unit("s")
                                                         .validator(Validator::numbers())
                                                         .delegated()
                                                         .build()?)?;
        node.add_parameter(Parameter::delegated("t_start_list"))?;
        node.add_parameter(Parameter::delegated("t_stop_list"))?;

        let current = duration_override.clone();
        node.register_parameter_getter("duration", move |n, _| {
                if let Some(duration) = current.get() {
                    return Ok(Value::from(duration));
                }
                let last_stop = times(n, "t_stop")?.into_iter().fold(0.0, f64::max);
                Ok(Value::from(last_stop))
            });
        let current = duration_override.clone();
        node.register_parameter_setter("duration", move |_, _, duration| {
                current.set(duration.as_f64());
                Ok(())
            });
        // Sólo getters: ambas listas son de lectura.
        node.register_parameter_getter("t_start_list", |n, _| Ok(Value::from(times(n, "t_start")?)));
        node.register_parameter_getter("t_stop_list", |n, _| Ok(Value::from(times(n, "t_stop")?)));

        Ok(Self { node,
                  duration_override,
                  t_stop_links: Rc::new(RefCell::new(IndexMap::new())) })
    }

    pub fn as_node(&self) -> &ParameterNode {
        &self.node
    }

    /// Añade `pulse` bajo su nombre.
    ///
    /// Falla si no tiene nombre, si ya hay un pulso con ese nombre o, con
    /// `allow_pulse_overlap` desactivado, si se solapa con un pulso habilitado.
    pub fn add_pulse(&self, pulse: Pulse) -> Result<Pulse, DomainError> {
        let name = pulse.name().ok_or(DomainError::UnnamedPulse)?;
        if self.node.node(&name).is_ok() {
            return Err(DomainError::DuplicatePulse(name));
        }
        if self.node.get("allow_pulse_overlap")? == Value::Bool(false) {
            for other in self.pulses() {
                if other.is_enabled() && pulse.overlaps(&other)? {
                    return Err(DomainError::PulseOverlap { pulse: name,
                                                           other: other.name().unwrap_or_default() });
                }
            }
        }

        self.node.add_node(&name, pulse.as_node().clone())?;

        let duration = self.node.parameter("duration")?;
        // Si la secuencia ya no existe el pulso sigue funcionando solo.
        let link = pulse.parameter("t_stop")?.connect_fn(move |_| match duration.owner() {
                                                 Some(_) => duration.update().map(drop),
                                                 None => Ok(()),
                                             });
        self.t_stop_links.borrow_mut().insert(name.clone(), link);

        self.duration_override.set(None);
        self.node.parameter("duration")?.update()?;
        debug!("added pulse '{}' to sequence '{}'", name, self.node.display_name());
        Ok(pulse)
    }

    /// Quita el pulso `name` junto con el listener que alimenta `duration`.
    /// El pulso devuelto queda libre para añadirse a otra secuencia.
    pub fn remove_pulse(&self, name: &str) -> Result<Pulse, DomainError> {
        let pulse = self.pulse(name)?;
        let link = self.t_stop_links.borrow_mut().shift_remove(name);
        if let Some(link) = link {
            pulse.parameter("t_stop")?.disconnect(link);
        }
        self.node.remove_node(name)?;

        self.duration_override.set(None);
        self.node.parameter("duration")?.update()?;
        debug!("removed pulse '{}' from sequence '{}'", name, self.node.display_name());
        Ok(pulse)
    }

    /// Quita todos los pulsos.
    pub fn clear(&self) -> Result<(), DomainError> {
        let names: Vec<String> = self.node
                                     .parameter_nodes()
                                     .into_iter()
                                     .filter(|(_, child)| Pulse::from_node(child.clone()).is_some())
                                     .map(|(name, _)| name)
                                     .collect();
        for name in names {
            self.remove_pulse(&name)?;
        }
        Ok(())
    }

    pub fn pulse(&self, name: &str) -> Result<Pulse, DomainError> {
        let node = self.node.node(name)?;
        Pulse::from_node(node).ok_or_else(|| DomainError::ValidationError(format!("'{name}' is not a pulse")))
    }

    /// Todos los pulsos en orden de inserción.
    pub fn pulses(&self) -> Vec<Pulse> {
        all_pulses(&self.node)
    }

    /// Pulsos habilitados ordenados por `t_start` (los que no lo tienen, al final).
    pub fn enabled_pulses(&self) -> Result<Vec<Pulse>, DomainError> {
        let mut keyed = Vec::new();
        for pulse in self.pulses().into_iter().filter(Pulse::is_enabled) {
            keyed.push((pulse.t_start()?.unwrap_or(f64::INFINITY), pulse));
        }
        keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        Ok(keyed.into_iter().map(|(_, pulse)| pulse).collect())
    }

    /// Pulsos que cumplen `query`: los habilitados ordenados por `t_start`
    /// o, con `include_disabled`, todos en orden de inserción.
    pub fn get_pulses(&self, query: &PulseQuery) -> Result<Vec<Pulse>, DomainError> {
        let candidates = if query.include_disabled { self.pulses() } else { self.enabled_pulses()? };
        let mut found = Vec::new();
        for pulse in candidates {
            if query.name.as_ref().is_some_and(|name| pulse.name().as_ref() != Some(name)) {
                continue;
            }
            if pulse.satisfies(&query.conditions)? {
                found.push(pulse);
            }
        }
        Ok(found)
    }

    /// Único pulso que cumple `query`; `None` si no hay ninguno.
    pub fn get_pulse(&self, query: &PulseQuery) -> Result<Option<Pulse>, DomainError> {
        let mut found = self.get_pulses(query)?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(DomainError::AmbiguousPulse(format!("{n} pulses match {query:?}"))),
        }
    }

    /// Copia independiente: mismos ajustes y copias de todos los pulsos.
    /// Un `duration` fijado a mano se conserva.
    pub fn copy(&self) -> Result<PulseSequence, DomainError> {
        let copy = PulseSequence::new(self.node.name().as_deref())?;
        copy.set("final_delay", self.node.parameter("final_delay")?.get_latest())?;
        for pulse in self.pulses() {
            copy.add_pulse(pulse.copy()?)?;
        }
        // Después de los pulsos: la copia ya no puede introducir solapes.
        copy.set("allow_pulse_overlap", self.node.parameter("allow_pulse_overlap")?.get_latest())?;
        copy.duration_override.set(self.duration_override.get());
        copy.parameter("duration")?.update()?;
        Ok(copy)
    }

    pub fn is_empty(&self) -> bool {
        self.pulses().is_empty()
    }

    pub fn len(&self) -> usize {
        self.pulses().len()
    }
}

/// Igualdad por valores: ajustes, `duration` y pulsos (por nombre y valores).
impl PartialEq for PulseSequence {
    fn eq(&self, other: &Self) -> bool {
        match (value_snapshot(&self.node), value_snapshot(&other.node)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Deref for PulseSequence {
    type Target = ParameterNode;

    fn deref(&self) -> &ParameterNode {
        &self.node
    }
}

fn all_pulses(node: &ParameterNode) -> Vec<Pulse> {
    node.parameter_nodes().into_iter().filter_map(|(_, child)| Pulse::from_node(child)).collect()
}

/// Valores ordenados de `parameter` en los pulsos habilitados que lo tienen.
fn times(node: &ParameterNode, parameter: &str) -> Result<Vec<f64>, RegistryError> {
    let mut values = Vec::new();
    for pulse in all_pulses(node).iter().filter(|p| p.is_enabled()) {
        if let Some(t) = pulse.get(parameter)?.as_f64() {
            values.push(t);
        }
    }
    values.sort_by(f64::total_cmp);
    Ok(values)
}
