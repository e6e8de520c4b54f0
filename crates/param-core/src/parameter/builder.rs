//! Builder de `Parameter`.
//!
//! Reglas por defecto del origen de set cuando no se declara explícitamente:
//! - get en cache -> set en cache (parámetro manual);
//! - `get_cmd` en línea -> sin set (sólo lectura);
//! - delegado -> set delegado (el nodo decide si registra setter).

use serde_json::Value;
use std::rc::Rc;

use super::source::{GetSource, Parser, SetSource};
use super::{Parameter, ParameterState};
use crate::errors::{RegistryError, Result};
use crate::value::Validator;

#[must_use]
pub struct ParameterBuilder {
    name: String,
    label: Option<String>,
    unit: Option<String>,
    initial_value: Value,
    get_source: GetSource,
    set_source: Option<SetSource>,
    validator: Validator,
    get_parser: Option<Parser>,
    set_parser: Option<Parser>,
    snapshot_value: bool,
    log_changes: bool,
}

impl ParameterBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               label: None,
               unit: None,
               initial_value: Value::Null,
               get_source: GetSource::Stored,
               set_source: None,
               validator: Validator::Anything,
               get_parser: None,
               set_parser: None,
               snapshot_value: true,
               log_changes: false }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Valor inicial de la cache. Se valida en `build`.
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = value.into();
        self
    }

    pub fn get_cmd<F>(mut self, cmd: F) -> Self
        where F: Fn() -> Result<Value> + 'static
    {
        self.get_source = GetSource::Inline(Rc::new(cmd));
        self
    }

    pub fn set_cmd<F>(mut self, cmd: F) -> Self
        where F: Fn(Value) -> Result<()> + 'static
    {
        self.set_source = Some(SetSource::Inline(Rc::new(cmd)));
        self
    }

    /// Get y set resueltos por el nodo dueño.
    pub fn delegated(mut self) -> Self {
        self.get_source = GetSource::Delegated;
        self.set_source = Some(SetSource::Delegated);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.set_source = Some(SetSource::Disabled);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn get_parser<F>(mut self, parser: F) -> Self
        where F: Fn(Value) -> Result<Value> + 'static
    {
        self.get_parser = Some(Rc::new(parser));
        self
    }

    pub fn set_parser<F>(mut self, parser: F) -> Self
        where F: Fn(Value) -> Result<Value> + 'static
    {
        self.set_parser = Some(Rc::new(parser));
        self
    }

    /// `false` excluye el valor de los snapshots (p.ej. trazas grandes).
    pub fn snapshot_value(mut self, snapshot_value: bool) -> Self {
        self.snapshot_value = snapshot_value;
        self
    }

    pub fn log_changes(mut self, log_changes: bool) -> Self {
        self.log_changes = log_changes;
        self
    }

    /// Construye el parámetro validando el valor inicial.
    pub fn build(self) -> Result<Parameter> {
        if let Err(reason) = self.validator.validate(&self.initial_value) {
            return Err(RegistryError::ValidationFailed { parameter: self.name, reason });
        }
        Ok(Parameter::from_state(self.into_state()))
    }

    pub(crate) fn into_state(self) -> ParameterState {
        let set_source = match (self.set_source, &self.get_source) {
            (Some(source), _) => source,
            (None, GetSource::Stored) => SetSource::Stored,
            (None, GetSource::Inline(_)) => SetSource::Disabled,
            (None, GetSource::Delegated) => SetSource::Delegated,
        };
        let timestamp = (!self.initial_value.is_null()).then(crate::clock::now);
        ParameterState { name: self.name,
                         label: self.label,
                         unit: self.unit,
                         raw_value: self.initial_value.clone(),
                         value: self.initial_value,
                         timestamp,
                         get_source: self.get_source,
                         set_source,
                         validator: self.validator,
                         get_parser: self.get_parser,
                         set_parser: self.set_parser,
                         snapshot_value: self.snapshot_value,
                         log_changes: self.log_changes,
                         listeners: Vec::new(),
                         next_listener: 0 }
    }
}
