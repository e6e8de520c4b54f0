//! `Parameter`: celda de estado con nombre, get y set opcional.
//!
//! Un `Parameter` es un handle barato (`Rc`): los clones comparten estado, de
//! modo que el mismo parámetro puede estar registrado en un nodo y retenido
//! externamente a la vez.
//!
//! El origen de get/set puede ser:
//! - la cache (`Stored`, parámetro manual),
//! - un callable en línea (`get_cmd` / `set_cmd`, p.ej. I/O de dispositivo),
//! - el nodo dueño (`Delegated`), que registra getter/setter por nombre.
//!
//! Ningún `borrow` del estado se mantiene mientras corre un callable externo,
//! así que los delegates pueden leer y escribir otros parámetros libremente.
//! Tampoco hay guardia de reentrada: un getter que se lee a sí mismo recursa
//! hasta agotar el stack (responsabilidad del caller).

mod builder;
pub mod listener;
pub mod source;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub use builder::ParameterBuilder;
pub use listener::{Link, Listener, ListenerId};
pub use source::{GetCmd, GetSource, Parser, SetCmd, SetSource};

use crate::clock;
use crate::constants::FULL_NAME_SEPARATOR;
use crate::errors::{RegistryError, Result};
use crate::format::title_label;
use crate::node::{DelegatePair, NodeInner, ParameterNode};
use crate::value::Validator;

pub(crate) struct ParameterState {
    name: String,
    label: Option<String>,
    unit: Option<String>,
    value: Value,
    raw_value: Value,
    timestamp: Option<DateTime<Utc>>,
    get_source: GetSource,
    set_source: SetSource,
    validator: Validator,
    get_parser: Option<Parser>,
    set_parser: Option<Parser>,
    snapshot_value: bool,
    log_changes: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

struct ParameterInner {
    state: RefCell<ParameterState>,
    // Se fija en el primer attach y no cambia más.
    owner: OnceCell<Weak<NodeInner>>,
}

#[derive(Clone)]
pub struct Parameter {
    inner: Rc<ParameterInner>,
}

impl Parameter {
    /// Parámetro manual (get/set sobre la cache) sin valor inicial.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(ParameterBuilder::new(name).into_state())
    }

    /// Parámetro manual con valor inicial.
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut state = ParameterBuilder::new(name).into_state();
        let value = value.into();
        state.raw_value = value.clone();
        state.value = value;
        state.timestamp = Some(clock::now());
        Self::from_state(state)
    }

    /// Parámetro cuyo get/set vive en el nodo dueño (ver
    /// `ParameterNode::register_parameter_getter`).
    pub fn delegated(name: impl Into<String>) -> Self {
        Self::from_state(ParameterBuilder::new(name).delegated().into_state())
    }

    pub fn builder(name: impl Into<String>) -> ParameterBuilder {
        ParameterBuilder::new(name)
    }

    pub(crate) fn from_state(state: ParameterState) -> Self {
        Self { inner: Rc::new(ParameterInner { state: RefCell::new(state),
                                               owner: OnceCell::new() }) }
    }

    pub fn name(&self) -> String {
        self.inner.state.borrow().name.clone()
    }

    /// Ruta desde la raíz hasta el dueño, más el nombre propio, unida con `_`.
    ///
    /// Se calcula en cada llamada, por lo que siempre refleja los nombres
    /// actuales de los ancestros. Nodos sin nombre no aportan segmento.
    pub fn full_name(&self) -> String {
        let name = self.name();
        match self.owner() {
            Some(owner) => {
                let mut parts = owner.path();
                parts.push(name);
                parts.join(FULL_NAME_SEPARATOR)
            }
            None => name,
        }
    }

    pub fn label(&self) -> String {
        let state = self.inner.state.borrow();
        state.label.clone().unwrap_or_else(|| title_label(&state.name))
    }

    pub fn unit(&self) -> Option<String> {
        self.inner.state.borrow().unit.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.inner.state.borrow_mut().label = Some(label.into());
    }

    pub fn set_unit(&self, unit: impl Into<String>) {
        self.inner.state.borrow_mut().unit = Some(unit.into());
    }

    pub fn validator(&self) -> Validator {
        self.inner.state.borrow().validator.clone()
    }

    pub fn set_log_changes(&self, log_changes: bool) {
        self.inner.state.borrow_mut().log_changes = log_changes;
    }

    pub fn snapshot_value(&self) -> bool {
        self.inner.state.borrow().snapshot_value
    }

    /// Último valor materializado, sin ejecutar get.
    pub fn get_latest(&self) -> Value {
        self.inner.state.borrow().value.clone()
    }

    /// Último valor raw materializado, sin ejecutar get.
    pub fn raw_value(&self) -> Value {
        self.inner.state.borrow().raw_value.clone()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.inner.state.borrow().timestamp
    }

    /// Nodo dueño, si existe y sigue vivo.
    pub fn owner(&self) -> Option<ParameterNode> {
        self.inner.owner.get().and_then(Weak::upgrade).map(ParameterNode::from_inner)
    }

    pub fn is_owned_by(&self, node: &ParameterNode) -> bool {
        self.inner
            .owner
            .get()
            .is_some_and(|w| std::ptr::eq(w.as_ptr(), Rc::as_ptr(node.inner())))
    }

    /// Identidad de handle (no igualdad de valores).
    pub fn ptr_eq(&self, other: &Parameter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registra el dueño si aún no lo tiene y, si el dueño es `node`, adopta
    /// `name`. Devuelve si `node` es (ahora) el dueño.
    pub(crate) fn attach(&self, node: &ParameterNode, name: &str) -> bool {
        let first = self.inner.owner.set(Rc::downgrade(node.inner())).is_ok();
        if !self.is_owned_by(node) {
            warn!("parameter '{}' already attached elsewhere; keeping its owner", self.full_name());
            return false;
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.name = name.to_string();
            if first && node.config().log_changes {
                state.log_changes = true;
            }
        }
        if first {
            debug!("attached parameter '{}'", self.full_name());
        }
        true
    }

    /// Ejecuta el get y actualiza cache y timestamp.
    pub fn get(&self) -> Result<Value> {
        let source = self.inner.state.borrow().get_source.clone();
        match source {
            GetSource::Stored => {
                let mut state = self.inner.state.borrow_mut();
                state.timestamp = Some(clock::now());
                Ok(state.value.clone())
            }
            GetSource::Inline(cmd) => {
                let raw = cmd()?;
                self.materialize(raw)
            }
            GetSource::Delegated => {
                let (node, pair) = self.delegates("get")?;
                let getter = pair.getter.ok_or_else(|| self.not_registered("get"))?;
                let raw = getter(&node, self)?;
                self.materialize(raw)
            }
        }
    }

    /// Ejecuta el set: valida, aplica `set_parser`, escribe según el origen y
    /// notifica a los listeners con el valor materializado.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let source = self.inner.state.borrow().set_source.clone();
        match source {
            SetSource::Disabled => return Err(self.read_only()),
            SetSource::Stored => {
                let raw = self.prepare(&value)?;
                self.store(raw, value);
            }
            SetSource::Inline(cmd) => {
                let raw = self.prepare(&value)?;
                cmd(raw.clone())?;
                self.store(raw, value);
            }
            SetSource::Delegated => {
                let (node, pair) = self.delegates("set")?;
                let setter = match (&pair.getter, pair.setter) {
                    (_, Some(setter)) => setter,
                    (Some(_), None) => return Err(self.read_only()),
                    (None, None) => return Err(self.not_registered("set")),
                };
                let raw = self.prepare(&value)?;
                setter(&node, self, raw)?;
                // El setter no cachea: refrescamos desde la representación subyacente.
                match pair.getter {
                    Some(getter) => {
                        let fresh = getter(&node, self)?;
                        self.materialize(fresh)?;
                    }
                    None => self.inner.state.borrow_mut().timestamp = Some(clock::now()),
                }
            }
        }
        self.emit()
    }

    /// Get seguido de notificación a listeners si el valor cambió.
    pub fn update(&self) -> Result<Value> {
        let previous = self.get_latest();
        let value = self.get()?;
        if value != previous {
            self.emit()?;
        }
        Ok(value)
    }

    /// Enlaza `target`: cada valor emitido se escribe en él tras `scale`/`offset`.
    pub fn connect(&self, target: &Parameter, link: Link) -> Result<()> {
        self.push_listener(Listener::Parameter { target: target.clone(), link });
        if link.update {
            let current = self.get_latest();
            if !current.is_null() {
                target.set(link.apply(&current))?;
            }
        }
        Ok(())
    }

    /// Registra un callback; el id devuelto permite quitarlo con `disconnect`.
    pub fn connect_fn<F>(&self, callback: F) -> ListenerId
        where F: Fn(&Value) -> Result<()> + 'static
    {
        self.push_listener(Listener::Callback(Rc::new(callback)))
    }

    /// Quita un listener; `false` si ya no estaba.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }

    pub fn disconnect_all(&self) {
        self.inner.state.borrow_mut().listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.borrow().listeners.len()
    }

    fn push_listener(&self, listener: Listener) -> ListenerId {
        let mut state = self.inner.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, listener));
        id
    }

    fn delegates(&self, operation: &str) -> Result<(ParameterNode, DelegatePair)> {
        let node = self.owner().ok_or_else(|| self.not_registered(operation))?;
        let pair = node.delegates_for(&self.name());
        Ok((node, pair))
    }

    fn prepare(&self, value: &Value) -> Result<Value> {
        let (validator, parser) = {
            let state = self.inner.state.borrow();
            (state.validator.clone(), state.set_parser.clone())
        };
        validator.validate(value)
                 .map_err(|reason| RegistryError::ValidationFailed { parameter: self.full_name(),
                                                                     reason })?;
        match parser {
            Some(parse) => parse(value.clone()),
            None => Ok(value.clone()),
        }
    }

    fn materialize(&self, raw: Value) -> Result<Value> {
        let parser = self.inner.state.borrow().get_parser.clone();
        let value = match parser {
            Some(parse) => parse(raw.clone())?,
            None => raw.clone(),
        };
        self.store(raw, value.clone());
        Ok(value)
    }

    fn store(&self, raw: Value, value: Value) {
        let log_change = {
            let state = self.inner.state.borrow();
            state.log_changes && state.value != value
        };
        if log_change {
            debug!("parameter '{}' changed from {} to {}", self.full_name(), self.get_latest(), value);
        }
        let mut state = self.inner.state.borrow_mut();
        state.raw_value = raw;
        state.value = value;
        state.timestamp = Some(clock::now());
    }

    fn emit(&self) -> Result<()> {
        let (listeners, value) = {
            let state = self.inner.state.borrow();
            (state.listeners.clone(), state.value.clone())
        };
        listeners.iter().try_for_each(|(_, l)| l.notify(&value))
    }

    fn read_only(&self) -> RegistryError {
        RegistryError::ReadOnly { parameter: self.full_name() }
    }

    fn not_registered(&self, operation: &str) -> RegistryError {
        RegistryError::DelegateNotRegistered { parameter: self.full_name(),
                                               operation: operation.to_string() }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Parameter")
         .field("name", &state.name)
         .field("value", &state.value)
         .field("get", &state.get_source)
         .field("set", &state.set_source)
         .finish()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
