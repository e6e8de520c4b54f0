//! Instrumento simulado: parámetros cuyo get/set es I/O contra un backend
//! en memoria.
//!
//! El backend imita un dispositivo con registros direccionables
//! (`*IDN`, `ch1:volt`, ...). Puede ponerse offline para ejercitar la
//! propagación de errores de dispositivo: toda lectura o escritura falla con
//! `RegistryError::Delegate`.

use indexmap::IndexMap;
use log::{debug, warn};
use param_core::{NodeConfig, Parameter, ParameterNode, RegistryError, Validator};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::DomainError;

pub const INSTRUMENT_CLASS: &str = "SimulatedInstrument";
pub const CHANNEL_CLASS: &str = "Channel";

/// Límite de tensión de salida de cada canal (V).
pub const MAX_VOLTAGE: f64 = 10.0;

#[derive(Debug, Default)]
struct BackendState {
    registers: IndexMap<String, Value>,
    online: bool,
    writes: usize,
}

/// Dispositivo en memoria compartido por los parámetros del instrumento.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    state: Rc<RefCell<BackendState>>,
}

impl SimulatedBackend {
    pub fn new(idn: &str) -> Self {
        let mut registers = IndexMap::new();
        registers.insert("*IDN".to_string(), Value::from(idn));
        Self { state: Rc::new(RefCell::new(BackendState { registers,
                                                          online: true,
                                                          writes: 0 })) }
    }

    pub fn read(&self, address: &str) -> param_core::Result<Value> {
        let state = self.state.borrow();
        if !state.online {
            return Err(RegistryError::delegate(format!("backend offline while reading '{address}'")));
        }
        Ok(state.registers.get(address).cloned().unwrap_or(Value::Null))
    }

    pub fn write(&self, address: &str, value: Value) -> param_core::Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.online {
            return Err(RegistryError::delegate(format!("backend offline while writing '{address}'")));
        }
        state.registers.insert(address.to_string(), value);
        state.writes += 1;
        Ok(())
    }

    pub fn set_online(&self, online: bool) {
        if !online {
            warn!("simulated backend going offline");
        }
        self.state.borrow_mut().online = online;
    }

    /// Lee un registro sin pasar por el chequeo de conexión.
    pub fn peek(&self, address: &str) -> Option<Value> {
        self.state.borrow().registers.get(address).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedInstrument {
    node: ParameterNode,
    backend: SimulatedBackend,
}

impl SimulatedInstrument {
    /// Instrumento con `channels` canales (`ch1`..`chN`) como submódulos.
    pub fn new(name: &str, channels: usize, backend: SimulatedBackend) -> Result<Self, DomainError> {
        let node = ParameterNode::with_config(Some(name), NodeConfig::default().with_class_name(INSTRUMENT_CLASS));

        let io = backend.clone();
        node.add_parameter(Parameter::builder("idn").label("Identification")
                                                    .get_cmd(move || io.read("*IDN"))
                                                    .build()?)?;

        for index in 1..=channels {
            let channel = channel_node(index, &backend)?;
            node.add_submodule(&format!("ch{index}"), channel)?;
        }

        let io = backend.clone();
        node.add_function("reset", move |_| {
                for index in 1..=channels {
                    io.write(&format!("ch{index}:volt"), json!(0))?;
                    io.write(&format!("ch{index}:coupling"), json!("DC"))?;
                }
                Ok(Value::Null)
            })?;

        let settings = node.add_node("additional_settings", ParameterNode::root())?;
        settings.add_parameter(Parameter::builder("averages").validator(Validator::Ints { min: Some(1),
                                                                                          max: None })
                                                             .initial_value(1)
                                                             .build()?)?;
        settings.add_parameter(Parameter::builder("trigger_source").validator(Validator::enum_of(["internal",
                                                                                                  "external"]))
                                                                   .initial_value("internal")
                                                                   .build()?)?;

        debug!("created simulated instrument '{name}' with {channels} channels");
        Ok(Self { node, backend })
    }

    pub fn as_node(&self) -> &ParameterNode {
        &self.node
    }

    pub fn backend(&self) -> &SimulatedBackend {
        &self.backend
    }

    /// Canal `index` (base 1).
    pub fn channel(&self, index: usize) -> Result<ParameterNode, DomainError> {
        Ok(self.node.submodule(&format!("ch{index}"))?)
    }

    pub fn reset(&self) -> Result<(), DomainError> {
        self.node.call("reset", &[])?;
        Ok(())
    }
}

impl Deref for SimulatedInstrument {
    type Target = ParameterNode;

    fn deref(&self) -> &ParameterNode {
        &self.node
    }
}

/// Canal con tensión (el dispositivo trabaja en mV enteros) y acoplamiento.
fn channel_node(index: usize, backend: &SimulatedBackend) -> Result<ParameterNode, DomainError> {
    let channel = ParameterNode::with_config(None, NodeConfig::default().with_class_name(CHANNEL_CLASS));
    let volt = format!("ch{index}:volt");
    let coupling = format!("ch{index}:coupling");
    backend.write(&volt, json!(0))?;
    backend.write(&coupling, json!("DC"))?;

    let (reader, writer) = (backend.clone(), backend.clone());
    let (read_addr, write_addr) = (volt.clone(), volt);
    channel.add_parameter(Parameter::builder("voltage").unit("V")
                                                       .validator(Validator::numbers_between(-MAX_VOLTAGE, MAX_VOLTAGE))
                                                       .get_cmd(move || reader.read(&read_addr))
                                                       .set_cmd(move |raw| writer.write(&write_addr, raw))
                                                       .get_parser(millivolts_to_volts)
                                                       .set_parser(volts_to_millivolts)
                                                       .build()?)?;

    let (reader, writer) = (backend.clone(), backend.clone());
    let (read_addr, write_addr) = (coupling.clone(), coupling);
    channel.add_parameter(Parameter::builder("output_coupling").validator(Validator::enum_of(["DC", "AC"]))
                                                               .get_cmd(move || reader.read(&read_addr))
                                                               .set_cmd(move |raw| writer.write(&write_addr, raw))
                                                               .build()?)?;
    Ok(channel)
}

fn millivolts_to_volts(raw: Value) -> param_core::Result<Value> {
    match raw.as_f64() {
        Some(mv) => Ok(Value::from(mv / 1000.0)),
        None if raw.is_null() => Ok(Value::Null),
        None => Err(RegistryError::delegate(format!("unexpected voltage reading {raw}"))),
    }
}

fn volts_to_millivolts(value: Value) -> param_core::Result<Value> {
    value.as_f64()
         .map(|v| Value::from((v * 1000.0).round() as i64))
         .ok_or_else(|| RegistryError::delegate(format!("voltage must be numeric, got {value}")))
}
