//! Estación de demostración: una secuencia de pulsos y un instrumento
//! simulado colgados de un nodo raíz.
//!
//! Es lo que muestra el binario `paramtree` y sirve de ejemplo de uso del
//! registro completo (delegados, listeners, submódulos, snapshots).

use chrono::Utc;
use log::debug;
use param_core::{snapshot_fingerprint, Link, Parameter, ParameterNode, SnapshotOptions};
use param_domain::{Pulse, PulseSequence, SimulatedBackend, SimulatedInstrument};
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::errors::AppError;

pub const STATION_NAME: &str = "station";
pub const INSTRUMENT_IDN: &str = "paramtree,SIM-2CH,0001,1.0";

/// Formato de salida del binario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Snapshot JSON con fingerprint.
    #[default]
    Snapshot,
    /// Tabla legible.
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub simplify: bool,
    pub update: bool,
}

pub struct Station {
    pub root: ParameterNode,
    pub sequence: PulseSequence,
    pub instrument: SimulatedInstrument,
}

/// Salida JSON del binario.
#[derive(Debug, Serialize)]
pub struct SnapshotReport {
    pub generated_at: String,
    pub fingerprint: String,
    pub snapshot: Value,
}

impl Station {
    pub fn build(config: &AppConfig) -> Result<Self, AppError> {
        let root = ParameterNode::with_config(Some(STATION_NAME), config.node_config());
        root.add_parameter(Parameter::builder("created_at").initial_value(Utc::now().to_rfc3339())
                                                          .read_only()
                                                          .build()?)?;

        let sequence = PulseSequence::new(None)?;
        let plunge = sequence.add_pulse(Pulse::builder("plunge").t_start(0.0)
                                                               .duration(5e-3)
                                                               .amplitude(1.0)
                                                               .build()?)?;
        let read = sequence.add_pulse(Pulse::builder("read").duration(20e-3).amplitude(0.5).build()?)?;
        // `read` empieza justo cuando termina `plunge`.
        plunge.parameter("t_stop")?
              .connect(&read.parameter("t_start")?, Link::default().with_update(true))?;

        let instrument = SimulatedInstrument::new("sim", 2, SimulatedBackend::new(INSTRUMENT_IDN))?;
        instrument.channel(1)?.set("voltage", 0.25)?;

        root.add_node("sequence", sequence.as_node().clone())?;
        root.add_node("sim", instrument.as_node().clone())?;

        if config.nodes.log_changes {
            enable_change_logging(&root);
        }
        debug!("built demo station '{}'", root.display_name());
        Ok(Self { root,
                  sequence,
                  instrument })
    }

    pub fn render(&self, options: &RenderOptions, config: &AppConfig) -> Result<String, AppError> {
        match options.format {
            OutputFormat::Snapshot => {
                let snapshot_options = SnapshotOptions { simplify: options.simplify.then_some(true),
                                                         update: options.update };
                let snapshot = self.root.snapshot_with(snapshot_options)?;
                let report = SnapshotReport { generated_at: Utc::now().to_rfc3339(),
                                              fingerprint: snapshot_fingerprint(&snapshot),
                                              snapshot: Value::Object(snapshot) };
                Ok(serde_json::to_string_pretty(&report)?)
            }
            OutputFormat::Print => Ok(self.root.format_snapshot(options.update, config.print.max_chars)?),
        }
    }
}

/// Activa `log_changes` en todos los parámetros del árbol.
fn enable_change_logging(node: &ParameterNode) {
    for (_, parameter) in node.parameters() {
        parameter.set_log_changes(true);
    }
    for (_, child) in node.parameter_nodes().into_iter().chain(node.submodules()) {
        enable_change_logging(&child);
    }
}
