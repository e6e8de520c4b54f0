//! param-core: registro jerárquico de parámetros.
//!
//! Un árbol de `ParameterNode` con `Parameter` como hojas. El core es neutral:
//! no conoce instrumentos ni pulsos, sólo nombres, valores JSON, get/set
//! (guardados, en línea o delegados al nodo) y snapshots.
//!
//! Todo es single-thread (`Rc`/`RefCell`): los handles no son `Send` ni
//! `Sync`; quien necesite acceso concurrente debe serializarlo afuera.
pub mod clock;
pub mod constants;
pub mod errors;
pub mod format;
pub mod hashing;
pub mod node;
pub mod parameter;
pub mod value;

pub use errors::{RegistryError, Result};
pub use hashing::snapshot_fingerprint;
pub use node::snapshot::{Snapshot, SnapshotOptions};
pub use node::{Attribute, Member, MemberKind, NodeConfig, ParameterNode};
pub use parameter::{Link, ListenerId, Parameter, ParameterBuilder};
pub use value::Validator;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Escenario base: t_start/t_stop manuales y duration delegado.
    #[test]
    fn duration_tracks_stop_and_keeps_start_fixed() {
        let node = ParameterNode::with_config(Some("pulse"), NodeConfig::default().with_use_as_attributes(true));
        node.add_parameter(Parameter::with_value("t_start", 1)).unwrap();
        node.add_parameter(Parameter::with_value("t_stop", 3)).unwrap();
        node.add_parameter(Parameter::delegated("duration")).unwrap();
        node.register_parameter_getter("duration", |n, _| {
                let stop = n.get("t_stop")?;
                let start = n.get("t_start")?;
                value::numeric::require_sub(&stop, &start)
            });
        node.register_parameter_setter("duration", |n, _, duration| {
                let start = n.get("t_start")?;
                n.set("t_stop", value::numeric::require_add(&start, &duration)?)
            });

        assert_eq!(node.get_attr("duration").unwrap().into_value(), Some(json!(2)));
        node.set_attr("duration", 5).unwrap();
        assert_eq!(node.get("t_stop").unwrap(), json!(6));
        assert_eq!(node.get("t_start").unwrap(), json!(1));
        assert_eq!(node.get("duration").unwrap(), json!(5));
    }
}
