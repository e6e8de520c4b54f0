//! Registro de getters/setters delegados por nombre de parámetro.

use serde_json::Value;
use std::rc::Rc;

use super::ParameterNode;
use crate::errors::Result;
use crate::parameter::Parameter;

/// Getter delegado: recibe el nodo dueño y el propio parámetro.
pub type Getter = Rc<dyn Fn(&ParameterNode, &Parameter) -> Result<Value>>;
/// Setter delegado: recibe además el valor (ya validado y parseado).
pub type Setter = Rc<dyn Fn(&ParameterNode, &Parameter, Value) -> Result<()>>;

#[derive(Clone, Default)]
pub struct DelegatePair {
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
}
