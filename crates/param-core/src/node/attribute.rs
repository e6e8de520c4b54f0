//! Valores polimórficos de la resolución por atributo.

use serde_json::Value;
use std::fmt;

use super::ParameterNode;
use crate::parameter::Parameter;

/// Resultado de `get_attr` y argumento de `set_attr`.
///
/// Al escribir, `Value` y `Field` se tratan igual: un valor que no es
/// parámetro ni nodo (se reenvía al `set` del parámetro si el nodo usa
/// `use_as_attributes`, si no se guarda como campo).
#[derive(Debug, Clone)]
pub enum Attribute {
    /// Valor obtenido reenviando a `Parameter::get`.
    Value(Value),
    Parameter(Parameter),
    Node(ParameterNode),
    /// Campo ordinario del nodo (fuera del modelo de parámetros).
    Field(Value),
}

impl Attribute {
    /// Valor plano si el atributo es `Value` o `Field`.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) | Self::Field(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) | Self::Field(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            Self::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&ParameterNode> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Parameter> for Attribute {
    fn from(p: Parameter) -> Self {
        Self::Parameter(p)
    }
}

impl From<ParameterNode> for Attribute {
    fn from(n: ParameterNode) -> Self {
        Self::Node(n)
    }
}

impl From<Value> for Attribute {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! attribute_from_scalar {
    ($($t:ty),*) => {
        $(impl From<$t> for Attribute {
            fn from(v: $t) -> Self { Self::Value(Value::from(v)) }
        })*
    };
}

attribute_from_scalar!(bool, i32, i64, u32, u64, f64, &str, String);

/// Resultado del acceso por índice: siempre el objeto crudo.
#[derive(Debug, Clone)]
pub enum Member {
    Parameter(Parameter),
    Node(ParameterNode),
}

impl Member {
    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            Self::Parameter(p) => Some(p),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&ParameterNode> {
        match self {
            Self::Node(n) => Some(n),
            Self::Parameter(_) => None,
        }
    }
}

/// Tipo de miembro que ocupa un nombre dentro de un nodo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Parameter,
    ParameterNode,
    Function,
    Submodule,
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parameter => "parameter",
            Self::ParameterNode => "parameter node",
            Self::Function => "function",
            Self::Submodule => "submodule",
            Self::Field => "field",
        };
        f.write_str(s)
    }
}
