//! Origen de los valores de un parámetro en get y set.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::errors::Result;

/// Callable de lectura en línea (típicamente I/O de dispositivo).
pub type GetCmd = Rc<dyn Fn() -> Result<Value>>;
/// Callable de escritura en línea; recibe el valor raw.
pub type SetCmd = Rc<dyn Fn(Value) -> Result<()>>;
/// Transformación raw <-> value.
pub type Parser = Rc<dyn Fn(Value) -> Result<Value>>;

#[derive(Clone)]
pub enum GetSource {
    /// Devuelve el valor cacheado (parámetro manual).
    Stored,
    Inline(GetCmd),
    /// Getter registrado en el nodo dueño bajo el nombre del parámetro.
    Delegated,
}

#[derive(Clone)]
pub enum SetSource {
    /// Guarda el valor en la cache.
    Stored,
    Inline(SetCmd),
    /// Setter registrado en el nodo dueño bajo el nombre del parámetro.
    Delegated,
    /// Sin capacidad de escritura.
    Disabled,
}

impl fmt::Debug for GetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => write!(f, "Stored"),
            Self::Inline(_) => write!(f, "Inline(..)"),
            Self::Delegated => write!(f, "Delegated"),
        }
    }
}

impl fmt::Debug for SetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => write!(f, "Stored"),
            Self::Inline(_) => write!(f, "Inline(..)"),
            Self::Delegated => write!(f, "Delegated"),
            Self::Disabled => write!(f, "Disabled"),
        }
    }
}
