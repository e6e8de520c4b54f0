//! Listeners: propagación de valores entre parámetros.
//!
//! Un parámetro emite su valor materializado después de cada `set` exitoso
//! (y en `update` cuando el valor cambió). Los listeners pueden ser otro
//! parámetro (con `scale`/`offset`) o un callback arbitrario.
//!
//! No hay protección contra ciclos: `a -> b -> a` recursa sin fin.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use super::Parameter;
use crate::errors::Result;
use crate::value::numeric::scale_offset;

/// Opciones de un enlace parámetro -> parámetro.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub offset: f64,
    pub scale: f64,
    /// Empuja el valor actual al target en el momento de conectar.
    pub update: bool,
}

impl Default for Link {
    fn default() -> Self {
        Self { offset: 0.0,
               scale: 1.0,
               update: false }
    }
}

impl Link {
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub(crate) fn apply(&self, value: &Value) -> Value {
        scale_offset(value, self.scale, self.offset)
    }
}

pub type Callback = Rc<dyn Fn(&Value) -> Result<()>>;

/// Identifica un listener dentro de su parámetro, para `disconnect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Clone)]
pub enum Listener {
    Parameter { target: Parameter, link: Link },
    Callback(Callback),
}

impl Listener {
    pub(crate) fn notify(&self, value: &Value) -> Result<()> {
        match self {
            Self::Parameter { target, link } => target.set(link.apply(value)),
            Self::Callback(cb) => cb(value),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter { target, link } => f.debug_struct("Parameter")
                                                 .field("target", &target.full_name())
                                                 .field("link", link)
                                                 .finish(),
            Self::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}
