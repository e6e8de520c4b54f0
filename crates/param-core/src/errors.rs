//! Errores del registro de parámetros.
//!
//! Todos los errores se devuelven al caller; el core nunca reintenta una
//! operación (un `set` no es idempotente en general).

use thiserror::Error;

/// Resultado estándar del core.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RegistryError {
    /// El nombre ya está ocupado por un miembro de otro tipo en el mismo nodo.
    #[error("name '{name}' on node '{node}' is already bound to a {existing}")]
    NameCollision { node: String, name: String, existing: String },
    #[error("parameter '{parameter}' is read-only")]
    ReadOnly { parameter: String },
    #[error("node '{node}' has no attribute '{name}'")]
    AttributeNotFound { node: String, name: String },
    /// Parámetro delegado sin getter/setter registrado en su nodo (o sin nodo).
    #[error("no {operation} delegate registered for parameter '{parameter}'")]
    DelegateNotRegistered { parameter: String, operation: String },
    #[error("invalid value for parameter '{parameter}': {reason}")]
    ValidationFailed { parameter: String, reason: String },
    /// El nodo a colgar es el propio nodo o ya lo contiene en su subárbol.
    #[error("cannot attach '{name}' below '{node}': it already contains '{node}'")]
    CyclicAttachment { node: String, name: String },
    #[error("node '{node}' has no function '{name}'")]
    FunctionNotFound { node: String, name: String },
    /// Fallo dentro de un callable externo (get_cmd, set_cmd, parser, delegate).
    #[error("delegate failed: {0}")]
    Delegate(String),
}

impl RegistryError {
    /// Atajo para envolver errores de callables externos (I/O de dispositivo, etc.).
    pub fn delegate(msg: impl Into<String>) -> Self {
        Self::Delegate(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_collision_message_mentions_both_sides() {
        let err = RegistryError::NameCollision { node: "pulse".into(),
                                                 name: "t_start".into(),
                                                 existing: "parameter".into() };
        assert_eq!(err.to_string(), "name 't_start' on node 'pulse' is already bound to a parameter");
    }

    #[test]
    fn delegate_helper_wraps_message() {
        let err = RegistryError::delegate("device offline");
        assert_eq!(err, RegistryError::Delegate("device offline".into()));
        assert_eq!(err.to_string(), "delegate failed: device offline");
    }
}
