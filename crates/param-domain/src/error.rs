use param_core::RegistryError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum DomainError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Los pulsos de una secuencia se indexan por nombre.
    #[error("pulse has no name")]
    UnnamedPulse,
    #[error("pulse sequence already contains a pulse named '{0}'")]
    DuplicatePulse(String),
    #[error("pulse '{pulse}' overlaps with '{other}'")]
    PulseOverlap { pulse: String, other: String },
    #[error("more than one pulse found: {0}")]
    AmbiguousPulse(String),
    #[error("{0}")]
    ValidationError(String),
}
