use param_core::RegistryError;
use param_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de registro: {0}")]
    Registry(#[from] RegistryError),
    #[error("Error de dominio: {0}")]
    Domain(#[from] DomainError),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Uso inválido: {0}")]
    Usage(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de serialización: {0}")]
    Serialization(#[from] serde_json::Error),
}
