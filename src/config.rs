//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//!
//! Variables reconocidas:
//! - `PARAMTREE_PRINT_MAX_CHARS`: ancho de la tabla legible (default 80).
//! - `PARAMTREE_LOG_CHANGES`: registra cada cambio de valor (default false).
//! - `PARAMTREE_SIMPLIFY_SNAPSHOT`: snapshot simplificado en la raíz (default false).
use log::warn;
use once_cell::sync::Lazy;
use param_core::constants::DEFAULT_MAX_CHARS;
use param_core::NodeConfig;
use std::env;

use crate::errors::AppError;

pub const ENV_PRINT_MAX_CHARS: &str = "PARAMTREE_PRINT_MAX_CHARS";
pub const ENV_LOG_CHANGES: &str = "PARAMTREE_LOG_CHANGES";
pub const ENV_SIMPLIFY_SNAPSHOT: &str = "PARAMTREE_SIMPLIFY_SNAPSHOT";

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Salida de `print_snapshot`.
    pub print: PrintConfig,
    /// Valores por defecto de los nodos creados por la aplicación.
    pub nodes: NodeDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintConfig {
    pub max_chars: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDefaults {
    pub log_changes: bool,
    pub simplify_snapshot: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { print: PrintConfig { max_chars: DEFAULT_MAX_CHARS },
               nodes: NodeDefaults::default() }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
/// Es la variante tolerante para quien usa la librería: una variable mal
/// formada se reporta con `warn!` y se usan los defaults. El binario usa
/// `AppConfig::from_env` y falla con `AppError::Config`.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
    AppConfig::from_env().unwrap_or_else(|e| {
                              warn!("{e}; using default configuration");
                              AppConfig::default()
                          })
});

impl AppConfig {
    /// Lee la configuración de las variables de entorno del proceso.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_PRINT_MAX_CHARS) {
            config.print.max_chars =
                raw.trim()
                   .parse()
                   .ok()
                   .filter(|width: &usize| *width > 0)
                   .ok_or_else(|| AppError::Config(format!("{ENV_PRINT_MAX_CHARS} must be a positive integer, got '{raw}'")))?;
        }
        if let Some(raw) = lookup(ENV_LOG_CHANGES) {
            config.nodes.log_changes = parse_flag(ENV_LOG_CHANGES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SIMPLIFY_SNAPSHOT) {
            config.nodes.simplify_snapshot = parse_flag(ENV_SIMPLIFY_SNAPSHOT, &raw)?;
        }
        Ok(config)
    }

    /// `NodeConfig` para nodos raíz creados por la aplicación.
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig::default().with_log_changes(self.nodes.log_changes)
                             .with_simplify_snapshot(self.nodes.simplify_snapshot)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AppError::Config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}
