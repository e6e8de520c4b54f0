//! paramtree: aplicación sobre el registro jerárquico de parámetros.
//!
//! - `config`: configuración de proceso leída del entorno (`CONFIG`).
//! - `errors`: error de aplicación que envuelve los errores del core y del dominio.
//! - `demo`: estación de ejemplo (secuencia de pulsos + instrumento simulado).
//! - `cli`: parseo de argumentos del binario.
//!
//! El core vive en `param-core` y los nodos de dominio en `param-domain`.

pub mod cli;
pub mod config;
pub mod demo;
pub mod errors;

pub use config::{AppConfig, CONFIG};
pub use demo::{OutputFormat, RenderOptions, Station};
pub use errors::AppError;
