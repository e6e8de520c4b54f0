//! Utilidades sobre valores de parámetros (`serde_json::Value`).

pub mod numeric;
pub mod validator;

pub use validator::Validator;
