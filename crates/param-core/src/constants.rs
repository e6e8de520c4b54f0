//! Constantes del registro.
//!
//! Las claves de snapshot forman parte del contrato observable: consumidores
//! externos (front-ends, persistencia de configuraciones) dependen de ellas.

/// Clave del tag de tipo en cada snapshot de nodo o parámetro.
pub const CLASS_KEY: &str = "__class__";

/// Tag de tipo por defecto de un `ParameterNode`.
pub const NODE_CLASS: &str = "ParameterNode";

/// Tag de tipo de un `Parameter`.
pub const PARAMETER_CLASS: &str = "Parameter";

/// Tag de tipo de una función registrada en un nodo.
pub const FUNCTION_CLASS: &str = "Function";

/// Separador usado al construir `full_name` (`pulse1_amplitude`).
pub const FULL_NAME_SEPARATOR: &str = "_";

/// Formato de timestamps en snapshots.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Ancho por defecto de la tabla de `print_snapshot`.
pub const DEFAULT_MAX_CHARS: usize = 80;

/// Límite del ancho de la columna de nombres en `print_snapshot`.
pub const MAX_NAME_FIELD: usize = 50;
