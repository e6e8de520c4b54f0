//! CLI mínima: `paramtree [snapshot|print] [--simplify] [--update]`.

use crate::demo::{OutputFormat, RenderOptions};
use crate::errors::AppError;

pub const USAGE: &str = "usage: paramtree [snapshot|print] [--simplify] [--update]";

/// Interpreta los argumentos (sin el nombre del programa).
pub fn parse_args(args: &[String]) -> Result<RenderOptions, AppError> {
    let mut options = RenderOptions::default();
    let mut format_seen = false;
    for arg in args {
        match arg.as_str() {
            "snapshot" | "print" if !format_seen => {
                options.format = if arg == "print" { OutputFormat::Print } else { OutputFormat::Snapshot };
                format_seen = true;
            }
            "--simplify" => options.simplify = true,
            "--update" => options.update = true,
            other => return Err(AppError::Usage(format!("unexpected argument '{other}'\n{USAGE}"))),
        }
    }
    Ok(options)
}
