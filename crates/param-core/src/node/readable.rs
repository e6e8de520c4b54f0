//! Tabla legible del estado de un árbol de nodos.
//!
//! Sólo para humanos: no es un formato pensado para volver a parsearse.
//!
//! ```text
//! pulse:
//! 	parameter value
//! --------------------------------------------------------------------------------
//! t_start  :	1 (s)
//! ```

use serde_json::Value;

use super::ParameterNode;
use crate::constants::MAX_NAME_FIELD;
use crate::errors::Result;

const NOT_AVAILABLE: &str = "Not available";

impl ParameterNode {
    /// Renderiza este nodo y, a continuación, cada hijo y submódulo.
    pub fn format_snapshot(&self, update: bool, max_chars: usize) -> Result<String> {
        let mut out = String::new();
        self.write_readable(&mut out, update, max_chars)?;
        Ok(out)
    }

    pub fn print_snapshot(&self, update: bool, max_chars: usize) -> Result<()> {
        print!("{}", self.format_snapshot(update, max_chars)?);
        Ok(())
    }

    fn write_readable(&self, out: &mut String, update: bool, max_chars: usize) -> Result<()> {
        let parameters = self.parameters();
        let field_len = parameters.iter()
                                  .map(|(name, _)| name.chars().count() + 1)
                                  .max()
                                  .unwrap_or(0)
                                  .min(MAX_NAME_FIELD);

        out.push_str(&format!("{}:\n", self.display_name()));
        out.push_str(&format!("{:<field_len$}value\n", "\tparameter "));
        out.push_str(&"-".repeat(max_chars));
        out.push('\n');

        for (name, parameter) in parameters {
            let mut row = format!("{name:<field_len$}:");
            if parameter.snapshot_value() {
                if update {
                    parameter.get()?;
                }
                row.push_str(&format!("\t{} ", display_value(&parameter.get_latest())));
            } else {
                row.push_str(&format!("\t{NOT_AVAILABLE} "));
            }
            if let Some(unit) = parameter.unit() {
                row.push_str(&format!("({unit})"));
            }
            out.push_str(truncate(row.trim_end(), max_chars).as_str());
            out.push('\n');
        }

        for (_, child) in self.parameter_nodes().into_iter().chain(self.submodules()) {
            child.write_readable(out, update, max_chars)?;
        }
        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn truncate(row: &str, max_chars: usize) -> String {
    if row.chars().count() <= max_chars || max_chars < 3 {
        return row.to_string();
    }
    let mut cut: String = row.chars().take(max_chars - 3).collect();
    cut.push_str("...");
    cut
}
