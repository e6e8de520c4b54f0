//! Validadores de valores aplicados en `Parameter::set`.
//!
//! `Value::Null` siempre es aceptado: un parámetro puede volver a "sin valor".

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Validator {
    #[default]
    Anything,
    Bool,
    /// Cualquier número, con límites inclusivos opcionales.
    Numbers { min: Option<f64>, max: Option<f64> },
    /// Sólo enteros, con límites inclusivos opcionales.
    Ints { min: Option<i64>, max: Option<i64> },
    Strings,
    /// El valor debe ser igual a uno de los listados.
    Enum(Vec<Value>),
    /// Lista; si hay validador interno se aplica a cada elemento.
    Lists(Option<Box<Validator>>),
}

impl Validator {
    pub fn numbers() -> Self {
        Self::Numbers { min: None, max: None }
    }

    pub fn numbers_between(min: f64, max: f64) -> Self {
        Self::Numbers { min: Some(min), max: Some(max) }
    }

    pub fn ints() -> Self {
        Self::Ints { min: None, max: None }
    }

    pub fn enum_of<I, V>(values: I) -> Self
        where I: IntoIterator<Item = V>,
              V: Into<Value>
    {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn lists_of(inner: Validator) -> Self {
        Self::Lists(Some(Box::new(inner)))
    }

    /// Devuelve `Err(reason)` si el valor no cumple.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Anything => Ok(()),
            Self::Bool => match value {
                Value::Bool(_) => Ok(()),
                other => Err(format!("{other} is not a boolean")),
            },
            Self::Numbers { min, max } => {
                let x = value.as_f64().ok_or_else(|| format!("{value} is not a number"))?;
                check_range(x, *min, *max, value)
            }
            Self::Ints { min, max } => {
                let x = value.as_i64().ok_or_else(|| format!("{value} is not an integer"))?;
                check_range(x, *min, *max, value)
            }
            Self::Strings => match value {
                Value::String(_) => Ok(()),
                other => Err(format!("{other} is not a string")),
            },
            Self::Enum(allowed) => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    Err(format!("{value} is not one of {}", Value::Array(allowed.clone())))
                }
            }
            Self::Lists(inner) => {
                let items = value.as_array().ok_or_else(|| format!("{value} is not a list"))?;
                match inner {
                    Some(v) => items.iter().try_for_each(|item| v.validate(item)),
                    None => Ok(()),
                }
            }
        }
    }
}

fn check_range<T: PartialOrd + fmt::Display>(x: T, min: Option<T>, max: Option<T>, raw: &Value) -> Result<(), String> {
    if let Some(min) = min {
        if x < min {
            return Err(format!("{raw} is smaller than the minimum {min}"));
        }
    }
    if let Some(max) = max {
        if x > max {
            return Err(format!("{raw} is larger than the maximum {max}"));
        }
    }
    Ok(())
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anything => write!(f, "<Anything>"),
            Self::Bool => write!(f, "<Bool>"),
            Self::Numbers { min, max } => write!(f, "<Numbers {min:?}..{max:?}>"),
            Self::Ints { min, max } => write!(f, "<Ints {min:?}..{max:?}>"),
            Self::Strings => write!(f, "<Strings>"),
            Self::Enum(values) => write!(f, "<Enum {}>", Value::Array(values.clone())),
            Self::Lists(Some(inner)) => write!(f, "<Lists of {inner}>"),
            Self::Lists(None) => write!(f, "<Lists>"),
        }
    }
}
