//! Aritmética mínima sobre `Value` numéricos.
//!
//! Los parámetros guardan JSON; los delegates de tiempo (`t_stop - t_start`)
//! necesitan sumar y restar sin perder enteros: si ambos operandos son
//! enteros el resultado es entero, si no se opera en `f64`.

use serde_json::Value;

use crate::errors::{RegistryError, Result};

fn int_or_float(a: &Value,
                b: &Value,
                int_op: fn(i64, i64) -> Option<i64>,
                float_op: fn(f64, f64) -> f64)
                -> Option<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(r) = int_op(x, y) {
            return Some(Value::from(r));
        }
    }
    let (x, y) = (a.as_f64()?, b.as_f64()?);
    Some(Value::from(float_op(x, y)))
}

/// `a + b`, `None` si alguno no es numérico.
pub fn add(a: &Value, b: &Value) -> Option<Value> {
    int_or_float(a, b, i64::checked_add, |x, y| x + y)
}

/// `a - b`, `None` si alguno no es numérico.
pub fn sub(a: &Value, b: &Value) -> Option<Value> {
    int_or_float(a, b, i64::checked_sub, |x, y| x - y)
}

/// Aplica `value * scale + offset`. Valores no numéricos pasan sin cambios.
pub fn scale_offset(value: &Value, scale: f64, offset: f64) -> Value {
    if scale == 1.0 && offset == 0.0 {
        return value.clone();
    }
    let integral = scale.fract() == 0.0 && offset.fract() == 0.0;
    if let (Some(x), true) = (value.as_i64(), integral) {
        if let Some(r) = x.checked_mul(scale as i64).and_then(|r| r.checked_add(offset as i64)) {
            return Value::from(r);
        }
    }
    match value.as_f64() {
        Some(x) => Value::from(x * scale + offset),
        None => value.clone(),
    }
}

/// Versión de `sub` que falla con un error de delegate; útil dentro de getters.
pub fn require_sub(a: &Value, b: &Value) -> Result<Value> {
    sub(a, b).ok_or_else(|| RegistryError::delegate(format!("cannot subtract {b} from {a}")))
}

/// Versión de `add` que falla con un error de delegate.
pub fn require_add(a: &Value, b: &Value) -> Result<Value> {
    add(a, b).ok_or_else(|| RegistryError::delegate(format!("cannot add {a} and {b}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_operands_stay_integers() {
        assert_eq!(sub(&json!(3), &json!(1)), Some(json!(2)));
        assert_eq!(add(&json!(1), &json!(5)), Some(json!(6)));
    }

    #[test]
    fn mixed_operands_use_floats() {
        assert_eq!(add(&json!(1), &json!(0.5)), Some(json!(1.5)));
        assert_eq!(sub(&json!("x"), &json!(1)), None);
        assert!(require_sub(&Value::Null, &json!(1)).is_err());
    }

    #[test]
    fn scale_offset_keeps_integers_when_possible() {
        assert_eq!(scale_offset(&json!(1), 1.0, 5.0), json!(6));
        assert_eq!(scale_offset(&json!(2), 0.5, 0.0), json!(1.0));
        assert_eq!(scale_offset(&json!("on"), 2.0, 1.0), json!("on"));
    }
}
