//! Order- and representation-insensitive byte encoding.
//!
//! Operates over `serde_json::Value`, which is already a closed algebraic
//! value type (null | bool | number | string | sequence | string-keyed map).
//! Any type that fails to convert into a `Value` — chiefly non-finite floats,
//! since `serde_json` rejects `NaN`/`Infinity` — surfaces as
//! `GeoBatchError::Encode`.

use geobatch_error::GeoBatchError;
use serde::Serialize;
use serde_json::Value;

/// Converts `value` to `serde_json::Value` then encodes it canonically.
pub fn canonical<T: Serialize>(value: &T) -> Result<Vec<u8>, GeoBatchError> {
    let value =
        serde_json::to_value(value).map_err(|e| GeoBatchError::encode(e.to_string()))?;
    canonical_value(&value)
}

/// Encodes an already-constructed `Value` canonically.
pub fn canonical_value(value: &Value) -> Result<Vec<u8>, GeoBatchError> {
    let mut out = Vec::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<(), GeoBatchError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => out.extend_from_slice(canonical_number(n)?.as_bytes()),
        Value::String(s) => out.extend_from_slice(canonical_string(s).as_bytes()),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            out.push(b'{');
            // serde_json's default (non-`preserve_order`) map is already a
            // BTreeMap, but we sort explicitly so the guarantee does not
            // depend on that cargo feature staying off.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(canonical_string(key).as_bytes());
                out.push(b':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

/// `1` and `1.0` must canonicalize identically: any number whose mathematical
/// value is an integer is written as bare digits, everything else uses a
/// single fixed textual form (shortest round-tripping decimal via `ryu`).
fn canonical_number(n: &serde_json::Number) -> Result<String, GeoBatchError> {
    if let Some(i) = n.as_i64() {
        return Ok(i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.to_string());
    }
    let f = n
        .as_f64()
        .ok_or_else(|| GeoBatchError::encode("number is neither integer nor finite float"))?;
    if !f.is_finite() {
        return Err(GeoBatchError::encode(format!(
            "non-finite number cannot be canonicalized: {f}"
        )));
    }
    if f.fract() == 0.0 && f.abs() < 1e18 {
        return Ok(format!("{}", f as i64));
    }
    let mut buf = ryu::Buffer::new();
    Ok(buf.format(f).to_string())
}

fn canonical_string(s: &str) -> String {
    // serde_json's string serializer already implements standard JSON
    // escaping; reuse it instead of hand-rolling escape rules.
    serde_json::to_string(s).expect("string serialization is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_key_order_does_not_affect_output() {
        let a = json!({"a": 1, "b": [2, 3]});
        let b = json!({"b": [2, 3], "a": 1});
        assert_eq!(canonical_value(&a).unwrap(), canonical_value(&b).unwrap());
    }

    #[test]
    fn integer_and_float_forms_match() {
        let a = canonical_value(&json!(1)).unwrap();
        let b = canonical_value(&json!(1.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, b"1");
    }

    #[test]
    fn non_integral_float_uses_fixed_form() {
        let out = canonical_value(&json!(1.5)).unwrap();
        assert_eq!(out, b"1.5");
    }

    #[test]
    fn sequences_preserve_order() {
        let out = canonical_value(&json!([3, 1, 2])).unwrap();
        assert_eq!(out, b"[3,1,2]");
    }

    #[test]
    fn nan_is_rejected() {
        #[derive(serde::Serialize)]
        struct Wrap {
            v: f64,
        }
        let err = canonical(&Wrap { v: f64::NAN }).unwrap_err();
        assert!(matches!(err, GeoBatchError::Encode(_)));
    }

    #[test]
    fn nested_maps_sort_recursively() {
        let a = json!({"outer": {"z": 1, "a": 2}});
        let b = json!({"outer": {"a": 2, "z": 1}});
        assert_eq!(canonical_value(&a).unwrap(), canonical_value(&b).unwrap());
    }
}
