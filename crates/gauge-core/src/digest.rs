//! Canonical JSON and SHA-256 digests of domain state.
//!
//! Two states compare equal by digest when their canonical forms match:
//! object keys in byte order (the order `serde_json::Map` keeps without
//! `preserve_order`), integer-valued floats written as integers. NaN and
//! infinities are rejected.

use sha2::{Digest, Sha256};

/// Errors produced while canonicalizing a value.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("NaN/Infinity not permitted in canonical JSON")]
    NonFinite,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn normalize_value(value: &serde_json::Value) -> Result<serde_json::Value, DigestError> {
    match value {
        serde_json::Value::Object(map) => {
            let mut normalized = serde_json::Map::new();
            for (k, v) in map {
                normalized.insert(k.clone(), normalize_value(v)?);
            }
            Ok(serde_json::Value::Object(normalized))
        }
        serde_json::Value::Array(arr) => Ok(serde_json::Value::Array(
            arr.iter().map(normalize_value).collect::<Result<_, _>>()?,
        )),
        serde_json::Value::Number(n) if !(n.is_i64() || n.is_u64()) => match n.as_f64() {
            Some(f) if !f.is_finite() => Err(DigestError::NonFinite),
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                Ok(serde_json::Value::Number(serde_json::Number::from(f as i64)))
            }
            _ => Ok(serde_json::Value::Number(n.clone())),
        },
        other => Ok(other.clone()),
    }
}

/// Canonical compact JSON text for `value`.
pub fn canonical_json(value: &serde_json::Value) -> Result<String, DigestError> {
    Ok(serde_json::to_string(&normalize_value(value)?)?)
}

/// SHA-256 hex digest of the canonical form of `value`.
pub fn compute_digest(value: &serde_json::Value) -> Result<String, DigestError> {
    let canonical = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_change_digest() {
        let a = json!({"b": 1, "a": {"y": true, "x": [1, 2]}});
        let b = json!({"a": {"x": [1, 2], "y": true}, "b": 1});
        assert_eq!(compute_digest(&a).unwrap(), compute_digest(&b).unwrap());
    }

    #[test]
    fn test_keys_are_written_in_byte_order() {
        let canonical = canonical_json(&json!({"b": 1, "a": 2, "B": 3})).unwrap();
        assert_eq!(canonical, r#"{"B":3,"a":2,"b":1}"#);
    }

    #[test]
    fn test_integer_valued_float_is_normalized() {
        let canonical = canonical_json(&json!({"tokens": 10.0})).unwrap();
        assert_eq!(canonical, r#"{"tokens":10}"#);
    }

    #[test]
    fn test_fractional_float_is_kept() {
        let canonical = canonical_json(&json!({"cost": 0.25})).unwrap();
        assert_eq!(canonical, r#"{"cost":0.25}"#);
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = compute_digest(&json!({})).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_array_order_matters() {
        let a = compute_digest(&json!([1, 2])).unwrap();
        let b = compute_digest(&json!([2, 1])).unwrap();
        assert_ne!(a, b);
    }
}
