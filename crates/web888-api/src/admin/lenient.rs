// Lenient `deserialize_with` helpers for admin payloads.
//
// Firmware revisions disagree on scalar encodings: counters arrive as
// numbers or numeric strings, flags as booleans or 0/1. Each helper reads a
// `serde_json::Value` and yields `None` instead of an error when the value
// has an unexpected shape, so one odd field never discards a whole message.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_i64(&value).and_then(|n| T::try_from(n).ok()))
}

pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_f64(&value))
}

pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_bool(&value))
}

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_string(&value))
}

pub fn floats<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(items.iter().filter_map(as_f64).collect()),
        _ => None,
    })
}

/// Nested object that is dropped (not fatal) when it has the wrong shape.
pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_object() {
        Ok(serde_json::from_value(value).ok())
    } else {
        Ok(None)
    }
}

/// Array whose malformed elements are skipped individually.
pub fn list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

// ── Value coercions ──────────────────────────────────────────────────

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .and_then(|f| format!("{f:.0}").parse().ok())
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .and_then(|f| format!("{f:.0}").parse().ok())
            })
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "int")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "flag")]
        enabled: Option<bool>,
        #[serde(default, deserialize_with = "text")]
        serial: Option<String>,
        #[serde(default, deserialize_with = "floats")]
        loads: Option<Vec<f64>>,
    }

    #[test]
    fn accepts_alternate_encodings() {
        let s: Sample = serde_json::from_value(json!({
            "count": "42",
            "enabled": 1,
            "serial": 24_120_097,
            "loads": [1, "2.5", null, 3.0]
        }))
        .unwrap();
        assert_eq!(s.count, Some(42));
        assert_eq!(s.enabled, Some(true));
        assert_eq!(s.serial.as_deref(), Some("24120097"));
        assert_eq!(s.loads, Some(vec![1.0, 2.5, 3.0]));
    }

    #[test]
    fn odd_values_become_none() {
        let s: Sample = serde_json::from_value(json!({
            "count": -5,
            "enabled": {"nested": true},
            "serial": null,
            "loads": "n/a"
        }))
        .unwrap();
        assert_eq!(s.count, None);
        assert_eq!(s.enabled, None);
        assert_eq!(s.serial, None);
        assert_eq!(s.loads, None);
    }

    #[test]
    fn missing_fields_default_to_none() {
        let s: Sample = serde_json::from_value(json!({})).unwrap();
        assert!(s.count.is_none() && s.enabled.is_none());
    }

    #[test]
    fn integral_floats_coerce() {
        assert_eq!(as_i64(&json!(7.0)), Some(7));
        assert_eq!(as_i64(&json!(7.5)), None);
        assert_eq!(as_i64(&json!("12.0")), Some(12));
    }
}
