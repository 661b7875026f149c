//! Loose comparison of property values coming from heterogeneous backends

use serde_json::Value;

/// Render a scalar without JSON quoting (`"abc"` -> `abc`)
pub fn to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Equality used by mapping rules.
///
/// Search indexes and views disagree on whether `123` is a number or a
/// string, so numbers compare by value across both encodings. Null never
/// equals anything, including null.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(_), _) | (_, Value::Number(_)) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => a == b,
    }
}

/// Hashable key for deduplicating values that compare equal
pub fn value_key(value: &Value) -> String {
    match as_number(value) {
        Some(n) if value.is_number() => format!("n:{}", n),
        _ => format!("s:{}", to_plain_string(value)),
    }
}
