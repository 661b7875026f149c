//! SQL text helpers shared by the operator families

use serde_json::Value;

use crate::error::{ConditionError, ConditionResult as Result};

/// Double-quoted identifier
pub fn quote_ident(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Single-quoted string literal
pub fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Scalar JSON value as a SQL literal
pub fn literal(value: &Value, condition: &str) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(quote_str(s)),
        Value::Array(_) | Value::Object(_) => Err(ConditionError::invalid_value(
            condition,
            "structured values have no SQL literal",
        )),
    }
}

/// Comma separated literal list for `IN (...)`
pub fn literal_list(values: &[Value], condition: &str) -> Result<String> {
    let parts: Result<Vec<String>> = values.iter().map(|v| literal(v, condition)).collect();
    Ok(parts?.join(", "))
}

/// Negated predicates also hold where the column is NULL or absent, as
/// `bool.must_not` does on the search side
pub fn or_null(field: &str, predicate: String) -> String {
    format!("({} IS NULL OR {})", quote_ident(field), predicate)
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
