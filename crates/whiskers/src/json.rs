/*
 * json.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion from `serde_json::Value`.
//!
//! Numbers become `Int` when they fit `i64`, otherwise `Float`. Data
//! that already exists as JSON can be rendered directly:
//!
//! ```
//! use whiskers::{Template, Value};
//!
//! let data = Value::from(serde_json::json!({"name": "world"}));
//! let t = Template::compile("hello {{name}}").unwrap();
//! assert_eq!(t.render(&data).unwrap(), "hello world");
//! ```

use crate::value::Value;

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Value {
        Value::from(v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::object;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_shapes_convert() {
        let v = Value::from(serde_json::json!({
            "null": null,
            "flag": true,
            "count": 3,
            "ratio": 2.5,
            "name": "x",
            "items": [1, 2],
        }));
        let expected = object([
            ("null", Value::Null),
            ("flag", Value::Bool(true)),
            ("count", Value::Int(3)),
            ("ratio", Value::Float(2.5)),
            ("name", Value::from("x")),
            ("items", Value::List(vec![Value::Int(1), Value::Int(2)])),
        ]);
        assert_eq!(v, expected);
    }

    #[test]
    fn large_numbers_become_floats() {
        let v = Value::from(serde_json::json!(1.0e300));
        assert_eq!(v, Value::Float(1.0e300));
    }
}
