//! Bridging to and from `serde_json` trees.
//!
//! The conversion is lossless where the models agree. Coming in, object
//! members are re-sorted by key and numbers split into Integer and Real.
//! Going out, NaN and the infinities have no JSON spelling and degrade to
//! null.

use serde_json::Number;

use crate::value::{Object, Value};

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(flag) => Value::Bool(flag),
            serde_json::Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Value::Integer(integer)
                } else if let Some(unsigned) = number.as_u64() {
                    Value::Integer(unsigned as i64)
                } else {
                    Value::Real(number.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(text) => Value::String(text),
            serde_json::Value::Array(elements) => {
                Value::Array(elements.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(key, member)| (key, Value::from(member)))
                    .collect::<Object>(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> serde_json::Value {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Integer(number) => serde_json::Value::Number(Number::from(*number)),
            Value::Real(number) => Number::from_f64(*number)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(text) => serde_json::Value::String(text.clone()),
            Value::Array(elements) => {
                serde_json::Value::Array(elements.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(members) => serde_json::Value::Object(
                members
                    .iter()
                    .map(|(key, member)| (key.clone(), serde_json::Value::from(member)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> serde_json::Value {
        serde_json::Value::from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse;

    #[test]
    fn serde_tree_converts_in() {
        let json: serde_json::Value = serde_json::from_str(
            r#"{"b": [1, 2.5, "x"], "a": null, "big": 18446744073709551615}"#,
        )
        .unwrap();
        let value = Value::from(json);
        assert_eq!(value["b"][0], Value::Integer(1));
        assert_eq!(value["b"][1], Value::Real(2.5));
        assert!(value["a"].is_null());
        // u64 overflow wraps into the i64 space
        assert_eq!(value["big"], Value::Integer(-1));
        // keys re-sort on the way in
        let keys: Vec<&str> = value.try_iter().unwrap().map(|(k, _)| k.unwrap()).collect();
        assert_eq!(keys, ["a", "b", "big"]);
    }

    #[test]
    fn our_tree_converts_out() {
        let value = parse("{flag: true, nums: [1, 2.5], nothing: null}").unwrap();
        let json = serde_json::Value::from(&value);
        assert_eq!(
            serde_json::to_string(&json).unwrap(),
            r#"{"flag":true,"nothing":null,"nums":[1,2.5]}"#
        );
    }

    #[test]
    fn non_finite_reals_degrade_to_null() {
        let value = Value::from(f64::NAN);
        assert_eq!(serde_json::Value::from(&value), serde_json::Value::Null);
    }
}
