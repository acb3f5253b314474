// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loosely-typed values carried across the method channel, and per-call
// argument decoding.
//
// The host framework sends arguments as an open key/value mapping. Handlers
// never cast blindly: every required key goes through `Arguments`, which
// reports a missing or mistyped key as `MiniappError::InvalidArgument`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MiniappError, Result};

/// A value that can cross the method channel.
///
/// Serialises untagged, so a JSON document maps directly onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

/// Build a `Value::Map` from `key => value` pairs.
#[macro_export]
macro_rules! value_map {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = ::std::collections::BTreeMap::<String, $crate::Value>::new();
        $( map.insert(String::from($key), $crate::Value::from($value)); )*
        $crate::Value::Map(map)
    }};
}

// ---------------------------------------------------------------------------
// Argument decoding
// ---------------------------------------------------------------------------

static EMPTY: BTreeMap<String, Value> = BTreeMap::new();

/// Borrowed view over a call's named arguments.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    map: &'a BTreeMap<String, Value>,
}

impl<'a> Arguments<'a> {
    /// Wrap a call's argument value. `Null` is treated as "no arguments";
    /// anything other than a map is a decode error.
    pub fn from_value(value: &'a Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::Map(map) => Ok(Self { map }),
            _ => Err(MiniappError::invalid_argument("arguments", "a map")),
        }
    }

    pub fn empty() -> Self {
        Self { map: &EMPTY }
    }

    /// Raw lookup. Explicit `null` is reported as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn require_str(&self, key: &str) -> Result<&'a str> {
        self.opt_str(key)?
            .ok_or_else(|| MiniappError::invalid_argument(key, "a string"))
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| MiniappError::invalid_argument(key, "a string")),
        }
    }

    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| MiniappError::invalid_argument(key, "an integer")),
        }
    }

    /// Optional list whose elements must all be strings.
    pub fn opt_str_list(&self, key: &str) -> Result<Option<Vec<&'a str>>> {
        let Some(v) = self.get(key) else {
            return Ok(None);
        };
        let items = v
            .as_list()
            .ok_or_else(|| MiniappError::invalid_argument(key, "a list of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| MiniappError::invalid_argument(key, "a list of strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Nested argument map. Absent means empty.
    pub fn nested(&self, key: &str) -> Result<Arguments<'a>> {
        match self.get(key) {
            None => Ok(Self::empty()),
            Some(Value::Map(map)) => Ok(Self { map }),
            Some(_) => Err(MiniappError::invalid_argument(key, "a map")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_maps_onto_value_variants() {
        let v: Value = serde_json::from_str(
            r#"{"a": null, "b": true, "c": 7, "d": 1.5, "e": "x", "f": [1, "y"]}"#,
        )
        .expect("parse");
        assert_eq!(v.get("a"), Some(&Value::Null));
        assert_eq!(v.get("b"), Some(&Value::Bool(true)));
        assert_eq!(v.get("c"), Some(&Value::Int(7)));
        assert_eq!(v.get("d"), Some(&Value::Float(1.5)));
        assert_eq!(v.get("e"), Some(&Value::String("x".into())));
        assert_eq!(
            v.get("f"),
            Some(&Value::List(vec![Value::Int(1), Value::String("y".into())]))
        );
    }

    #[test]
    fn null_arguments_are_empty() {
        let args = Arguments::from_value(&Value::Null).expect("null is fine");
        assert!(args.is_empty());
        assert!(args.opt_str("title").expect("absent").is_none());
    }

    #[test]
    fn non_map_arguments_are_rejected() {
        let err = Arguments::from_value(&Value::Int(3)).unwrap_err();
        assert!(matches!(err, MiniappError::InvalidArgument { .. }));
    }

    #[test]
    fn required_string_reports_missing_and_mistyped() {
        let v = value_map! { "permission" => 42 };
        let args = Arguments::from_value(&v).expect("map");
        assert!(args.require_str("permission").is_err());
        assert!(args.require_str("other").is_err());

        let v = value_map! { "permission" => "android.permission.CAMERA" };
        let args = Arguments::from_value(&v).expect("map");
        assert_eq!(
            args.require_str("permission").expect("present"),
            "android.permission.CAMERA"
        );
    }

    #[test]
    fn explicit_null_counts_as_absent() {
        let v = value_map! { "duration" => Value::Null };
        let args = Arguments::from_value(&v).expect("map");
        assert_eq!(args.opt_i64("duration").expect("absent"), None);
    }

    #[test]
    fn string_list_rejects_mixed_elements() {
        let v = value_map! { "buttons" => vec![Value::from("A"), Value::from(1)] };
        let args = Arguments::from_value(&v).expect("map");
        assert!(args.opt_str_list("buttons").is_err());

        let v = value_map! { "buttons" => vec!["A", "B"] };
        let args = Arguments::from_value(&v).expect("map");
        assert_eq!(
            args.opt_str_list("buttons").expect("list"),
            Some(vec!["A", "B"])
        );
    }

    #[test]
    fn nested_map_defaults_to_empty() {
        let v = value_map! { "params" => value_map! { "key" => "os.arch" } };
        let args = Arguments::from_value(&v).expect("map");
        let params = args.nested("params").expect("map");
        assert_eq!(params.require_str("key").expect("key"), "os.arch");
        assert!(args.nested("missing").expect("empty").is_empty());
    }
}
