use crate::Error;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::HashMap;
use std::fmt;

/// An owned JSON document as found in a save.
///
/// Unlike `serde_json::Value`, objects keep the key order of the text, which
/// matters for diagnostics and for keeping renamed documents comparable to
/// their source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// `null`
    #[default]
    Null,

    /// `true` or `false`
    Bool(bool),

    /// Any JSON number
    Number(Number),

    /// A string
    String(String),

    /// An ordered sequence of values
    Array(Vec<Value>),

    /// An ordered map of unique keys to values
    Object(Object),
}

/// A JSON number in the width the parser reported it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// A non-negative integer
    U64(u64),

    /// A negative integer
    I64(i64),

    /// A number with a fraction or exponent
    F64(f64),
}

impl Number {
    /// Returns the number as an u64 if it's an integer that fits
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Number::U64(x) => Some(x),
            Number::I64(x) => u64::try_from(x).ok(),
            Number::F64(_) => None,
        }
    }

    /// Returns the number as an i64 if it's an integer that fits
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::U64(x) => i64::try_from(x).ok(),
            Number::I64(x) => Some(x),
            Number::F64(_) => None,
        }
    }

    /// Returns the number as a float, which may lose precision for large
    /// integers
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::U64(x) => x as f64,
            Number::I64(x) => x as f64,
            Number::F64(x) => x,
        }
    }

    /// Returns `true` if the number is an integer
    pub fn is_integer(&self) -> bool {
        !matches!(self, Number::F64(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::U64(x) => write!(f, "{}", x),
            Number::I64(x) => write!(f, "{}", x),
            Number::F64(x) => write!(f, "{}", x),
        }
    }
}

impl Value {
    /// Parses a JSON document.
    ///
    /// Duplicate keys within an object keep the value written last at the
    /// position of the first occurrence.
    ///
    /// ```
    /// use waypoint::Value;
    ///
    /// let doc = Value::from_slice(br#"{"b": 1, "a": [true, null], "b": 2}"#).unwrap();
    /// let keys: Vec<_> = doc.as_object().unwrap().keys().collect();
    /// assert_eq!(keys, vec!["b", "a"]);
    /// assert_eq!(doc.get("b").and_then(|x| x.as_u64()), Some(2));
    /// ```
    pub fn from_slice(data: &[u8]) -> Result<Value, Error> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Short name of the variant, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Returns `true` if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value is neither an array nor an object.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Returns the boolean value if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a number.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the u64 value if this is an integer that fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(|n| n.as_u64())
    }

    /// Returns the i64 value if this is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_i64())
    }

    /// Returns the f64 value if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.as_f64())
    }

    /// Returns the string if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array if this is an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns the object if this is an object value.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Gets a value from an object by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Gets a value from an array by index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|arr| arr.get(index))
    }

    /// Walks a path of object keys. Segments that address an array are
    /// parsed as indices.
    ///
    /// ```
    /// use waypoint::Value;
    ///
    /// let doc = Value::from_slice(br#"{"a": {"b": [10, 20]}}"#).unwrap();
    /// assert_eq!(doc.pointer(["a", "b", "1"]).and_then(|x| x.as_u64()), Some(20));
    /// assert!(doc.pointer(["a", "c"]).is_none());
    /// ```
    pub fn pointer<I, S>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        path.into_iter().try_fold(self, |value, segment| {
            let segment = segment.as_ref();
            match value {
                Value::Object(obj) => obj.get(segment),
                Value::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
                _ => None,
            }
        })
    }

    /// Number of values in the tree, this one included
    pub fn node_count(&self) -> usize {
        match self {
            Value::Array(arr) => 1 + arr.iter().map(Value::node_count).sum::<usize>(),
            Value::Object(obj) => 1 + obj.values().map(Value::node_count).sum::<usize>(),
            _ => 1,
        }
    }
}

impl std::str::FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

/// An insertion ordered map with unique keys.
///
/// Lookups go through a hash index, so building an object of `n` keys stays
/// linear. Two objects are equal when they hold the same entries in the same
/// order.
#[derive(Clone, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Object {
    /// Creates an empty object
    pub fn new() -> Self {
        Object::default()
    }

    /// Creates an empty object with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Object {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn push(&mut self, key: String, value: Value) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    /// Gets the value of a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Returns `true` if the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Inserts an entry. An existing key keeps its position but takes the
    /// new value, and the old value is returned.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.push(key, value);
                None
            }
        }
    }

    /// Inserts an entry only if the key is not present. Returns whether the
    /// entry was inserted.
    pub fn insert_if_absent(&mut self, key: String, value: Value) -> bool {
        if self.contains_key(&key) {
            false
        } else {
            self.push(key, value);
            true
        }
    }

    /// Iterates over the entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over the values in order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut obj = Object::new();
        for (key, value) in iter {
            obj.insert(key.into(), value);
        }
        obj
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(x: $ty) -> Self {
                    $variant(x)
                }
            }
        )*
    };
}

impl_from! {
    bool => Value::Bool,
    String => Value::String,
    Vec<Value> => Value::Array,
    Object => Value::Object,
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::String(x.to_owned())
    }
}

impl From<u64> for Value {
    fn from(x: u64) -> Self {
        Value::Number(Number::U64(x))
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        if x >= 0 {
            Value::Number(Number::U64(x as u64))
        } else {
            Value::Number(Number::I64(x))
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(Number::F64(x))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(x) = n.as_u64() {
                    Value::Number(Number::U64(x))
                } else if let Some(x) = n.as_i64() {
                    Value::Number(Number::I64(x))
                } else {
                    n.as_f64()
                        .map_or(Value::Null, |x| Value::Number(Number::F64(x)))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any json value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(Number::U64(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(Number::F64(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(value) = seq.next_element()? {
            values.push(value);
        }
        Ok(Value::Array(values))
    }

    fn visit_map<A>(self, map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        ObjectVisitor.visit_map(map).map(Value::Object)
    }
}

struct ObjectVisitor;

impl<'de> Visitor<'de> for ObjectVisitor {
    type Value = Object;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a json object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Object, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut obj = Object::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            obj.insert(key, value);
        }
        Ok(obj)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for Object {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ObjectVisitor)
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::U64(x) => serializer.serialize_u64(x),
            Number::I64(x) => serializer.serialize_i64(x),
            Number::F64(x) => serializer.serialize_f64(x),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for Object {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_deserialization_preserves_order() {
        let doc: Value = r#"{"zeta": 1, "alpha": 2, "mid": {"y": 1, "x": 2}}"#
            .parse()
            .unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        let mid = doc.get("mid").unwrap().as_object().unwrap();
        assert_eq!(mid.keys().collect::<Vec<_>>(), vec!["y", "x"]);
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let doc: Value = r#"{"a": 1, "b": 2, "a": 3}"#.parse().unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(obj.get("a"), Some(&Value::from(3u64)));
    }

    #[test]
    fn test_number_widths() {
        let doc: Value = r#"[1, -1, 1.5, 18446744073709551615]"#.parse().unwrap();
        let arr = doc.as_array().unwrap();
        assert_eq!(arr[0], Value::Number(Number::U64(1)));
        assert_eq!(arr[1], Value::Number(Number::I64(-1)));
        assert_eq!(arr[2], Value::Number(Number::F64(1.5)));
        assert_eq!(arr[3].as_u64(), Some(u64::MAX));
        assert_eq!(arr[3].as_i64(), None);
        assert_eq!(arr[1].as_u64(), None);
        assert_eq!(arr[2].as_i64(), None);
    }

    #[test]
    fn test_node_count() {
        let doc: Value = r#"{"a": [1, 2, {"b": null}], "c": "x"}"#.parse().unwrap();
        // root, a, 1, 2, {b}, null, c
        assert_eq!(doc.node_count(), 7);
        assert_eq!(Value::Null.node_count(), 1);
    }

    #[test]
    fn test_pointer() {
        let doc: Value = r#"{"a": {"b": [{"c": true}]}}"#.parse().unwrap();
        assert_eq!(
            doc.pointer(["a", "b", "0", "c"]).and_then(|x| x.as_bool()),
            Some(true)
        );
        assert!(doc.pointer(["a", "b", "x"]).is_none());
        assert!(doc.pointer(["a", "b", "0", "c", "d"]).is_none());
        assert_eq!(doc.pointer(Vec::<String>::new()), Some(&doc));
    }

    #[test]
    fn test_value_round_trip() {
        let text = r#"{"b":[1,-2,0.5,"s",null,true],"a":{"x":{}}}"#;
        let doc: Value = text.parse().unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), text);
    }

    #[test]
    fn test_from_serde_json() {
        let doc = Value::from(serde_json::json!({"a": [1, -1, 2.5, "x", null]}));
        let expected: Value = r#"{"a": [1, -1, 2.5, "x", null]}"#.parse().unwrap();
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_insert_if_absent() {
        let mut obj = Object::new();
        assert!(obj.insert_if_absent("a".to_string(), Value::from(1u64)));
        assert!(!obj.insert_if_absent("a".to_string(), Value::from(2u64)));
        assert_eq!(obj.get("a"), Some(&Value::from(1u64)));
        assert_eq!(obj.insert("a".to_string(), Value::from(3u64)), Some(Value::from(1u64)));
        assert_eq!(obj.get("a"), Some(&Value::from(3u64)));
    }

    #[test]
    fn test_wide_object() {
        let n = 50_000;
        let mut text = String::from("{");
        for i in 0..n {
            text.push_str(&format!("\"k{}\": {}, ", i, i));
        }
        text.push_str("\"k0\": -1}");

        let doc: Value = text.parse().unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), n);
        assert_eq!(obj.keys().next(), Some("k0"));
        assert_eq!(obj.keys().last(), Some("k49999"));
        assert_eq!(obj.get("k0"), Some(&Value::from(-1i64)));
        assert_eq!(obj.get("k25000"), Some(&Value::from(25000u64)));
        assert!(!obj.contains_key("k50000"));
    }

    #[test]
    fn test_object_equality_is_ordered() {
        let ab: Object = [("a", Value::Null), ("b", Value::Null)].into_iter().collect();
        let ba: Object = [("b", Value::Null), ("a", Value::Null)].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
        assert_eq!(format!("{:?}", ab), r#"{"a": Null, "b": Null}"#);
    }

    #[test]
    fn test_not_json() {
        assert!("{\"a\": }".parse::<Value>().is_err());
        assert!(Value::from_slice(b"").is_err());
    }
}
