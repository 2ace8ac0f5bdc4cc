use crate::discovery::Schema;
use crate::{Number, Object, Value};
use std::collections::HashSet;
use std::fmt;

/// The kind of a discovery record, read from its discriminator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A star system
    SolarSystem,

    /// A planet or moon
    Planet,

    /// A player base
    Base,

    /// Any other discovery (flora, fauna, points of interest, ...) or a kind
    /// introduced by a later game version
    Unknown(String),
}

impl RecordKind {
    /// Creates a RecordKind from the discriminator value
    pub fn new(tag: &str) -> RecordKind {
        match tag {
            "SolarSystem" => RecordKind::SolarSystem,
            "Planet" => RecordKind::Planet,
            "Base" => RecordKind::Base,
            x => RecordKind::Unknown(x.to_owned()),
        }
    }

    /// Returns the discriminator value of this kind
    pub fn as_str(&self) -> &str {
        match self {
            RecordKind::SolarSystem => "SolarSystem",
            RecordKind::Planet => "Planet",
            RecordKind::Base => "Base",
            RecordKind::Unknown(x) => x,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field access over a record object and its payload containers
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordView<'a> {
    object: &'a Object,
    payload_keys: &'a [String],
}

impl<'a> RecordView<'a> {
    pub(crate) fn new(object: &'a Object, schema: &'a Schema) -> Self {
        RecordView {
            object,
            payload_keys: &schema.payload_keys,
        }
    }

    pub(crate) fn object(&self) -> &'a Object {
        self.object
    }

    /// Every non-null value under an alias: the record's own fields in alias
    /// order, then each payload container's in schema order
    fn candidates<'s>(&'s self, aliases: &'s [String]) -> impl Iterator<Item = &'a Value> + 's {
        let object = self.object;
        let containers = self
            .payload_keys
            .iter()
            .filter_map(move |key| object.get(key).and_then(Value::as_object));

        std::iter::once(object)
            .chain(containers)
            .flat_map(move |obj| aliases.iter().filter_map(move |alias| obj.get(alias)))
            .filter(|x| !x.is_null())
    }

    /// First non-null value under any alias, on the record before its
    /// payload containers
    pub(crate) fn field(&self, aliases: &[String]) -> Option<&'a Value> {
        self.candidates(aliases).next()
    }

    /// First candidate that coerces. A blank or mistyped value moves on to
    /// the next alias instead of hiding it.
    fn coerce<T>(&self, aliases: &[String], f: impl Fn(&Value) -> Option<T>) -> Option<T> {
        let mut rejected = None;
        for value in self.candidates(aliases) {
            match f(value) {
                Some(x) => return Some(x),
                None => {
                    rejected.get_or_insert(value);
                }
            }
        }

        if let Some(value) = rejected {
            tracing::trace!(
                field = aliases.first().map(String::as_str).unwrap_or_default(),
                kind = value.kind_name(),
                "field has unexpected type, treating as absent"
            );
        }
        None
    }

    pub(crate) fn kind(&self, aliases: &[String]) -> Option<RecordKind> {
        self.text(aliases).map(|x| RecordKind::new(&x))
    }

    pub(crate) fn text(&self, aliases: &[String]) -> Option<String> {
        self.coerce(aliases, text)
    }

    pub(crate) fn index(&self, aliases: &[String]) -> Option<u32> {
        self.coerce(aliases, index)
    }

    pub(crate) fn flag(&self, aliases: &[String]) -> Option<bool> {
        self.coerce(aliases, flag)
    }

    pub(crate) fn float(&self, aliases: &[String]) -> Option<f64> {
        self.coerce(aliases, float)
    }

    pub(crate) fn texts(&self, aliases: &[String]) -> Vec<String> {
        self.candidates(aliases)
            .map(texts)
            .find(|x| !x.is_empty())
            .unwrap_or_default()
    }
}

/// Reads a value as text.
///
/// Strings that are blank are absent. Numbers are formatted. Enums are
/// often written as a single entry object (`{"StarType": "Yellow"}`) and
/// are unwrapped.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) if obj.len() == 1 => obj.values().next().and_then(text),
        _ => None,
    }
}

/// Reads a value as a small non-negative integer.
///
/// Accepts integers, floats without a fraction, numeric strings, and single
/// entry enum wrappers of those.
pub(crate) fn index(value: &Value) -> Option<u32> {
    match value {
        Value::Number(Number::F64(x)) => {
            if x.fract() == 0.0 && *x >= 0.0 && *x <= f64::from(u32::MAX) {
                Some(*x as u32)
            } else {
                None
            }
        }
        Value::Number(n) => n.as_u64().and_then(|x| u32::try_from(x).ok()),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) if obj.len() == 1 => obj.values().next().and_then(index),
        _ => None,
    }
}

pub(crate) fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn float(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

/// Reads a list of text values, dropping duplicates while keeping the order
/// they were first seen in. A lone text value is a list of one.
pub(crate) fn texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(arr) => {
            let mut seen = HashSet::new();
            arr.iter()
                .filter_map(text)
                .filter(|x| seen.insert(x.clone()))
                .collect()
        }
        x => text(x).into_iter().collect(),
    }
}
