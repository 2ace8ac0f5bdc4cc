//! Rename the obfuscated keys of a save document to their canonical names.
//!
//! ```
//! use std::collections::HashMap;
//! use waypoint::{keys::deobfuscate, Value};
//!
//! let doc: Value = r#"{"F2P": 4720, "6f=": {"NKm": "Hyperion", "new": 1}}"#.parse().unwrap();
//!
//! let mut map = HashMap::new();
//! map.insert("F2P", "Version");
//! map.insert("6f=", "PlayerStateData");
//! map.insert("NKm", "Name");
//!
//! let out = deobfuscate(doc, &map);
//! assert_eq!(out.document().pointer(["PlayerStateData", "Name"]).and_then(|x| x.as_str()), Some("Hyperion"));
//! assert!(out.unresolved().contains("new"));
//! ```

use crate::{Error, ErrorKind, Object, Value};
use serde::Deserialize;
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};
use std::io::Read;

/// Resolves obfuscated keys to canonical names
///
/// One can create their own `KeyResolver` or rely on the HashMap
/// implementation
///
/// ```
/// use std::collections::HashMap;
/// use waypoint::keys::KeyResolver;
///
/// let mut map = HashMap::new();
/// map.insert(String::from("NKm"), String::from("Name"));
///
/// assert_eq!(map.resolve("NKm"), Some("Name"));
/// assert_eq!(map.resolve("Name"), None);
/// ```
pub trait KeyResolver {
    /// Return the canonical name of the obfuscated key if found
    fn resolve(&self, key: &str) -> Option<&str>;

    /// Return true if the key is already a canonical name.
    ///
    /// Canonical keys are not reported as unresolved, which keeps a second
    /// pass over a renamed document quiet.
    fn is_canonical(&self, _key: &str) -> bool {
        false
    }
}

impl<K, V, S> KeyResolver for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn resolve(&self, key: &str) -> Option<&str> {
        self.get(key).map(|x| x.as_ref())
    }
}

impl<R> KeyResolver for &R
where
    R: KeyResolver + ?Sized,
{
    fn resolve(&self, key: &str) -> Option<&str> {
        (**self).resolve(key)
    }

    fn is_canonical(&self, key: &str) -> bool {
        (**self).is_canonical(key)
    }
}

/// A versioned table of obfuscated key to canonical name
///
/// Tables are published per game release and lag behind the game, so a
/// table may well be missing keys for the save at hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyMapping {
    version: Option<String>,
    forward: HashMap<String, String>,
    canonical: HashSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Versioned {
        #[serde(rename = "libMBIN_version", alias = "version", default)]
        version: Option<String>,
        #[serde(rename = "Mapping")]
        mapping: Vec<MappingEntry>,
    },
    Flat(HashMap<String, String>),
}

#[derive(Deserialize)]
struct MappingEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: String,
}

impl KeyMapping {
    /// Creates an empty table
    pub fn new() -> Self {
        KeyMapping::default()
    }

    /// Sets the version string of the table
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Reads a table from JSON.
    ///
    /// Accepts either a flat object of key to name, or the published
    /// mapping file layout:
    ///
    /// ```
    /// use waypoint::keys::{KeyMapping, KeyResolver};
    ///
    /// let data = br#"{"libMBIN_version": "5.52.0.1", "Mapping": [{"Key": "NKm", "Value": "Name"}]}"#;
    /// let table = KeyMapping::from_json_slice(data).unwrap();
    /// assert_eq!(table.version(), Some("5.52.0.1"));
    /// assert_eq!(table.resolve("NKm"), Some("Name"));
    ///
    /// let table = KeyMapping::from_json_slice(br#"{"NKm": "Name"}"#).unwrap();
    /// assert_eq!(table.version(), None);
    /// assert!(table.is_canonical("Name"));
    /// ```
    pub fn from_json_slice(data: &[u8]) -> Result<Self, Error> {
        let file = serde_json::from_slice(data).map_err(|e| Error::new(ErrorKind::Mapping(e)))?;
        Ok(KeyMapping::from_file(file))
    }

    /// Reads a table from a JSON reader, see [`KeyMapping::from_json_slice`]
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let file =
            serde_json::from_reader(reader).map_err(|e| Error::new(ErrorKind::Mapping(e)))?;
        Ok(KeyMapping::from_file(file))
    }

    fn from_file(file: MappingFile) -> Self {
        match file {
            MappingFile::Versioned { version, mapping } => {
                let mut table = mapping
                    .into_iter()
                    .map(|x| (x.key, x.value))
                    .collect::<KeyMapping>();
                table.version = version;
                table
            }
            MappingFile::Flat(map) => map.into_iter().collect(),
        }
    }

    /// Adds an entry, returning the name previously mapped to the key
    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) -> Option<String> {
        let name = name.into();
        self.canonical.insert(name.clone());
        self.forward.insert(key.into(), name)
    }

    /// The version string of the table, if known
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Number of obfuscated keys in the table
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Keys that are both an obfuscated code and some entry's canonical
    /// name, sorted.
    ///
    /// A document holding such a key can't be told apart as raw or
    /// resolved; renaming treats it as obfuscated.
    pub fn overlapping_keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self
            .forward
            .keys()
            .filter(|k| self.canonical.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyMapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = KeyMapping::new();
        for (key, name) in iter {
            table.insert(key, name);
        }
        table
    }
}

impl KeyResolver for KeyMapping {
    fn resolve(&self, key: &str) -> Option<&str> {
        self.forward.get(key).map(|x| x.as_str())
    }

    fn is_canonical(&self, key: &str) -> bool {
        self.canonical.contains(key)
    }
}

/// Which value survives when renaming makes two keys of an object equal
///
/// This happens when an obfuscated key resolves to a name the object
/// already holds verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyMode {
    /// The entry later in the object wins, as when parsing duplicate keys
    #[default]
    Last,

    /// The entry earlier in the object wins
    First,
}

/// Customizes key renaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapOptions {
    duplicate_keys: DuplicateKeyMode,
}

impl MapOptions {
    /// Creates the structure with default options
    pub fn new() -> Self {
        MapOptions::default()
    }

    /// Sets which entry survives a key collision
    pub fn with_duplicate_keys(mut self, duplicate_keys: DuplicateKeyMode) -> MapOptions {
        self.duplicate_keys = duplicate_keys;
        self
    }

    /// The configured collision behavior
    pub fn duplicate_keys(&self) -> DuplicateKeyMode {
        self.duplicate_keys
    }
}

/// A renamed document and what couldn't be renamed
#[derive(Debug, Clone, PartialEq)]
pub struct Deobfuscated {
    document: Value,
    unresolved: BTreeSet<String>,
    collisions: usize,
}

impl Deobfuscated {
    /// The renamed document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consumes the result and returns the renamed document
    pub fn into_document(self) -> Value {
        self.document
    }

    /// Keys that were neither in the table nor canonical names
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Number of entries dropped because renaming produced a duplicate key
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// The non fatal diagnostic for an incomplete table, if any key went
    /// unresolved
    pub fn mapping_incomplete(&self) -> Option<MappingIncomplete> {
        if self.unresolved.is_empty() {
            None
        } else {
            Some(MappingIncomplete {
                unresolved: self.unresolved.clone(),
            })
        }
    }
}

/// The key table did not cover every key in the document.
///
/// Decoding still succeeds with the unknown keys left verbatim. This is
/// surfaced so callers can flag an outdated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingIncomplete {
    unresolved: BTreeSet<String>,
}

impl MappingIncomplete {
    /// The keys that went unresolved, sorted
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }
}

impl std::fmt::Display for MappingIncomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} keys could not be resolved", self.unresolved.len())?;
        for (i, key) in self.unresolved.iter().take(8).enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{}{:?}", sep, key)?;
        }
        if self.unresolved.len() > 8 {
            write!(f, ", ...")?;
        }
        Ok(())
    }
}

impl std::error::Error for MappingIncomplete {}

/// Renames every resolvable key in the document with the default options
pub fn deobfuscate<R>(doc: Value, resolver: &R) -> Deobfuscated
where
    R: KeyResolver + ?Sized,
{
    deobfuscate_with(doc, resolver, &MapOptions::default())
}

/// Renames every resolvable key in the document.
///
/// Values, array order, and key order are left untouched. Keys the
/// resolver doesn't know are kept verbatim and reported.
pub fn deobfuscate_with<R>(doc: Value, resolver: &R, options: &MapOptions) -> Deobfuscated
where
    R: KeyResolver + ?Sized,
{
    let mut mapper = Mapper {
        resolver,
        options: *options,
        unresolved: BTreeSet::new(),
        collisions: 0,
    };

    let document = mapper.map_value(doc);
    tracing::debug!(
        unresolved = mapper.unresolved.len(),
        collisions = mapper.collisions,
        "renamed document keys"
    );

    Deobfuscated {
        document,
        unresolved: mapper.unresolved,
        collisions: mapper.collisions,
    }
}

struct Mapper<'a, R: ?Sized> {
    resolver: &'a R,
    options: MapOptions,
    unresolved: BTreeSet<String>,
    collisions: usize,
}

impl<R> Mapper<'_, R>
where
    R: KeyResolver + ?Sized,
{
    fn map_value(&mut self, value: Value) -> Value {
        match value {
            Value::Object(obj) => Value::Object(self.map_object(obj)),
            Value::Array(arr) => Value::Array(arr.into_iter().map(|x| self.map_value(x)).collect()),
            scalar => scalar,
        }
    }

    fn map_object(&mut self, obj: Object) -> Object {
        let mut out = Object::with_capacity(obj.len());
        for (key, value) in obj {
            let value = self.map_value(value);
            let key = match self.resolver.resolve(&key) {
                Some(name) => name.to_owned(),
                None => {
                    if !self.resolver.is_canonical(&key) && !self.unresolved.contains(&key) {
                        self.unresolved.insert(key.clone());
                    }
                    key
                }
            };

            let collided = match self.options.duplicate_keys() {
                DuplicateKeyMode::Last => out.insert(key.clone(), value).is_some(),
                DuplicateKeyMode::First => !out.insert_if_absent(key.clone(), value),
            };

            if collided {
                self.collisions += 1;
                tracing::warn!(key = %key, "renamed key collides with an existing key");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn table() -> KeyMapping {
        [("NKm", "Name"), ("bEM", "Planets"), ("Dvi", "Biome")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_rename_nested() {
        let doc: Value = r#"{"NKm": "sys", "bEM": [{"NKm": "a", "Dvi": "Lush"}, 3]}"#
            .parse()
            .unwrap();
        let out = deobfuscate(doc, &table());
        let expected: Value = r#"{"Name": "sys", "Planets": [{"Name": "a", "Biome": "Lush"}, 3]}"#
            .parse()
            .unwrap();
        assert_eq!(out.document(), &expected);
        assert!(out.unresolved().is_empty());
        assert_eq!(out.collisions(), 0);
        assert!(out.mapping_incomplete().is_none());
    }

    #[test]
    fn test_unresolved_keys_pass_through() {
        let doc: Value = r#"{"NKm": "sys", "?xz": {"q1w": 1}}"#.parse().unwrap();
        let out = deobfuscate(doc, &table());
        assert_eq!(
            out.document().pointer(["?xz", "q1w"]).and_then(|x| x.as_u64()),
            Some(1)
        );
        let unresolved: Vec<_> = out.unresolved().iter().map(|x| x.as_str()).collect();
        assert_eq!(unresolved, vec!["?xz", "q1w"]);

        let incomplete = out.mapping_incomplete().unwrap();
        assert_eq!(incomplete.unresolved().len(), 2);
        assert_eq!(
            incomplete.to_string(),
            r#"2 keys could not be resolved: "?xz", "q1w""#
        );
    }

    #[test]
    fn test_canonical_keys_not_reported() {
        let doc: Value = r#"{"Name": "sys", "NKm": "other"}"#.parse().unwrap();
        let mut map = HashMap::new();
        map.insert("bEM", "Planets");
        let out = deobfuscate(doc.clone(), &map);
        // a bare HashMap doesn't know canonical names
        assert_eq!(out.unresolved().len(), 2);

        let out = deobfuscate(doc, &KeyMapping::from_iter([("bEM", "Planets"), ("x", "Name")]));
        let unresolved: Vec<_> = out.unresolved().iter().map(|x| x.as_str()).collect();
        assert_eq!(unresolved, vec!["NKm"]);
    }

    #[rstest]
    #[case(DuplicateKeyMode::Last, "obfuscated")]
    #[case(DuplicateKeyMode::First, "verbatim")]
    fn test_collision_precedence(#[case] mode: DuplicateKeyMode, #[case] expected: &str) {
        let doc: Value = r#"{"Name": "verbatim", "NKm": "obfuscated", "Dvi": "Lush"}"#
            .parse()
            .unwrap();
        let options = MapOptions::new().with_duplicate_keys(mode);
        let out = deobfuscate_with(doc, &table(), &options);
        let obj = out.document().as_object().unwrap();
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["Name", "Biome"]);
        assert_eq!(obj.get("Name").and_then(|x| x.as_str()), Some(expected));
        assert_eq!(out.collisions(), 1);
    }

    #[rstest]
    #[case(DuplicateKeyMode::Last, "verbatim")]
    #[case(DuplicateKeyMode::First, "obfuscated")]
    fn test_collision_precedence_reversed(#[case] mode: DuplicateKeyMode, #[case] expected: &str) {
        let doc: Value = r#"{"NKm": "obfuscated", "Name": "verbatim"}"#.parse().unwrap();
        let options = MapOptions::new().with_duplicate_keys(mode);
        let out = deobfuscate_with(doc, &table(), &options);
        let obj = out.document().as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get("Name").and_then(|x| x.as_str()), Some(expected));
    }

    #[test]
    fn test_scalars_pass_through() {
        for text in ["1", "\"NKm\"", "null", "[\"NKm\", true]"] {
            let doc: Value = text.parse().unwrap();
            let out = deobfuscate(doc.clone(), &table());
            assert_eq!(out.document(), &doc);
        }
    }

    #[test]
    fn test_mapping_file_shapes() {
        let versioned = br#"{
            "libMBIN_version": "4.72.0.1",
            "Mapping": [
                {"Key": "NKm", "Value": "Name"},
                {"Key": "bEM", "Value": "Planets"}
            ]
        }"#;
        let table = KeyMapping::from_json_slice(versioned).unwrap();
        assert_eq!(table.version(), Some("4.72.0.1"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("bEM"), Some("Planets"));

        let table = KeyMapping::from_reader(&br#"{"NKm": "Name"}"#[..]).unwrap();
        assert_eq!(table.len(), 1);

        let err = KeyMapping::from_json_slice(br#"[1, 2]"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Mapping(_)));
    }

    #[test]
    fn test_overlapping_keys() {
        let table: KeyMapping = [("abc", "Name"), ("Name", "Label"), ("Label", "Tag")]
            .into_iter()
            .collect();
        assert_eq!(table.overlapping_keys(), vec!["Label", "Name"]);
        assert!(self::table().overlapping_keys().is_empty());
    }
}
