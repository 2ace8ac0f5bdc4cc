use crate::discovery::{SystemData, SystemIdentity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A field the comparator looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemField {
    Name,
    StarType,
    EconomyType,
    EconomyLevel,
    ConflictLevel,

    /// Planet membership by name
    Planets,
}

impl SystemField {
    /// Every compared field in the order changes are reported
    pub const ALL: [SystemField; 6] = [
        SystemField::Name,
        SystemField::StarType,
        SystemField::EconomyType,
        SystemField::EconomyLevel,
        SystemField::ConflictLevel,
        SystemField::Planets,
    ];

    /// Label used in summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemField::Name => "name",
            SystemField::StarType => "star_type",
            SystemField::EconomyType => "economy_type",
            SystemField::EconomyLevel => "economy_level",
            SystemField::ConflictLevel => "conflict_level",
            SystemField::Planets => "planets",
        }
    }

    /// Whether a change to this field must always be propagated
    pub fn is_significant(&self) -> bool {
        matches!(
            self,
            SystemField::EconomyLevel | SystemField::ConflictLevel | SystemField::Planets
        )
    }
}

impl fmt::Display for SystemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field that differs between two snapshots. Planet changes carry
/// the planet names joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: SystemField,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// The outcome of comparing two snapshots of a system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub has_changes: bool,
    pub is_significant: bool,

    /// Whether there was no previous snapshot
    pub is_new: bool,

    /// Changed fields, in [`SystemField::ALL`] order
    pub changes: Vec<FieldChange>,
    pub summary: String,
}

impl ComparisonResult {
    /// The change to a given field, if any
    pub fn change(&self, field: SystemField) -> Option<&FieldChange> {
        self.changes.iter().find(|x| x.field == field)
    }
}

/// Compares a previously known snapshot of a system with a fresh one.
///
/// Text fields are trimmed before comparison and a blank value is the same
/// as an absent one. Case is significant.
///
/// ```
/// use waypoint::discovery::{compare, SystemData, SystemField};
///
/// let before = SystemData {
///     name: Some("Old".to_string()),
///     conflict_level: Some("Low".to_string()),
///     ..SystemData::default()
/// };
/// let after = SystemData {
///     name: Some("New ".to_string()),
///     ..before.clone()
/// };
///
/// let result = compare(Some(&before), &after);
/// assert!(result.has_changes);
/// assert!(!result.is_significant);
/// assert_eq!(result.change(SystemField::Name).unwrap().new.as_deref(), Some("New"));
/// ```
pub fn compare(previous: Option<&SystemData>, current: &SystemData) -> ComparisonResult {
    let label = label(current);
    let Some(previous) = previous else {
        let summary = match current.planets.len() {
            1 => format!("{}: new system with 1 planet", label),
            n => format!("{}: new system with {} planets", label, n),
        };

        return ComparisonResult {
            has_changes: true,
            is_significant: true,
            is_new: true,
            changes: Vec::new(),
            summary,
        };
    };

    if previous.identity() != current.identity() {
        tracing::warn!(
            previous = ?previous.identity(),
            current = ?current.identity(),
            "comparing snapshots of different systems"
        );
    }

    let mut changes = Vec::new();
    let mut planet_delta = None;
    for field in SystemField::ALL {
        let (old, new) = match field {
            SystemField::Name => (text(&previous.name), text(&current.name)),
            SystemField::StarType => (text(&previous.star_type), text(&current.star_type)),
            SystemField::EconomyType => (text(&previous.economy_type), text(&current.economy_type)),
            SystemField::EconomyLevel => {
                (text(&previous.economy_level), text(&current.economy_level))
            }
            SystemField::ConflictLevel => {
                (text(&previous.conflict_level), text(&current.conflict_level))
            }
            SystemField::Planets => {
                let before = planet_names(previous);
                let after = planet_names(current);
                let same_members = before.iter().collect::<BTreeSet<_>>()
                    == after.iter().collect::<BTreeSet<_>>();
                if same_members && before.len() == after.len() {
                    continue;
                }

                planet_delta = Some(PlanetDelta::new(&before, &after));
                (joined(&before), joined(&after))
            }
        };

        if old != new {
            changes.push(FieldChange { field, old, new });
        }
    }

    let is_significant = changes.iter().any(|x| x.field.is_significant());
    let summary = summarize(&label, &changes, is_significant, planet_delta.as_ref());
    ComparisonResult {
        has_changes: !changes.is_empty(),
        is_significant,
        is_new: false,
        changes,
        summary,
    }
}

/// A system whose current snapshot differs from the previous one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemChange {
    pub identity: SystemIdentity,
    pub result: ComparisonResult,
}

/// Compares two extractions system by system.
///
/// Systems are matched by identity. Only new or changed systems are
/// returned, in the order of `current`. Systems that have disappeared from
/// `current` are not reported.
pub fn compare_snapshots(previous: &[SystemData], current: &[SystemData]) -> Vec<SystemChange> {
    let known: HashMap<SystemIdentity, &SystemData> = previous
        .iter()
        .filter_map(|x| x.identity().map(|id| (id, x)))
        .collect();

    let mut result = Vec::new();
    for system in current {
        let Some(identity) = system.identity() else {
            tracing::debug!("skipping system without identity");
            continue;
        };

        let comparison = compare(known.get(&identity).copied(), system);
        if comparison.has_changes {
            result.push(SystemChange {
                identity,
                result: comparison,
            });
        }
    }

    result
}

struct PlanetDelta {
    added: Vec<String>,
    removed: Vec<String>,
    counts: (usize, usize),
}

impl PlanetDelta {
    fn new(before: &[String], after: &[String]) -> Self {
        let missing = |from: &[String], other: &[String]| {
            from.iter()
                .filter(|x| !other.contains(x))
                .cloned()
                .collect::<Vec<_>>()
        };

        PlanetDelta {
            added: missing(after, before),
            removed: missing(before, after),
            counts: (before.len(), after.len()),
        }
    }
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(str::to_owned)
}

fn planet_names(system: &SystemData) -> Vec<String> {
    system
        .planets
        .iter()
        .map(|p| p.name.trim())
        .filter(|x| !x.is_empty())
        .map(str::to_owned)
        .collect()
}

fn joined(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn label(system: &SystemData) -> String {
    match (text(&system.name), system.identity()) {
        (Some(name), _) => name,
        (None, Some(identity)) => identity.to_string(),
        (None, None) => String::from("unidentified system"),
    }
}

fn summarize(
    label: &str,
    changes: &[FieldChange],
    is_significant: bool,
    planets: Option<&PlanetDelta>,
) -> String {
    if changes.is_empty() {
        return format!("{}: no changes", label);
    }

    let mut parts = Vec::with_capacity(changes.len());
    for change in changes {
        let mut part = String::from(change.field.as_str());
        match (change.field, planets) {
            (SystemField::Planets, Some(delta)) => {
                for name in &delta.added {
                    part.push_str(" +");
                    part.push_str(name);
                }
                for name in &delta.removed {
                    part.push_str(" -");
                    part.push_str(name);
                }
                if delta.added.is_empty() && delta.removed.is_empty() {
                    part.push_str(&format!(" count {} -> {}", delta.counts.0, delta.counts.1));
                }
            }
            _ => {
                part.push_str(&format!(" {} -> {}", quoted(&change.old), quoted(&change.new)));
            }
        }
        parts.push(part);
    }

    let severity = if is_significant {
        "significant change"
    } else {
        "cosmetic change"
    };
    format!("{}: {} ({})", label, severity, parts.join("; "))
}

fn quoted(value: &Option<String>) -> String {
    match value {
        Some(x) => format!("{:?}", x),
        None => String::from("none"),
    }
}
