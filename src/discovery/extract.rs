use crate::discovery::{
    bases::{read_base, scan_bases},
    record::{RecordKind, RecordView},
    entity::normalize_glyph,
    BaseData, PlanetData, Schema, SystemData, SystemIdentity,
};
use crate::Value;
use std::collections::HashMap;
use std::fmt;

/// Why a record was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// The record is not an object
    NotAnObject,

    /// The record has no discriminator
    MissingDiscriminator,

    /// The record has neither a name nor a glyph code
    MissingIdentity { kind: RecordKind },

    /// A planet nested in a system record has neither a name nor a glyph
    /// code
    MissingPlanetIdentity { position: usize },
}

/// A record that was dropped during extraction. Extraction carries on
/// with the remaining records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMalformed {
    index: usize,
    reason: MalformedReason,
}

impl RecordMalformed {
    /// Position of the record in the record store
    pub fn index(&self) -> usize {
        self.index
    }

    /// Why the record was dropped
    pub fn reason(&self) -> &MalformedReason {
        &self.reason
    }
}

impl fmt::Display for RecordMalformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MalformedReason::NotAnObject => write!(f, "record {} is not an object", self.index),
            MalformedReason::MissingDiscriminator => {
                write!(f, "record {} has no discovery type", self.index)
            }
            MalformedReason::MissingIdentity { kind } => write!(
                f,
                "{} record {} has neither name nor glyph code",
                kind, self.index
            ),
            MalformedReason::MissingPlanetIdentity { position } => write!(
                f,
                "planet {} of record {} has neither name nor glyph code",
                position, self.index
            ),
        }
    }
}

impl std::error::Error for RecordMalformed {}

/// Bookkeeping of an extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractDiagnostics {
    /// Whether the record store was found in the document
    pub store_found: bool,

    /// Number of entries in the record store
    pub records_seen: usize,

    /// Records that were dropped, along with nested planets dropped from
    /// system records, in store order
    pub malformed: Vec<RecordMalformed>,

    /// Records of a kind the extractor does not handle
    pub skipped_unknown: usize,

    /// Planet records whose system was not found
    pub orphaned_planets: usize,

    /// Base entries without coordinates
    pub skipped_bases: usize,
}

impl ExtractDiagnostics {
    /// Number of dropped records. Planets dropped from inside a system
    /// record are counted by [`dropped_planets`](Self::dropped_planets)
    /// instead.
    pub fn dropped_records(&self) -> usize {
        self.malformed.len() - self.dropped_planets()
    }

    /// Number of nested planets dropped from system records
    pub fn dropped_planets(&self) -> usize {
        self.malformed
            .iter()
            .filter(|x| matches!(x.reason, MalformedReason::MissingPlanetIdentity { .. }))
            .count()
    }
}

/// Everything recovered from a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Systems in the order they were first seen in the record store
    pub systems: Vec<SystemData>,

    /// Bases from the base list followed by base discovery records
    pub bases: Vec<BaseData>,

    pub diagnostics: ExtractDiagnostics,
}

/// Recovers systems, planets, and bases from a renamed save document.
///
/// The document is only read. Bad records are dropped and reported in
/// [`ExtractDiagnostics`] rather than failing the pass, so a document
/// without a record store yields an empty [`Extraction`].
///
/// ```
/// use waypoint::{discovery::DiscoveryExtractor, Value};
///
/// let doc: Value = r#"{"DiscoveryManagerData": {"DiscoveryData-v1": {"Store": {"Record": [
///     {"DiscoveryType": "SolarSystem", "GlyphCode": "01230456789A", "Name": "Hyperion",
///      "Planets": [{"Name": "Ares", "Biome": "Lush"}]},
///     {"DiscoveryType": "Planet", "SystemGlyphCode": "01230456789A", "Name": "Ares Minor", "IsMoon": true},
///     {"DiscoveryType": "Flora", "Name": "Greenleaf"}
/// ]}}}}"#.parse().unwrap();
///
/// let extraction = DiscoveryExtractor::new().extract(&doc);
/// let system = &extraction.systems[0];
/// assert_eq!(system.name.as_deref(), Some("Hyperion"));
/// assert_eq!(system.planets.len(), 2);
/// assert!(system.planets[1].is_moon);
/// assert_eq!(extraction.diagnostics.skipped_unknown, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscoveryExtractor {
    schema: Schema,
}

struct PendingPlanet {
    index: usize,
    planet: PlanetData,
    parent_glyph: Option<String>,
    parent_name: Option<String>,
}

impl DiscoveryExtractor {
    /// Creates an extractor for the default schema
    pub fn new() -> Self {
        DiscoveryExtractor::default()
    }

    /// Creates an extractor for a custom schema
    pub fn with_schema(schema: Schema) -> Self {
        DiscoveryExtractor { schema }
    }

    /// The schema in use
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Extracts the player base list
    pub fn extract_bases(&self, doc: &Value) -> Vec<BaseData> {
        scan_bases(doc, &self.schema).0
    }

    /// Extracts systems and bases
    pub fn extract(&self, doc: &Value) -> Extraction {
        let mut diagnostics = ExtractDiagnostics::default();
        let (mut bases, skipped_bases) = scan_bases(doc, &self.schema);
        diagnostics.skipped_bases = skipped_bases;

        let (records, store_found) = match doc.pointer(&self.schema.record_path) {
            Some(Value::Array(records)) => (records.as_slice(), true),
            Some(other) => {
                tracing::warn!(
                    kind = other.kind_name(),
                    "discovery record store is not an array"
                );
                (&[][..], false)
            }
            None => {
                tracing::debug!("document has no discovery record store");
                (&[][..], false)
            }
        };
        diagnostics.store_found = store_found;
        diagnostics.records_seen = records.len();

        let mut systems: Vec<SystemData> = Vec::new();
        let mut by_identity: HashMap<SystemIdentity, usize> = HashMap::new();
        let mut pending = Vec::new();
        let fields = &self.schema.fields;

        for (index, record) in records.iter().enumerate() {
            let Some(object) = record.as_object() else {
                self.reject(&mut diagnostics, index, MalformedReason::NotAnObject);
                continue;
            };

            let view = RecordView::new(object, &self.schema);
            let Some(kind) = view.kind(&fields.discovery_type) else {
                self.reject(&mut diagnostics, index, MalformedReason::MissingDiscriminator);
                continue;
            };

            match kind {
                RecordKind::SolarSystem => {
                    let system = self.read_system(view, index, &mut diagnostics);
                    let Some(identity) = system.identity() else {
                        let reason = MalformedReason::MissingIdentity {
                            kind: RecordKind::SolarSystem,
                        };
                        self.reject(&mut diagnostics, index, reason);
                        continue;
                    };

                    match by_identity.get(&identity) {
                        Some(&i) => systems[i].absorb(system),
                        None => {
                            by_identity.insert(identity, systems.len());
                            systems.push(system);
                        }
                    }
                }
                RecordKind::Planet => {
                    let Some(planet) = self.read_planet(view) else {
                        let reason = MalformedReason::MissingIdentity {
                            kind: RecordKind::Planet,
                        };
                        self.reject(&mut diagnostics, index, reason);
                        continue;
                    };

                    let parent_glyph = view
                        .text(&fields.system_glyph_code)
                        .or_else(|| view.text(&fields.glyph_code))
                        .map(|x| system_glyph(&x));
                    pending.push(PendingPlanet {
                        index,
                        planet,
                        parent_glyph,
                        parent_name: view.text(&fields.system_name),
                    });
                }
                RecordKind::Base => match read_base(view, &self.schema) {
                    Some(base) => bases.push(base),
                    None => diagnostics.skipped_bases += 1,
                },
                RecordKind::Unknown(tag) => {
                    tracing::trace!(index, kind = %tag, "skipping discovery record");
                    diagnostics.skipped_unknown += 1;
                }
            }
        }

        self.attach_planets(&mut systems, pending, &mut diagnostics);

        tracing::debug!(
            records = diagnostics.records_seen,
            systems = systems.len(),
            bases = bases.len(),
            dropped = diagnostics.dropped_records(),
            dropped_planets = diagnostics.dropped_planets(),
            unknown = diagnostics.skipped_unknown,
            orphaned = diagnostics.orphaned_planets,
            "extracted discoveries"
        );

        Extraction {
            systems,
            bases,
            diagnostics,
        }
    }

    fn reject(&self, diagnostics: &mut ExtractDiagnostics, index: usize, reason: MalformedReason) {
        let malformed = RecordMalformed { index, reason };
        tracing::debug!("dropping record: {}", malformed);
        diagnostics.malformed.push(malformed);
    }

    fn read_system(
        &self,
        view: RecordView<'_>,
        index: usize,
        diagnostics: &mut ExtractDiagnostics,
    ) -> SystemData {
        let fields = &self.schema.fields;
        let galaxy_index = view.index(&fields.galaxy_index);
        let mut system = SystemData {
            name: view.text(&fields.name),
            glyph_code: view.text(&fields.glyph_code).map(|x| normalize_glyph(&x)),
            galaxy: view
                .text(&fields.galaxy)
                .or_else(|| galaxy_index.map(galaxy_name)),
            galaxy_index,
            star_type: view.text(&fields.star_type),
            economy_type: view.text(&fields.economy_type),
            economy_level: view.text(&fields.economy_level),
            conflict_level: view.text(&fields.conflict_level),
            discovered_by: view.text(&fields.discovered_by),
            planets: Vec::new(),
        };

        let nested = view
            .field(&fields.planets)
            .and_then(Value::as_array)
            .unwrap_or_default();

        for (position, entry) in nested.iter().enumerate() {
            let planet = entry
                .as_object()
                .and_then(|obj| self.read_planet(RecordView::new(obj, &self.schema)));
            match planet {
                Some(planet) => {
                    system.add_planet(planet);
                }
                None => {
                    let reason = MalformedReason::MissingPlanetIdentity { position };
                    self.reject(diagnostics, index, reason);
                }
            }
        }

        system
    }

    fn read_planet(&self, view: RecordView<'_>) -> Option<PlanetData> {
        let fields = &self.schema.fields;
        let name = view
            .text(&fields.name)
            .or_else(|| view.text(&fields.glyph_code))?;

        Some(PlanetData {
            name,
            biome: view.text(&fields.biome),
            resources: view.texts(&fields.resources),
            is_moon: view.flag(&fields.is_moon).unwrap_or(false),
            planet_size: view.text(&fields.planet_size),
        })
    }

    fn attach_planets(
        &self,
        systems: &mut [SystemData],
        pending: Vec<PendingPlanet>,
        diagnostics: &mut ExtractDiagnostics,
    ) {
        if pending.is_empty() {
            return;
        }

        let mut by_glyph = HashMap::new();
        let mut by_name = HashMap::new();
        for (i, system) in systems.iter().enumerate() {
            if let Some(glyph) = &system.glyph_code {
                by_glyph.entry(system_glyph(glyph)).or_insert(i);
            }
            if let Some(name) = &system.name {
                by_name.entry(name.clone()).or_insert(i);
            }
        }

        for planet in pending {
            let parent = planet
                .parent_glyph
                .as_ref()
                .and_then(|x| by_glyph.get(x))
                .or_else(|| planet.parent_name.as_ref().and_then(|x| by_name.get(x)));

            match parent {
                Some(&i) => {
                    systems[i].add_planet(planet.planet);
                }
                None => {
                    tracing::debug!(
                        index = planet.index,
                        planet = %planet.planet.name,
                        "planet record has no matching system"
                    );
                    diagnostics.orphaned_planets += 1;
                }
            }
        }
    }
}

/// The glyph code of the system a glyph code points into.
///
/// A full glyph code is twelve hex digits with the planet index in front;
/// zeroing it addresses the system. Other codes are only normalized.
pub(crate) fn system_glyph(glyph: &str) -> String {
    let mut glyph = normalize_glyph(glyph);
    if glyph.len() == 12 && glyph.bytes().all(|b| b.is_ascii_hexdigit()) {
        glyph.replace_range(..1, "0");
    }
    glyph
}

/// Name of a galaxy by its zero based index
pub fn galaxy_name(index: u32) -> String {
    const NAMES: [&str; 10] = [
        "Euclid",
        "Hilbert Dimension",
        "Calypso",
        "Hesperius Dimension",
        "Hyades",
        "Ickjamatew",
        "Budullangr",
        "Kikolgallr",
        "Eltiensleen",
        "Eissentam",
    ];

    match NAMES.get(index as usize) {
        Some(name) => name.to_string(),
        None => format!("Galaxy {}", u64::from(index) + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("1123ABCDEF01", "0123ABCDEF01")]
    #[case("a123abcdef01", "0123ABCDEF01")]
    #[case("0123ABCDEF01", "0123ABCDEF01")]
    #[case("SYS-42", "SYS-42")]
    #[case(" 1123ABCDEF01 ", "0123ABCDEF01")]
    #[case("abc", "ABC")]
    fn test_system_glyph(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(system_glyph(input), expected);
    }

    #[rstest]
    #[case(0, "Euclid")]
    #[case(9, "Eissentam")]
    #[case(10, "Galaxy 11")]
    #[case(u32::MAX, "Galaxy 4294967296")]
    fn test_galaxy_name(#[case] index: u32, #[case] expected: &str) {
        assert_eq!(galaxy_name(index), expected);
    }

    #[test]
    fn test_malformed_display() {
        let malformed = RecordMalformed {
            index: 4,
            reason: MalformedReason::MissingIdentity {
                kind: RecordKind::SolarSystem,
            },
        };
        assert_eq!(
            malformed.to_string(),
            "SolarSystem record 4 has neither name nor glyph code"
        );
    }

    #[test]
    fn test_dropped_planets_counted_apart() {
        let diagnostics = ExtractDiagnostics {
            malformed: vec![
                RecordMalformed {
                    index: 0,
                    reason: MalformedReason::NotAnObject,
                },
                RecordMalformed {
                    index: 1,
                    reason: MalformedReason::MissingPlanetIdentity { position: 0 },
                },
                RecordMalformed {
                    index: 1,
                    reason: MalformedReason::MissingPlanetIdentity { position: 2 },
                },
            ],
            ..ExtractDiagnostics::default()
        };
        assert_eq!(diagnostics.dropped_records(), 1);
        assert_eq!(diagnostics.dropped_planets(), 2);
    }
}
