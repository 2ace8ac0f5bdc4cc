use serde::{Deserialize, Serialize};

/// Where discovery data lives in a renamed save and what its fields are
/// called.
///
/// Each field is looked up under a list of aliases, tried in order, first on
/// the record itself and then inside each of the payload containers. A value
/// that is blank or of the wrong type is skipped in favour of the next. Game
/// updates tend to move or rename fields, so a schema can be loaded from
/// JSON with any subset of fields overridden:
///
/// ```
/// use waypoint::discovery::Schema;
///
/// let schema: Schema = serde_json::from_str(r#"{
///     "record_path": ["DiscoveryManagerData", "DiscoveryData-v2", "Store", "Record"],
///     "fields": { "star_type": ["StarClass"] }
/// }"#).unwrap();
///
/// assert_eq!(schema.record_path[1], "DiscoveryData-v2");
/// assert_eq!(schema.fields.star_type, vec!["StarClass"]);
/// assert_eq!(schema.base_path, Schema::default().base_path);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Keys leading to the array of discovery records
    pub record_path: Vec<String>,

    /// Keys leading to the array of player bases
    pub base_path: Vec<String>,

    /// Nested objects of a record that may hold its fields
    pub payload_keys: Vec<String>,

    /// Field aliases
    pub fields: FieldAliases,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            record_path: names(&["DiscoveryManagerData", "DiscoveryData-v1", "Store", "Record"]),
            base_path: names(&["PlayerStateData", "PersistentPlayerBases"]),
            payload_keys: names(&["DiscoveryData", "Metadata", "OwnershipData"]),
            fields: FieldAliases::default(),
        }
    }
}

/// Candidate key names for every field the extractor reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    /// Record discriminator (`SolarSystem`, `Planet`, `Base`, ...)
    pub discovery_type: Vec<String>,

    /// Display name. A player's custom name is listed before the generated
    /// one.
    pub name: Vec<String>,

    /// Twelve hex digit portal address
    pub glyph_code: Vec<String>,

    /// Galaxy name, used before `galaxy_index`
    pub galaxy: Vec<String>,
    pub galaxy_index: Vec<String>,
    pub star_type: Vec<String>,
    pub economy_type: Vec<String>,
    pub economy_level: Vec<String>,
    pub conflict_level: Vec<String>,

    /// Player who uploaded the discovery
    pub discovered_by: Vec<String>,

    /// Array of planets nested in a system record
    pub planets: Vec<String>,

    /// Glyph code of the system a sibling planet record belongs to
    pub system_glyph_code: Vec<String>,

    /// Name of the system a sibling planet record belongs to
    pub system_name: Vec<String>,

    pub biome: Vec<String>,

    /// List of resource names, or a single name
    pub resources: Vec<String>,

    /// Moon flag, as a bool, `0`/`1`, or yes/no text
    pub is_moon: Vec<String>,
    pub planet_size: Vec<String>,

    /// Base latitude in degrees
    pub latitude: Vec<String>,

    /// Base longitude in degrees
    pub longitude: Vec<String>,

    /// Cartesian position on the planet, used when latitude and longitude
    /// are absent
    pub position: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        FieldAliases {
            discovery_type: names(&["DiscoveryType", "Type"]),
            name: names(&["CustomName", "Name"]),
            glyph_code: names(&["GlyphCode", "PortalCode"]),
            galaxy: names(&["Galaxy", "GalaxyName"]),
            galaxy_index: names(&["GalaxyIndex", "RealityIndex"]),
            star_type: names(&["StarType", "StarClass"]),
            economy_type: names(&["EconomyType", "TradingClass"]),
            economy_level: names(&["EconomyLevel", "WealthClass"]),
            conflict_level: names(&["ConflictLevel", "ConflictData"]),
            discovered_by: names(&["DiscoveredBy", "Username", "UserName"]),
            planets: names(&["Planets"]),
            system_glyph_code: names(&["SystemGlyphCode", "ParentGlyphCode"]),
            system_name: names(&["SystemName"]),
            biome: names(&["Biome"]),
            resources: names(&["Resources"]),
            is_moon: names(&["IsMoon"]),
            planet_size: names(&["PlanetSize", "SizeClass"]),
            latitude: names(&["Latitude"]),
            longitude: names(&["Longitude"]),
            position: names(&["Position"]),
        }
    }
}

fn names(x: &[&str]) -> Vec<String> {
    x.iter().map(|s| s.to_string()).collect()
}
