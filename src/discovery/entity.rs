use crate::Object;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discovered star system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemData {
    pub name: Option<String>,
    pub glyph_code: Option<String>,
    pub galaxy: Option<String>,
    pub galaxy_index: Option<u32>,
    pub star_type: Option<String>,
    pub economy_type: Option<String>,
    pub economy_level: Option<String>,
    pub conflict_level: Option<String>,
    pub discovered_by: Option<String>,

    /// Planets and moons in the order the save lists them
    pub planets: Vec<PlanetData>,
}

impl SystemData {
    /// The key a system is matched on across snapshots: the glyph code when
    /// known, otherwise the name. Hex glyph codes match regardless of case.
    pub fn identity(&self) -> Option<SystemIdentity> {
        if let Some(glyph) = self.glyph_code.as_deref().filter(|x| !x.trim().is_empty()) {
            Some(SystemIdentity::Glyph(normalize_glyph(glyph)))
        } else {
            self.name
                .as_deref()
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(|x| SystemIdentity::Name(x.to_owned()))
        }
    }

    /// Finds a planet by name
    pub fn planet(&self, name: &str) -> Option<&PlanetData> {
        self.planets.iter().find(|p| p.name == name)
    }

    /// Adds a planet, or folds it into the planet of the same name.
    /// Returns `true` if the planet is new to the system.
    pub fn add_planet(&mut self, planet: PlanetData) -> bool {
        match self.planets.iter_mut().find(|p| p.name == planet.name) {
            Some(existing) => {
                existing.absorb(planet);
                false
            }
            None => {
                self.planets.push(planet);
                true
            }
        }
    }

    /// Fills fields this record lacks from another record of the same
    /// system
    pub(crate) fn absorb(&mut self, other: SystemData) {
        fill(&mut self.name, other.name);
        fill(&mut self.glyph_code, other.glyph_code);
        fill(&mut self.galaxy, other.galaxy);
        fill(&mut self.galaxy_index, other.galaxy_index);
        fill(&mut self.star_type, other.star_type);
        fill(&mut self.economy_type, other.economy_type);
        fill(&mut self.economy_level, other.economy_level);
        fill(&mut self.conflict_level, other.conflict_level);
        fill(&mut self.discovered_by, other.discovered_by);
        for planet in other.planets {
            self.add_planet(planet);
        }
    }
}

/// A planet or moon of a system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetData {
    pub name: String,
    pub biome: Option<String>,

    /// Resource names without duplicates, in first seen order
    pub resources: Vec<String>,
    pub is_moon: bool,
    pub planet_size: Option<String>,
}

impl PlanetData {
    pub(crate) fn absorb(&mut self, other: PlanetData) {
        fill(&mut self.biome, other.biome);
        fill(&mut self.planet_size, other.planet_size);
        self.is_moon |= other.is_moon;
        for resource in other.resources {
            if !self.resources.contains(&resource) {
                self.resources.push(resource);
            }
        }
    }
}

/// A player base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseData {
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,

    /// Every other field of the base entry, untouched
    pub raw: Object,
}

/// How a system is recognized between two extractions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemIdentity {
    Glyph(String),
    Name(String),
}

impl SystemIdentity {
    /// The glyph code or name, without the variant
    pub fn as_str(&self) -> &str {
        match self {
            SystemIdentity::Glyph(x) | SystemIdentity::Name(x) => x,
        }
    }
}

impl fmt::Display for SystemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemIdentity::Glyph(x) => write!(f, "glyph {}", x),
            SystemIdentity::Name(x) => write!(f, "{:?}", x),
        }
    }
}

/// Trims a glyph code and uppercases it when it is all hex digits. Other
/// codes are kept as written.
pub(crate) fn normalize_glyph(glyph: &str) -> String {
    let glyph = glyph.trim();
    if glyph.bytes().all(|b| b.is_ascii_hexdigit()) {
        glyph.to_ascii_uppercase()
    } else {
        glyph.to_owned()
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}
