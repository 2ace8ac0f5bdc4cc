//! Recovers typed discoveries from a renamed save document.
//!
//! The save keeps every discovery in a single record store. Each record
//! carries a discriminator telling what it describes: a star system, a
//! planet, a player base, or one of the many kinds this crate has no use
//! for (flora, fauna, points of interest). Systems and their planets are
//! materialized into [`SystemData`], bases into [`BaseData`]. The player's
//! own base list lives elsewhere in the document and is read as well.
//!
//! Extraction never fails. A record that can't be made sense of is dropped
//! and reported in [`ExtractDiagnostics`]. Where fields live and what they
//! are called is described by a [`Schema`].
//!
//! Two snapshots of a system can be compared with [`compare`] to tell
//! whether anything changed and whether the change matters.

mod bases;
mod compare;
mod entity;
mod extract;
mod record;
mod schema;

pub use self::compare::{
    compare, compare_snapshots, ComparisonResult, FieldChange, SystemChange, SystemField,
};
pub use self::entity::{BaseData, PlanetData, SystemData, SystemIdentity};
pub use self::extract::{
    galaxy_name, DiscoveryExtractor, ExtractDiagnostics, Extraction, MalformedReason,
    RecordMalformed,
};
pub use self::record::RecordKind;
pub use self::schema::{FieldAliases, Schema};

use crate::Value;

/// Extracts systems and bases with the default schema
pub fn extract(doc: &Value) -> Extraction {
    DiscoveryExtractor::new().extract(doc)
}

/// Extracts the player base list with the default schema
pub fn extract_bases(doc: &Value) -> Vec<BaseData> {
    DiscoveryExtractor::new().extract_bases(doc)
}
