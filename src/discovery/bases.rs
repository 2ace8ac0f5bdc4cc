use crate::discovery::{record, record::RecordView, BaseData, Schema};
use crate::{Object, Value};

/// Reads the player base list. Returns the bases along with the number of
/// entries that were skipped.
pub(crate) fn scan_bases(doc: &Value, schema: &Schema) -> (Vec<BaseData>, usize) {
    let entries = match doc.pointer(&schema.base_path) {
        Some(Value::Array(entries)) => entries.as_slice(),
        Some(other) => {
            tracing::warn!(kind = other.kind_name(), "base list is not an array");
            return (Vec::new(), 0);
        }
        None => return (Vec::new(), 0),
    };

    let mut bases = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (index, entry) in entries.iter().enumerate() {
        let base = entry
            .as_object()
            .and_then(|obj| read_base(RecordView::new(obj, schema), schema));

        match base {
            Some(base) => bases.push(base),
            None => {
                tracing::debug!(index, "skipping base without coordinates");
                skipped += 1;
            }
        }
    }

    (bases, skipped)
}

/// Reads a single base. A base without a usable location is `None`.
pub(crate) fn read_base(view: RecordView<'_>, schema: &Schema) -> Option<BaseData> {
    let fields = &schema.fields;
    let coords = view
        .float(&fields.latitude)
        .zip(view.float(&fields.longitude))
        .or_else(|| {
            view.field(&fields.position)
                .and_then(Value::as_array)
                .and_then(position_to_coords)
        });

    let (latitude, longitude) = coords?;
    let consumed = |key: &str| {
        [&fields.name, &fields.latitude, &fields.longitude]
            .iter()
            .any(|aliases| aliases.iter().any(|x| x == key))
    };

    let raw: Object = view
        .object()
        .iter()
        .filter(|(key, _)| !consumed(*key))
        .map(|(key, value)| (key, value.clone()))
        .collect();

    Some(BaseData {
        name: view.text(&fields.name),
        latitude,
        longitude,
        raw,
    })
}

/// Converts a position on a planet's surface into latitude and longitude
/// in degrees. The planet is centered on the origin with y pointing north.
pub(crate) fn position_to_coords(position: &[Value]) -> Option<(f64, f64)> {
    let [x, y, z] = position else {
        return None;
    };

    let (x, y, z) = (record::float(x)?, record::float(y)?, record::float(z)?);
    let radius = (x * x + y * y + z * z).sqrt();
    if radius == 0.0 || !radius.is_finite() {
        return None;
    }

    let latitude = (y / radius).asin().to_degrees();
    let longitude = z.atan2(x).to_degrees();
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn v(text: &str) -> Value {
        text.parse().unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[rstest]
    #[case("[1, 0, 0]", Some((0.0, 0.0)))]
    #[case("[0, 5, 0]", Some((90.0, 0.0)))]
    #[case("[0, -2, 0]", Some((-90.0, 0.0)))]
    #[case("[0, 0, 3]", Some((0.0, 90.0)))]
    #[case("[-1, 0, 0]", Some((0.0, 180.0)))]
    #[case("[\"1\", 0, 0]", Some((0.0, 0.0)))]
    #[case("[0, 0, 0]", None)]
    #[case("[1, 0]", None)]
    #[case("[1, \"north\", 0]", None)]
    fn test_position_to_coords(#[case] input: &str, #[case] expected: Option<(f64, f64)>) {
        let value = v(input);
        let actual = position_to_coords(value.as_array().unwrap());
        match (actual, expected) {
            (Some((lat, lon)), Some((elat, elon))) => {
                assert!(close(lat, elat), "latitude {} != {}", lat, elat);
                assert!(close(lon, elon), "longitude {} != {}", lon, elon);
            }
            (actual, expected) => assert_eq!(actual, expected),
        }
    }

    #[test]
    fn test_read_base_keeps_remaining_fields() {
        let schema = Schema::default();
        let entry = v(r#"{"Name": "Outpost", "Latitude": 12.5, "Longitude": "-40",
            "BaseType": "HomePlanetBase", "Objects": [1, 2]}"#);
        let base = read_base(RecordView::new(entry.as_object().unwrap(), &schema), &schema).unwrap();

        assert_eq!(base.name.as_deref(), Some("Outpost"));
        assert_eq!(base.latitude, 12.5);
        assert_eq!(base.longitude, -40.0);
        let keys: Vec<_> = base.raw.keys().collect();
        assert_eq!(keys, vec!["BaseType", "Objects"]);
    }

    #[test]
    fn test_read_base_from_position() {
        let schema = Schema::default();
        let entry = v(r#"{"Name": "Pole", "Position": [0.0, 100.0, 0.0]}"#);
        let base = read_base(RecordView::new(entry.as_object().unwrap(), &schema), &schema).unwrap();
        assert!(close(base.latitude, 90.0));
        assert!(base.raw.contains_key("Position"));
    }

    #[test]
    fn test_scan_bases_counts_skipped() {
        let schema = Schema::default();
        let doc = v(r#"{"PlayerStateData": {"PersistentPlayerBases": [
            {"Name": "A", "Latitude": 1, "Longitude": 2},
            {"Name": "B"},
            7,
            {"Latitude": 3, "Longitude": 4}
        ]}}"#);

        let (bases, skipped) = scan_bases(&doc, &schema);
        assert_eq!(skipped, 2);
        assert_eq!(bases.len(), 2);
        assert_eq!(bases[0].name.as_deref(), Some("A"));
        assert_eq!(bases[1].name, None);
        assert_eq!(bases[1].longitude, 4.0);
    }

    #[test]
    fn test_scan_bases_without_list() {
        let schema = Schema::default();
        assert_eq!(scan_bases(&v("{}"), &schema), (Vec::new(), 0));
        assert_eq!(scan_bases(&v(r#"{"PlayerStateData": {"PersistentPlayerBases": 3}}"#), &schema).1, 0);
    }
}
