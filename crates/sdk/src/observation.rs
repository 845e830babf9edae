//! Observation record types shared between the engine and the testgen client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata attached to a submission, stamped onto every record extracted
/// from it. An ordered map so that serialized payloads are byte-stable for
/// identical submissions.
pub type Metadata = BTreeMap<String, String>;

/// A field observation as the catalog API expects it.
///
/// Matches the `CatalogObservationDTO` JSON contract exactly: camelCase
/// keys, no additional fields, `count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub metadata: Metadata,
    pub field_path: String,
    pub count: u64,
    pub has_null: bool,
    pub has_empty: bool,
}

/// Classification of a single leaf or attribute sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueClass {
    Present,
    Empty,
    Null,
}

/// Per-path tally accumulated during one document walk.
///
/// Invariant: `null_value_count + empty_value_count <= total_occurrences`.
/// Metadata is submission-scoped, so it is attached once at conversion
/// rather than copied into every tally.
#[derive(Debug, Default)]
pub(crate) struct FieldStatistics {
    pub total_occurrences: u64,
    pub null_value_count: u64,
    pub empty_value_count: u64,
}

impl FieldStatistics {
    pub fn record(&mut self, class: ValueClass) {
        self.total_occurrences += 1;
        match class {
            ValueClass::Present => {}
            ValueClass::Empty => self.empty_value_count += 1,
            ValueClass::Null => self.null_value_count += 1,
        }
    }

    pub fn into_observation(self, field_path: String, metadata: &Metadata) -> Observation {
        Observation {
            metadata: metadata.clone(),
            field_path,
            count: self.total_occurrences,
            has_null: self.null_value_count > 0,
            has_empty: self.empty_value_count > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn observation_serializes_to_exact_wire_shape() {
        let mut metadata = Metadata::new();
        metadata.insert("documenttype".to_string(), "PROFILE".to_string());

        let obs = Observation {
            metadata,
            field_path: "/Root/Child".to_string(),
            count: 3,
            has_null: false,
            has_empty: true,
        };

        let value = serde_json::to_value(&obs).unwrap();
        assert_eq!(
            value,
            json!({
                "metadata": {"documenttype": "PROFILE"},
                "fieldPath": "/Root/Child",
                "count": 3,
                "hasNull": false,
                "hasEmpty": true
            })
        );
    }

    #[test]
    fn statistics_derive_flags_from_counts() {
        let mut stats = FieldStatistics::default();
        stats.record(ValueClass::Present);
        stats.record(ValueClass::Empty);
        stats.record(ValueClass::Null);

        assert!(stats.null_value_count + stats.empty_value_count <= stats.total_occurrences);

        let obs = stats.into_observation("/A".to_string(), &Metadata::new());
        assert_eq!(obs.count, 3);
        assert!(obs.has_null);
        assert!(obs.has_empty);
    }

    #[test]
    fn identical_submissions_serialize_byte_equal() {
        let build = || {
            let mut metadata = Metadata::new();
            metadata.insert("b".to_string(), "2".to_string());
            metadata.insert("a".to_string(), "1".to_string());
            Observation {
                metadata,
                field_path: "/X".to_string(),
                count: 1,
                has_null: false,
                has_empty: false,
            }
        };
        let first = serde_json::to_string(&build()).unwrap();
        let second = serde_json::to_string(&build()).unwrap();
        assert_eq!(first, second);
    }
}
