//! Point-id index built from per-object metadata.
//!
//! Object metadata is externally authored, so parsing is deliberately
//! lenient: entries that are not objects, lack an `id`, or carry a
//! non-integer id are skipped without complaint. The index is built once
//! per validation run and is read-only afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::types::PointKind;

/// The id sets one object (or the cross-object union) exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointSets {
    pub contact: BTreeSet<i64>,
    pub functional: BTreeSet<i64>,
}

impl PointSets {
    pub fn kind_set(&self, kind: PointKind) -> &BTreeSet<i64> {
        match kind {
            PointKind::Contact => &self.contact,
            PointKind::Functional => &self.functional,
        }
    }

    /// Membership in either kind.
    pub fn contains_any(&self, id: i64) -> bool {
        self.contact.contains(&id) || self.functional.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.contact.is_empty() && self.functional.is_empty()
    }

    fn absorb(&mut self, other: &PointSets) {
        self.contact.extend(other.contact.iter().copied());
        self.functional.extend(other.functional.iter().copied());
    }
}

/// Per-object point-id sets plus the union across all objects.
#[derive(Debug, Clone, Default)]
pub struct PointIndex {
    objects: BTreeMap<String, PointSets>,
    union: PointSets,
}

impl PointIndex {
    /// Build the index from a map of object name to that object's
    /// `points_info` metadata value.
    pub fn build(points_info_by_object: &BTreeMap<String, Value>) -> Self {
        let mut objects = BTreeMap::new();
        let mut union = PointSets::default();

        for (name, info) in points_info_by_object {
            let sets = PointSets {
                contact: collect_ids(info, "contact_points"),
                functional: collect_ids(info, "functional_points"),
            };
            union.absorb(&sets);
            objects.insert(name.clone(), sets);
        }

        PointIndex { objects, union }
    }

    pub fn object(&self, name: &str) -> Option<&PointSets> {
        self.objects.get(name)
    }

    /// The cross-object union of all ids, per kind.
    pub fn union(&self) -> &PointSets {
        &self.union
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Flatten the id fields of one point list. An `id` may be a single
/// integer or a list of integers; anything else is skipped.
fn collect_ids(info: &Value, key: &str) -> BTreeSet<i64> {
    let mut ids = BTreeSet::new();
    let entries = match info.get(key).and_then(Value::as_array) {
        Some(entries) => entries,
        None => return ids,
    };
    for entry in entries {
        let id = match entry.get("id") {
            Some(id) => id,
            None => continue,
        };
        match id {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ids.insert(i);
                }
            }
            Value::Array(items) => {
                ids.extend(items.iter().filter_map(Value::as_i64));
            }
            _ => {}
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_index() -> PointIndex {
        let mut map = BTreeMap::new();
        map.insert(
            "wrench".to_string(),
            json!({
                "contact_points": [{"id": 0}, {"id": [1, 2]}],
                "functional_points": [{"id": 5}]
            }),
        );
        map.insert(
            "bolt".to_string(),
            json!({
                "contact_points": [{"id": 3}],
                "functional_points": [{"id": [6, 7]}]
            }),
        );
        PointIndex::build(&map)
    }

    #[test]
    fn test_build_flattens_scalar_and_list_ids() {
        let index = sample_index();
        let wrench = index.object("wrench").unwrap();
        assert_eq!(
            wrench.contact.iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(wrench.functional.iter().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_union_aggregates_across_objects() {
        let index = sample_index();
        assert!(index.union().contact.contains(&0));
        assert!(index.union().contact.contains(&3));
        assert!(index.union().functional.contains(&7));
        assert!(index.union().contains_any(6));
        assert!(!index.union().contains_any(42));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let mut map = BTreeMap::new();
        map.insert(
            "cup".to_string(),
            json!({
                "contact_points": [
                    "not-an-object",
                    {"no_id": 1},
                    {"id": "zero"},
                    {"id": 1.5},
                    {"id": 4}
                ],
                "functional_points": "nope"
            }),
        );
        let index = PointIndex::build(&map);
        let cup = index.object("cup").unwrap();
        assert_eq!(cup.contact.iter().copied().collect::<Vec<_>>(), vec![4]);
        assert!(cup.functional.is_empty());
    }

    #[test]
    fn test_missing_metadata_object_is_absent() {
        let index = sample_index();
        assert!(index.object("hammer").is_none());
    }
}
