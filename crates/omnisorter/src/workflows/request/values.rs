use super::derivation::parse_count;
use super::domain::{FieldGroup, FieldKey, FieldValue, SubItem};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Values entered for one in-progress request, keyed by `(group, subitem)`.
///
/// A missing key means "not entered yet"; the map never stores placeholders
/// and never drops entries on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValueMap {
    entries: BTreeMap<FieldKey, FieldValue>,
}

impl FieldValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    /// Non-blank literal stored under `key`.
    pub fn literal(&self, key: &FieldKey) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(FieldValue::as_literal)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Integer stored under `key`, whether derived or typed in as text.
    pub fn count(&self, key: &FieldKey) -> Option<u32> {
        match self.entries.get(key)? {
            FieldValue::DerivedCount(count) => Some(*count),
            FieldValue::Literal(value) => parse_count(value),
            FieldValue::Quantity(choice) => Some(choice.count()),
        }
    }

    pub fn is_present(&self, key: &FieldKey) -> bool {
        self.entries
            .get(key)
            .map(|value| !value.is_blank())
            .unwrap_or(false)
    }

    pub fn insert(&mut self, key: FieldKey, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.entries.insert(key, value.into())
    }

    pub fn remove(&mut self, key: &FieldKey) -> Option<FieldValue> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.entries.iter()
    }
}

impl FromIterator<(FieldKey, FieldValue)> for FieldValueMap {
    fn from_iter<T: IntoIterator<Item = (FieldKey, FieldValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// Snapshots are nested `{ group: { subitem: value } }` objects so stored
// records keep the two-part key intact.
impl Serialize for FieldValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut nested: BTreeMap<FieldGroup, BTreeMap<&'static str, &FieldValue>> =
            BTreeMap::new();
        for (key, value) in &self.entries {
            nested
                .entry(key.group)
                .or_default()
                .insert(key.subitem.label(), value);
        }

        let mut map = serializer.serialize_map(Some(nested.len()))?;
        for (group, items) in &nested {
            map.serialize_entry(group.label(), items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nested = BTreeMap::<String, BTreeMap<String, FieldValue>>::deserialize(deserializer)?;
        let mut values = FieldValueMap::new();

        for (group_label, items) in nested {
            let group = FieldGroup::from_label(&group_label)
                .ok_or_else(|| D::Error::custom(format!("unknown field group '{group_label}'")))?;
            for (item_label, value) in items {
                let subitem = SubItem::from_label(&item_label).ok_or_else(|| {
                    D::Error::custom(format!(
                        "unknown sub-item '{item_label}' in group '{group_label}'"
                    ))
                })?;
                values.insert(FieldKey::new(group, subitem), value);
            }
        }

        Ok(values)
    }
}
