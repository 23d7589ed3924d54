use super::composer::{compose_document, compose_drawing, compose_quotation, RequestDocument};
use super::derivation::{
    cart_options, choice_from_label, is_field_visible, quantity_options, tote_options,
    DerivedQuantities, QuantityOption,
};
use super::domain::{DocumentKind, FieldDefinition, FieldKey, FieldValue, QuantityChoice};
use super::schema::FieldSchema;
use super::values::FieldValueMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happens to a stored value once its field becomes hidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFieldPolicy {
    /// Delete the value as soon as the field is hidden.
    #[default]
    Purge,
    /// Keep the value until the user overwrites or clears it.
    Retain,
}

impl FromStr for HiddenFieldPolicy {
    type Err = UnknownPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "purge" | "delete" => Ok(Self::Purge),
            "retain" | "keep" => Ok(Self::Retain),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hidden field policy '{}'", self.0)
    }
}

impl std::error::Error for UnknownPolicy {}

/// One user's in-progress request. Every mutation re-derives the synthetic
/// quantities and then applies the hidden-field policy.
#[derive(Debug, Clone, Default)]
pub struct RequestSession {
    values: FieldValueMap,
    policy: HiddenFieldPolicy,
}

impl RequestSession {
    pub fn new(policy: HiddenFieldPolicy) -> Self {
        Self {
            values: FieldValueMap::new(),
            policy,
        }
    }

    /// Normalises a map posted in one piece (API bodies, CLI input files).
    pub fn from_values(values: FieldValueMap, policy: HiddenFieldPolicy) -> Self {
        let mut session = Self { values, policy };
        session.refresh();
        session
    }

    pub fn policy(&self) -> HiddenFieldPolicy {
        self.policy
    }

    pub fn values(&self) -> &FieldValueMap {
        &self.values
    }

    /// Synthetic keys are owned by the session and cannot be set directly.
    pub fn set_value(&mut self, key: FieldKey, value: impl Into<FieldValue>) -> Vec<FieldKey> {
        if key.is_derived() {
            return Vec::new();
        }
        self.values.insert(key, value);
        self.refresh()
    }

    pub fn set_literal(&mut self, key: FieldKey, value: &str) -> Vec<FieldKey> {
        self.set_value(key, FieldValue::literal(value))
    }

    pub fn clear_value(&mut self, key: &FieldKey) -> Vec<FieldKey> {
        if key.is_derived() {
            return Vec::new();
        }
        self.values.remove(key);
        self.refresh()
    }

    pub fn derived(&self) -> DerivedQuantities {
        DerivedQuantities::from_values(&self.values)
    }

    pub fn visible_fields(&self, kind: DocumentKind) -> Vec<&'static FieldDefinition> {
        FieldSchema::standard()
            .fields_for(kind)
            .filter(|field| is_field_visible(field, &self.values))
            .collect()
    }

    /// Catalog fields currently hidden that still hold a value.
    pub fn stale_fields(&self) -> Vec<FieldKey> {
        FieldSchema::standard()
            .fields()
            .iter()
            .filter(|field| self.values.contains(&field.key))
            .filter(|field| !is_field_visible(field, &self.values))
            .map(|field| field.key)
            .collect()
    }

    pub fn cart_options(&self) -> Vec<String> {
        cart_options(self.derived().surface_count)
    }

    pub fn tote_options(&self) -> Vec<String> {
        tote_options(self.derived().grid_count)
    }

    /// Typed cart options, driven by the surface count.
    pub fn cart_choices(&self) -> Vec<QuantityOption> {
        quantity_options(self.derived().surface_count)
    }

    /// Typed tote options, driven by the grid count.
    pub fn tote_choices(&self) -> Vec<QuantityOption> {
        quantity_options(self.derived().grid_count)
    }

    pub fn quotation(&self) -> String {
        compose_quotation(&self.values)
    }

    pub fn drawing(&self) -> String {
        compose_drawing(&self.values)
    }

    pub fn document(&self, kind: DocumentKind) -> RequestDocument {
        compose_document(kind, &self.values)
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Hands the values to the submit path and leaves the session empty.
    pub fn take_values(&mut self) -> FieldValueMap {
        std::mem::take(&mut self.values)
    }

    fn refresh(&mut self) -> Vec<FieldKey> {
        let derived = self.derived();
        derived.apply_to(&mut self.values);
        self.resolve_quantities(derived);
        match self.policy {
            HiddenFieldPolicy::Retain => Vec::new(),
            HiddenFieldPolicy::Purge => self.purge_hidden(),
        }
    }

    /// Cart/tote values posted as text or bare integers become typed choices.
    /// Text that names no option and no count is left as entered.
    fn resolve_quantities(&mut self, derived: DerivedQuantities) {
        for field in FieldSchema::standard().fields() {
            let Some(unit) = field.quantity_unit() else {
                continue;
            };
            let resolved = match self.values.get(&field.key) {
                Some(FieldValue::Literal(label)) => {
                    choice_from_label(label, derived.base_for(unit), unit)
                }
                Some(FieldValue::DerivedCount(count)) => {
                    Some(QuantityChoice::Custom { count: *count })
                }
                _ => None,
            };
            if let Some(choice) = resolved {
                self.values.insert(field.key, choice);
            }
        }
    }

    fn purge_hidden(&mut self) -> Vec<FieldKey> {
        let mut purged = Vec::new();
        loop {
            let stale = self.stale_fields();
            if stale.is_empty() {
                break;
            }
            for key in stale {
                self.values.remove(&key);
                purged.push(key);
            }
        }
        purged
    }
}
