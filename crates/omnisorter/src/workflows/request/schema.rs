use super::domain::{
    Applicability, DocumentKind, FieldDefinition, FieldDomain, FieldKey, QuantityUnit,
    VisibilityRule,
};
use serde::Serialize;

pub const GRID_TYPE_CART: &str = "カート式";
pub const GRID_TYPE_FIXED_SHELF: &str = "固定（棚）式";
pub const GRID_TYPE_SLOPE: &str = "スロープ式";
pub const CONTAINER_STANDARD_TOTE: &str = "標準トート";
pub const YES: &str = "有";
pub const NO: &str = "無";

const YES_NO: &[&str] = &[YES, NO];

const WHEN_SLOPE: Option<VisibilityRule> = Some(VisibilityRule {
    field: FieldKey::GRID_TYPE,
    equals: GRID_TYPE_SLOPE,
});

static FIELD_CATALOG: [FieldDefinition; 21] = [
    FieldDefinition {
        key: FieldKey::MODEL,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(&["S", "M", "L", "mini"]),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::ROWS,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(&["2", "3", "4", "5"]),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::COLUMNS,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(&["3", "4", "5"]),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::CELL_BLOCKS,
        applicability: Applicability::BOTH,
        domain: FieldDomain::FreeForm,
        note: "最大10",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::GRID_TYPE,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(&[GRID_TYPE_CART, GRID_TYPE_FIXED_SHELF, GRID_TYPE_SLOPE]),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::SHORT_SLOPE_LENGTH,
        applicability: Applicability::BOTH,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::SLOPE_LENGTH,
        applicability: Applicability::BOTH,
        domain: FieldDomain::FreeForm,
        note: "mm単位　※スロープタイプの場合のみ",
        visibility: WHEN_SLOPE,
    },
    FieldDefinition {
        key: FieldKey::DRAWER_AVAILABILITY,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(YES_NO),
        note: "※スロープタイプの場合のみ",
        visibility: WHEN_SLOPE,
    },
    FieldDefinition {
        key: FieldKey::CONTAINER_TYPE,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(&[CONTAINER_STANDARD_TOTE, "個別容器", "無し"]),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::CONTAINER_DEPTH,
        applicability: Applicability::DRAWING,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::CONTAINER_WIDTH,
        applicability: Applicability::DRAWING,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::CONTAINER_HEIGHT,
        applicability: Applicability::DRAWING,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::PRODUCT_MAX_DEPTH,
        applicability: Applicability::DRAWING,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::PRODUCT_MAX_WIDTH,
        applicability: Applicability::DRAWING,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::PRODUCT_MAX_HEIGHT,
        applicability: Applicability::DRAWING,
        domain: FieldDomain::FreeForm,
        note: "mm単位",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::DAS,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(YES_NO),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::FULL_SENSOR,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(YES_NO),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::ADDITIONAL_CART,
        applicability: Applicability::QUOTATION,
        domain: FieldDomain::DerivedOptions(QuantityUnit::Cart),
        note: "※カート式の場合のみ",
        visibility: Some(VisibilityRule {
            field: FieldKey::GRID_TYPE,
            equals: GRID_TYPE_CART,
        }),
    },
    FieldDefinition {
        key: FieldKey::ADDITIONAL_TOTE,
        applicability: Applicability::QUOTATION,
        domain: FieldDomain::DerivedOptions(QuantityUnit::Tote),
        note: "※標準トートの場合のみ",
        visibility: Some(VisibilityRule {
            field: FieldKey::CONTAINER_TYPE,
            equals: CONTAINER_STANDARD_TOTE,
        }),
    },
    FieldDefinition {
        key: FieldKey::ANTI_SLIP_BELT,
        applicability: Applicability::QUOTATION,
        domain: FieldDomain::Choices(YES_NO),
        note: "",
        visibility: None,
    },
    FieldDefinition {
        key: FieldKey::THIN_ITEM_SUPPORT,
        applicability: Applicability::BOTH,
        domain: FieldDomain::Choices(YES_NO),
        note: "",
        visibility: None,
    },
];

/// Read-only catalog of every input field, in display order.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    fields: &'static [FieldDefinition],
}

impl FieldSchema {
    pub fn standard() -> Self {
        Self {
            fields: &FIELD_CATALOG,
        }
    }

    pub fn fields(&self) -> &'static [FieldDefinition] {
        self.fields
    }

    pub fn fields_for(&self, kind: DocumentKind) -> impl Iterator<Item = &'static FieldDefinition> {
        self.fields
            .iter()
            .filter(move |field| field.applies_to(kind))
    }

    pub fn field(&self, key: &FieldKey) -> Option<&'static FieldDefinition> {
        self.fields.iter().find(|field| field.key == *key)
    }
}

/// Flattened catalog entry for API responses and the command line.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub key: String,
    pub group: &'static str,
    pub subitem: &'static str,
    pub documents: Vec<DocumentKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_unit: Option<QuantityUnit>,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub note: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<String>,
}

impl From<&FieldDefinition> for FieldView {
    fn from(field: &FieldDefinition) -> Self {
        let choices = match field.domain {
            FieldDomain::Choices(choices) => choices.to_vec(),
            _ => Vec::new(),
        };

        Self {
            key: field.key.to_string(),
            group: field.key.group.label(),
            subitem: field.key.subitem.label(),
            documents: DocumentKind::ordered()
                .into_iter()
                .filter(|kind| field.applies_to(*kind))
                .collect(),
            choices,
            quantity_unit: field.quantity_unit(),
            note: field.note,
            visible_when: field
                .visibility
                .map(|rule| format!("{} = {}", rule.field, rule.equals)),
        }
    }
}

impl FieldSchema {
    /// Catalog views, optionally restricted to one document.
    pub fn views(&self, kind: Option<DocumentKind>) -> Vec<FieldView> {
        self.fields
            .iter()
            .filter(|field| kind.map_or(true, |kind| field.applies_to(kind)))
            .map(FieldView::from)
            .collect()
    }
}

pub fn all_fields() -> &'static [FieldDefinition] {
    FieldSchema::standard().fields()
}

pub fn fields_for(kind: DocumentKind) -> Vec<&'static FieldDefinition> {
    FieldSchema::standard().fields_for(kind).collect()
}
