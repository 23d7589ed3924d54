//! Projects a value map into the quotation request (Japanese) and the drawing
//! request (English). Both projections are pure and total: missing or blank
//! values only shorten the document.

mod document;
mod translation;

pub use document::{DocumentEntry, DocumentSection, RequestDocument};
pub use translation::TranslationTable;

use super::derivation::DerivedQuantities;
use super::domain::{DocumentKind, FieldDefinition, FieldGroup, FieldKey, FieldValue, SubItem};
use super::schema::FieldSchema;
use super::values::FieldValueMap;

pub const QUOTATION_HEADER: &str = "【OmniSorter 見積依頼】";
pub const QUOTATION_FOOTER: &str = "以上の仕様にてお見積りをお願いいたします。";
pub const DRAWING_HEADER: &str = "[OmniSorter Drawing Request]";
pub const DRAWING_FOOTER: &str =
    "Please prepare the layout drawing based on the specification above.";

#[derive(Debug, Clone, Copy)]
struct DocumentStyle {
    kind: DocumentKind,
    header: &'static str,
    footer: &'static str,
    millimetre_suffix: &'static str,
    translation: Option<TranslationTable>,
}

impl DocumentStyle {
    const fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Quotation => Self {
                kind,
                header: QUOTATION_HEADER,
                footer: QUOTATION_FOOTER,
                millimetre_suffix: "mm",
                translation: None,
            },
            DocumentKind::Drawing => Self {
                kind,
                header: DRAWING_HEADER,
                footer: DRAWING_FOOTER,
                millimetre_suffix: " mm",
                translation: Some(TranslationTable::japanese_to_english()),
            },
        }
    }

    fn group_name(&self, group: FieldGroup) -> String {
        match &self.translation {
            Some(table) => table.group(group.label()).to_string(),
            None => group.label().to_string(),
        }
    }

    fn label(&self, subitem: SubItem) -> Option<String> {
        if subitem == SubItem::None {
            return None;
        }
        let label = match &self.translation {
            Some(table) => table.label(subitem.label()),
            None => subitem.label(),
        };
        Some(label.to_string())
    }

    fn literal<'a>(&self, raw: &'a str) -> &'a str {
        match &self.translation {
            Some(table) => table.value(raw),
            None => raw,
        }
    }

    fn millimetres(&self, field: &FieldDefinition, mut text: String) -> String {
        if field.requires_millimetres() && !text.ends_with("mm") {
            text.push_str(self.millimetre_suffix);
        }
        text
    }

    fn value(&self, field: &FieldDefinition, value: &FieldValue) -> Option<String> {
        match value {
            FieldValue::Literal(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return None;
                }
                Some(self.millimetres(field, self.literal(raw).to_string()))
            }
            FieldValue::DerivedCount(count) => Some(self.millimetres(field, count.to_string())),
            FieldValue::Quantity(choice) => Some(match field.quantity_unit() {
                Some(unit) => choice.label(unit),
                None => choice.count().to_string(),
            }),
        }
    }
}

/// Grid count shown in both documents: recomputed from 段/列/ブロック, falling
/// back to the stored synthetic key for maps that carry only the result.
fn grid_count(values: &FieldValueMap) -> Option<u32> {
    let derived = DerivedQuantities::from_values(values).grid_count;
    if derived > 0 {
        return Some(derived);
    }
    values.count(&FieldKey::GRID_COUNT).filter(|count| *count > 0)
}

fn section_for<'a>(
    sections: &'a mut Vec<(FieldGroup, DocumentSection)>,
    group: FieldGroup,
    style: &DocumentStyle,
) -> &'a mut DocumentSection {
    let index = match sections.iter().position(|(seen, _)| *seen == group) {
        Some(index) => index,
        None => {
            sections.push((
                group,
                DocumentSection {
                    category: style.group_name(group),
                    entries: Vec::new(),
                },
            ));
            sections.len() - 1
        }
    };
    &mut sections[index].1
}

pub fn compose_document(kind: DocumentKind, values: &FieldValueMap) -> RequestDocument {
    let style = DocumentStyle::for_kind(kind);
    let mut sections: Vec<(FieldGroup, DocumentSection)> = Vec::new();

    for field in FieldSchema::standard().fields_for(kind) {
        let Some(value) = values
            .get(&field.key)
            .and_then(|value| style.value(field, value))
        else {
            continue;
        };

        let entry = DocumentEntry {
            label: style.label(field.key.subitem),
            value,
        };
        section_for(&mut sections, field.key.group, &style)
            .entries
            .push(entry);
    }

    if let Some(count) = grid_count(values) {
        section_for(&mut sections, FieldGroup::MainConfiguration, &style)
            .entries
            .push(DocumentEntry {
                label: style.label(SubItem::GridCount),
                value: count.to_string(),
            });
    }

    RequestDocument {
        kind: style.kind,
        header: style.header.to_string(),
        sections: sections.into_iter().map(|(_, section)| section).collect(),
        footer: style.footer.to_string(),
    }
}

pub fn quotation_document(values: &FieldValueMap) -> RequestDocument {
    compose_document(DocumentKind::Quotation, values)
}

pub fn drawing_document(values: &FieldValueMap) -> RequestDocument {
    compose_document(DocumentKind::Drawing, values)
}

pub fn compose_quotation(values: &FieldValueMap) -> String {
    quotation_document(values).render()
}

pub fn compose_drawing(values: &FieldValueMap) -> String {
    drawing_document(values).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::request::domain::{Multiplier, QuantityChoice};
    use crate::workflows::request::schema::{GRID_TYPE_CART, GRID_TYPE_FIXED_SHELF, YES};

    fn sample_values() -> FieldValueMap {
        let mut values = FieldValueMap::new();
        values.insert(FieldKey::MODEL, "S");
        values.insert(FieldKey::ROWS, "4");
        values.insert(FieldKey::COLUMNS, "3");
        values.insert(FieldKey::CELL_BLOCKS, "2");
        values.insert(FieldKey::GRID_TYPE, GRID_TYPE_FIXED_SHELF);
        values.insert(FieldKey::DAS, YES);
        DerivedQuantities::from_values(&values).apply_to(&mut values);
        values
    }

    #[test]
    fn empty_map_renders_header_and_footer_only() {
        let values = FieldValueMap::new();
        assert_eq!(
            compose_quotation(&values),
            format!("{QUOTATION_HEADER}\n\n{QUOTATION_FOOTER}")
        );
        assert_eq!(
            compose_drawing(&values),
            format!("{DRAWING_HEADER}\n\n{DRAWING_FOOTER}")
        );
    }

    #[test]
    fn quotation_groups_fields_and_appends_grid_count() {
        let text = compose_quotation(&sample_values());
        let expected = format!(
            "{QUOTATION_HEADER}\n\n\
OS機種:\n  S\n\n\
本体構成:\n  段: 4\n  列: 3\n  ブロック: 2\n  間口タイプ: 固定（棚）式\n  間口数: 48\n\n\
オプション:\n  DAS: 有\n\n\
{QUOTATION_FOOTER}"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn drawing_translates_groups_labels_and_values() {
        let document = drawing_document(&sample_values());
        let main = document
            .section("Main Configuration")
            .expect("main configuration section");
        assert_eq!(
            main.entries.last(),
            Some(&DocumentEntry {
                label: Some("Grid Count".to_string()),
                value: "48".to_string(),
            })
        );

        let text = document.render();
        assert!(text.starts_with(DRAWING_HEADER));
        assert!(text.contains("Model:\n  S\n"));
        assert!(text.contains("  Grid Type: Fixed-Shelf\n"));
        assert!(text.contains("Options:\n  DAS: Yes\n"));
        assert!(!text.contains("本体構成"));
    }

    #[test]
    fn millimetre_suffix_depends_on_language() {
        let mut values = FieldValueMap::new();
        values.insert(FieldKey::SHORT_SLOPE_LENGTH, "300");
        values.insert(FieldKey::CONTAINER_DEPTH, "450mm");

        let quotation = compose_quotation(&values);
        assert!(quotation.contains("  短スロープ長さ: 300mm\n"));
        assert!(!quotation.contains("奥行"));

        let drawing = compose_drawing(&values);
        assert!(drawing.contains("  Short Slope Length: 300 mm\n"));
        assert!(drawing.contains("Container:\n  Depth: 450mm\n"));
    }

    #[test]
    fn blank_and_unlisted_values_are_skipped_or_passed_through() {
        let mut values = FieldValueMap::new();
        values.insert(FieldKey::MODEL, "   ");
        values.insert(FieldKey::FULL_SENSOR, "要相談");

        let quotation = quotation_document(&values);
        assert_eq!(quotation.sections.len(), 1);
        assert!(quotation.section("OS機種").is_none());

        let drawing = compose_drawing(&values);
        assert!(drawing.contains("  Full Sensor: 要相談\n"));
    }

    #[test]
    fn quantity_choices_render_with_unit_counters() {
        let mut values = FieldValueMap::new();
        values.insert(FieldKey::GRID_TYPE, GRID_TYPE_CART);
        values.insert(
            FieldKey::ADDITIONAL_CART,
            QuantityChoice::Derived {
                count: 4,
                multiplier: Multiplier::One,
            },
        );
        values.insert(
            FieldKey::ADDITIONAL_TOTE,
            QuantityChoice::Custom { count: 30 },
        );

        let quotation = compose_quotation(&values);
        assert!(quotation.contains("  追加カート: 4台 (1倍)\n"));
        assert!(quotation.contains("  追加トート: 30個\n"));
        assert!(!compose_drawing(&values).contains("Additional Cart"));
    }

    #[test]
    fn grid_count_falls_back_to_stored_key() {
        let mut values = FieldValueMap::new();
        values.insert(FieldKey::GRID_COUNT, FieldValue::DerivedCount(60));
        assert!(compose_quotation(&values).contains("本体構成:\n  間口数: 60\n"));

        values.insert(FieldKey::GRID_COUNT, FieldValue::DerivedCount(0));
        assert!(quotation_document(&values).is_empty());
    }

    #[test]
    fn composition_is_idempotent() {
        let values = sample_values();
        assert_eq!(compose_quotation(&values), compose_quotation(&values));
        assert_eq!(compose_drawing(&values), compose_drawing(&values));
    }
}
