use super::domain::{
    FieldDefinition, FieldKey, FieldValue, Multiplier, QuantityChoice, QuantityUnit,
};
use super::values::FieldValueMap;
use serde::Serialize;

/// Label of the option that switches the UI to a typed-in count.
pub const CUSTOM_ENTRY_LABEL: &str = "自由入力";

/// Parses a user-entered count; anything other than a non-negative integer is `None`.
pub fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Sorting openings: `rows * columns * 2 * cell_blocks`, or 0 when any input is unusable.
pub fn compute_grid_count(
    rows: Option<&str>,
    columns: Option<&str>,
    cell_blocks: Option<&str>,
) -> u32 {
    grid_count_of(
        rows.and_then(parse_count),
        columns.and_then(parse_count),
        cell_blocks.and_then(parse_count),
    )
}

/// Physical faces: `cell_blocks * 2`, or 0 when the input is unusable.
pub fn compute_surface_count(cell_blocks: Option<&str>) -> u32 {
    surface_count_of(cell_blocks.and_then(parse_count))
}

/// Grid count over already-parsed inputs. Overflow yields 0.
pub fn grid_count_of(rows: Option<u32>, columns: Option<u32>, cell_blocks: Option<u32>) -> u32 {
    let (Some(rows), Some(columns), Some(cell_blocks)) = (rows, columns, cell_blocks) else {
        return 0;
    };

    rows.checked_mul(columns)
        .and_then(|value| value.checked_mul(2))
        .and_then(|value| value.checked_mul(cell_blocks))
        .unwrap_or(0)
}

pub fn surface_count_of(cell_blocks: Option<u32>) -> u32 {
    cell_blocks
        .and_then(|blocks| blocks.checked_mul(2))
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DerivedQuantities {
    pub grid_count: u32,
    pub surface_count: u32,
}

impl DerivedQuantities {
    /// Inputs may be typed-in text or plain integers.
    pub fn from_values(values: &FieldValueMap) -> Self {
        let cell_blocks = values.count(&FieldKey::CELL_BLOCKS);

        Self {
            grid_count: grid_count_of(
                values.count(&FieldKey::ROWS),
                values.count(&FieldKey::COLUMNS),
                cell_blocks,
            ),
            surface_count: surface_count_of(cell_blocks),
        }
    }

    /// Quantity the option list for `unit` is built from.
    pub fn base_for(self, unit: QuantityUnit) -> u32 {
        match unit {
            QuantityUnit::Cart => self.surface_count,
            QuantityUnit::Tote => self.grid_count,
        }
    }

    /// Writes both synthetic keys; a zero quantity removes its key.
    pub fn apply_to(self, values: &mut FieldValueMap) {
        for (key, quantity) in [
            (FieldKey::GRID_COUNT, self.grid_count),
            (FieldKey::SURFACE_COUNT, self.surface_count),
        ] {
            if quantity > 0 {
                values.insert(key, FieldValue::DerivedCount(quantity));
            } else {
                values.remove(&key);
            }
        }
    }
}

/// One entry of a derived option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOption {
    Placeholder,
    Choice(QuantityChoice),
    CustomEntry,
}

impl QuantityOption {
    pub fn label(&self, unit: QuantityUnit) -> String {
        match self {
            Self::Placeholder => String::new(),
            Self::Choice(choice) => choice.label(unit),
            Self::CustomEntry => CUSTOM_ENTRY_LABEL.to_string(),
        }
    }
}

/// Placeholder, the four multiplier choices, then the custom-entry sentinel.
pub fn quantity_options(base: u32) -> Vec<QuantityOption> {
    if base == 0 {
        return vec![QuantityOption::Placeholder];
    }

    let mut options = vec![QuantityOption::Placeholder];
    options.extend(Multiplier::ordered().into_iter().map(|multiplier| {
        QuantityOption::Choice(QuantityChoice::Derived {
            count: multiplier.apply(base),
            multiplier,
        })
    }));
    options.push(QuantityOption::CustomEntry);
    options
}

fn option_labels(base: u32, unit: QuantityUnit) -> Vec<String> {
    quantity_options(base)
        .iter()
        .map(|option| option.label(unit))
        .collect()
}

pub fn cart_options(surface_count: u32) -> Vec<String> {
    option_labels(surface_count, QuantityUnit::Cart)
}

pub fn tote_options(grid_count: u32) -> Vec<String> {
    option_labels(grid_count, QuantityUnit::Tote)
}

/// Resolves posted text into a choice: an offered option label, or a typed-in
/// count with or without its counter (`30`, `30個`). The custom-entry sentinel
/// alone carries no count and resolves to `None`.
pub fn choice_from_label(label: &str, base: u32, unit: QuantityUnit) -> Option<QuantityChoice> {
    let label = label.trim();
    if label == CUSTOM_ENTRY_LABEL {
        return None;
    }

    quantity_options(base)
        .into_iter()
        .find_map(|option| match option {
            QuantityOption::Choice(choice) if choice.label(unit) == label => Some(choice),
            _ => None,
        })
        .or_else(|| {
            parse_count(label.trim_end_matches(unit.counter()))
                .map(|count| QuantityChoice::Custom { count })
        })
}

pub fn is_field_visible(field: &FieldDefinition, values: &FieldValueMap) -> bool {
    match field.visibility {
        None => true,
        Some(rule) => values.literal(&rule.field) == Some(rule.equals),
    }
}
