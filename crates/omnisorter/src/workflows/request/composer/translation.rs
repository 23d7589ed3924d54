/// One-to-one lookup tables used by the drawing request. Anything missing
/// from a table is rendered unchanged.
#[derive(Debug, Clone, Copy)]
pub struct TranslationTable {
    groups: &'static [(&'static str, &'static str)],
    labels: &'static [(&'static str, &'static str)],
    values: &'static [(&'static str, &'static str)],
}

impl TranslationTable {
    pub const fn japanese_to_english() -> Self {
        Self {
            groups: GROUP_NAMES,
            labels: FIELD_LABELS,
            values: LITERAL_VALUES,
        }
    }

    pub fn group<'a>(&self, source: &'a str) -> &'a str {
        lookup(self.groups, source)
    }

    pub fn label<'a>(&self, source: &'a str) -> &'a str {
        lookup(self.labels, source)
    }

    pub fn value<'a>(&self, source: &'a str) -> &'a str {
        lookup(self.values, source)
    }
}

fn lookup<'a>(table: &'static [(&'static str, &'static str)], source: &'a str) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == source)
        .map(|(_, to)| *to)
        .unwrap_or(source)
}

const GROUP_NAMES: &[(&str, &str)] = &[
    ("OS機種", "Model"),
    ("本体構成", "Main Configuration"),
    ("設置容器", "Container"),
    ("仕分け商品", "Sorting Product"),
    ("オプション", "Options"),
];

const FIELD_LABELS: &[(&str, &str)] = &[
    ("段", "Rows"),
    ("列", "Columns"),
    ("ブロック", "Cells"),
    ("間口タイプ", "Grid Type"),
    ("短スロープ長さ", "Short Slope Length"),
    ("スロープ長さ", "Slope Length"),
    ("引き出し有無", "Drawer Availability"),
    ("標準/個別", "Type"),
    ("奥行", "Depth"),
    ("幅", "Width"),
    ("高さ", "Height"),
    ("最大奥行", "Max Depth"),
    ("最大幅", "Max Width"),
    ("最大高さ", "Max Height"),
    ("満杯センサー", "Full Sensor"),
    ("追加カート", "Additional Cart"),
    ("追加トート", "Additional Tote"),
    ("滑り止めベルト", "Anti-slip Belt"),
    ("薄物対応", "Thin Item Support"),
    ("間口数", "Grid Count"),
    ("面数", "Surface Count"),
];

const LITERAL_VALUES: &[(&str, &str)] = &[
    ("カート式", "Cart"),
    ("固定（棚）式", "Fixed-Shelf"),
    ("スロープ式", "Slope"),
    ("有", "Yes"),
    ("無", "No"),
    ("標準トート", "Standard Tote"),
    ("個別容器", "Individual Container"),
    ("無し", "None"),
];
