use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// The two documents rendered from one specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quotation,
    Drawing,
}

impl DocumentKind {
    pub const fn ordered() -> [Self; 2] {
        [Self::Quotation, Self::Drawing]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Quotation => "見積",
            Self::Drawing => "図面",
        }
    }
}

/// Top-level category of a form field (大項目).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldGroup {
    #[serde(rename = "OS機種")]
    Model,
    #[serde(rename = "本体構成")]
    MainConfiguration,
    #[serde(rename = "設置容器")]
    Container,
    #[serde(rename = "仕分け商品")]
    SortingProduct,
    #[serde(rename = "オプション")]
    Options,
}

impl FieldGroup {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Model,
            Self::MainConfiguration,
            Self::Container,
            Self::SortingProduct,
            Self::Options,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Model => "OS機種",
            Self::MainConfiguration => "本体構成",
            Self::Container => "設置容器",
            Self::SortingProduct => "仕分け商品",
            Self::Options => "オプション",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|group| group.label() == label.trim())
    }
}

/// Specific attribute within a group (小項目). `None` marks a group without sub-items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubItem {
    #[serde(rename = "-")]
    None,
    #[serde(rename = "段")]
    Rows,
    #[serde(rename = "列")]
    Columns,
    #[serde(rename = "ブロック")]
    CellBlocks,
    #[serde(rename = "間口タイプ")]
    GridType,
    #[serde(rename = "短スロープ長さ")]
    ShortSlopeLength,
    #[serde(rename = "スロープ長さ")]
    SlopeLength,
    #[serde(rename = "引き出し有無")]
    DrawerAvailability,
    #[serde(rename = "標準/個別")]
    ContainerType,
    #[serde(rename = "奥行")]
    Depth,
    #[serde(rename = "幅")]
    Width,
    #[serde(rename = "高さ")]
    Height,
    #[serde(rename = "最大奥行")]
    MaxDepth,
    #[serde(rename = "最大幅")]
    MaxWidth,
    #[serde(rename = "最大高さ")]
    MaxHeight,
    #[serde(rename = "DAS")]
    Das,
    #[serde(rename = "満杯センサー")]
    FullSensor,
    #[serde(rename = "追加カート")]
    AdditionalCart,
    #[serde(rename = "追加トート")]
    AdditionalTote,
    #[serde(rename = "滑り止めベルト")]
    AntiSlipBelt,
    #[serde(rename = "薄物対応")]
    ThinItemSupport,
    #[serde(rename = "間口数")]
    GridCount,
    #[serde(rename = "面数")]
    SurfaceCount,
}

impl SubItem {
    pub const fn ordered() -> [Self; 23] {
        [
            Self::None,
            Self::Rows,
            Self::Columns,
            Self::CellBlocks,
            Self::GridType,
            Self::ShortSlopeLength,
            Self::SlopeLength,
            Self::DrawerAvailability,
            Self::ContainerType,
            Self::Depth,
            Self::Width,
            Self::Height,
            Self::MaxDepth,
            Self::MaxWidth,
            Self::MaxHeight,
            Self::Das,
            Self::FullSensor,
            Self::AdditionalCart,
            Self::AdditionalTote,
            Self::AntiSlipBelt,
            Self::ThinItemSupport,
            Self::GridCount,
            Self::SurfaceCount,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "-",
            Self::Rows => "段",
            Self::Columns => "列",
            Self::CellBlocks => "ブロック",
            Self::GridType => "間口タイプ",
            Self::ShortSlopeLength => "短スロープ長さ",
            Self::SlopeLength => "スロープ長さ",
            Self::DrawerAvailability => "引き出し有無",
            Self::ContainerType => "標準/個別",
            Self::Depth => "奥行",
            Self::Width => "幅",
            Self::Height => "高さ",
            Self::MaxDepth => "最大奥行",
            Self::MaxWidth => "最大幅",
            Self::MaxHeight => "最大高さ",
            Self::Das => "DAS",
            Self::FullSensor => "満杯センサー",
            Self::AdditionalCart => "追加カート",
            Self::AdditionalTote => "追加トート",
            Self::AntiSlipBelt => "滑り止めベルト",
            Self::ThinItemSupport => "薄物対応",
            Self::GridCount => "間口数",
            Self::SurfaceCount => "面数",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|item| item.label() == label.trim())
    }
}

/// Structured `(group, subitem)` key of the value map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub group: FieldGroup,
    pub subitem: SubItem,
}

impl FieldKey {
    pub const MODEL: Self = Self::new(FieldGroup::Model, SubItem::None);
    pub const ROWS: Self = Self::new(FieldGroup::MainConfiguration, SubItem::Rows);
    pub const COLUMNS: Self = Self::new(FieldGroup::MainConfiguration, SubItem::Columns);
    pub const CELL_BLOCKS: Self = Self::new(FieldGroup::MainConfiguration, SubItem::CellBlocks);
    pub const GRID_TYPE: Self = Self::new(FieldGroup::MainConfiguration, SubItem::GridType);
    pub const SHORT_SLOPE_LENGTH: Self =
        Self::new(FieldGroup::MainConfiguration, SubItem::ShortSlopeLength);
    pub const SLOPE_LENGTH: Self = Self::new(FieldGroup::MainConfiguration, SubItem::SlopeLength);
    pub const DRAWER_AVAILABILITY: Self =
        Self::new(FieldGroup::MainConfiguration, SubItem::DrawerAvailability);
    pub const CONTAINER_TYPE: Self = Self::new(FieldGroup::Container, SubItem::ContainerType);
    pub const CONTAINER_DEPTH: Self = Self::new(FieldGroup::Container, SubItem::Depth);
    pub const CONTAINER_WIDTH: Self = Self::new(FieldGroup::Container, SubItem::Width);
    pub const CONTAINER_HEIGHT: Self = Self::new(FieldGroup::Container, SubItem::Height);
    pub const PRODUCT_MAX_DEPTH: Self = Self::new(FieldGroup::SortingProduct, SubItem::MaxDepth);
    pub const PRODUCT_MAX_WIDTH: Self = Self::new(FieldGroup::SortingProduct, SubItem::MaxWidth);
    pub const PRODUCT_MAX_HEIGHT: Self = Self::new(FieldGroup::SortingProduct, SubItem::MaxHeight);
    pub const DAS: Self = Self::new(FieldGroup::Options, SubItem::Das);
    pub const FULL_SENSOR: Self = Self::new(FieldGroup::Options, SubItem::FullSensor);
    pub const ADDITIONAL_CART: Self = Self::new(FieldGroup::Options, SubItem::AdditionalCart);
    pub const ADDITIONAL_TOTE: Self = Self::new(FieldGroup::Options, SubItem::AdditionalTote);
    pub const ANTI_SLIP_BELT: Self = Self::new(FieldGroup::Options, SubItem::AntiSlipBelt);
    pub const THIN_ITEM_SUPPORT: Self = Self::new(FieldGroup::Options, SubItem::ThinItemSupport);

    /// Synthetic key written by the derivation engine.
    pub const GRID_COUNT: Self = Self::new(FieldGroup::MainConfiguration, SubItem::GridCount);
    /// Synthetic key written by the derivation engine.
    pub const SURFACE_COUNT: Self = Self::new(FieldGroup::MainConfiguration, SubItem::SurfaceCount);

    pub const fn new(group: FieldGroup, subitem: SubItem) -> Self {
        Self { group, subitem }
    }

    pub fn is_derived(&self) -> bool {
        *self == Self::GRID_COUNT || *self == Self::SURFACE_COUNT
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group.label(), self.subitem.label())
    }
}

/// Which documents a field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Applicability {
    pub quotation: bool,
    pub drawing: bool,
}

impl Applicability {
    pub const BOTH: Self = Self {
        quotation: true,
        drawing: true,
    };
    pub const QUOTATION: Self = Self {
        quotation: true,
        drawing: false,
    };
    pub const DRAWING: Self = Self {
        quotation: false,
        drawing: true,
    };

    pub const fn includes(self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Quotation => self.quotation,
            DocumentKind::Drawing => self.drawing,
        }
    }
}

/// Unit counted by a derived option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUnit {
    Cart,
    Tote,
}

impl QuantityUnit {
    pub const fn counter(self) -> &'static str {
        match self {
            Self::Cart => "台",
            Self::Tote => "個",
        }
    }
}

/// Allowed values for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDomain {
    Choices(&'static [&'static str]),
    FreeForm,
    DerivedOptions(QuantityUnit),
}

/// Visible only while `field` currently holds the literal `equals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibilityRule {
    pub field: FieldKey,
    pub equals: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDefinition {
    pub key: FieldKey,
    pub applicability: Applicability,
    pub domain: FieldDomain,
    pub note: &'static str,
    pub visibility: Option<VisibilityRule>,
}

impl FieldDefinition {
    pub fn applies_to(&self, kind: DocumentKind) -> bool {
        self.applicability.includes(kind)
    }

    /// Free-form lengths annotated "mm単位" are displayed with a millimetre suffix.
    pub fn requires_millimetres(&self) -> bool {
        self.note.contains("mm")
    }

    pub fn quantity_unit(&self) -> Option<QuantityUnit> {
        match self.domain {
            FieldDomain::DerivedOptions(unit) => Some(unit),
            _ => None,
        }
    }
}

/// Multipliers offered for additional carts and totes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplier {
    #[serde(rename = "0.5")]
    Half,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "1.5")]
    OneAndHalf,
    #[serde(rename = "2")]
    Double,
}

impl Multiplier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Half, Self::One, Self::OneAndHalf, Self::Double]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Half => "0.5",
            Self::One => "1",
            Self::OneAndHalf => "1.5",
            Self::Double => "2",
        }
    }

    const fn halves(self) -> u64 {
        match self {
            Self::Half => 1,
            Self::One => 2,
            Self::OneAndHalf => 3,
            Self::Double => 4,
        }
    }

    /// `floor(base * multiplier)`, saturating at `u32::MAX`.
    pub fn apply(self, base: u32) -> u32 {
        let scaled = u64::from(base) * self.halves() / 2;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

/// Additional cart/tote selection: a derived option or a typed-in count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityChoice {
    Derived { count: u32, multiplier: Multiplier },
    Custom { count: u32 },
}

impl QuantityChoice {
    pub const fn count(self) -> u32 {
        match self {
            Self::Derived { count, .. } | Self::Custom { count } => count,
        }
    }

    pub fn label(self, unit: QuantityUnit) -> String {
        match self {
            Self::Derived { count, multiplier } => {
                format!("{}{} ({}倍)", count, unit.counter(), multiplier.label())
            }
            Self::Custom { count } => format!("{}{}", count, unit.counter()),
        }
    }
}

/// Value held for one key of the value map.
///
/// Posted JSON is read by shape: non-negative integers are counts, objects
/// are quantity choices, and any other scalar is kept as literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    DerivedCount(u32),
    Literal(String),
    Quantity(QuantityChoice),
}

impl FieldValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Literal(value) if value.trim().is_empty())
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Self::Literal(String::new())),
            Value::Bool(flag) => Ok(Self::Literal(flag.to_string())),
            Value::String(text) => Ok(Self::Literal(text)),
            Value::Number(number) => Ok(number
                .as_u64()
                .and_then(|count| u32::try_from(count).ok())
                .map(Self::DerivedCount)
                .unwrap_or_else(|| Self::Literal(number.to_string()))),
            choice @ Value::Object(_) => QuantityChoice::deserialize(choice)
                .map(Self::Quantity)
                .map_err(D::Error::custom),
            Value::Array(_) => Err(D::Error::custom(
                "expected text, a number, or a quantity choice",
            )),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<QuantityChoice> for FieldValue {
    fn from(value: QuantityChoice) -> Self {
        Self::Quantity(value)
    }
}
