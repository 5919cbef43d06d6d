use serde::{Deserialize, Serialize};

/// One predicate in a filter chain.
///
/// A condition matches a single article attribute and carries the tag
/// saying how it combines with the running result of the conditions before
/// it. The first condition of a sequence has `logic = none`; evaluation is
/// a strict left-to-right fold with no grouping (see
/// [`crate::filter::evaluate`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Client-assigned discriminator for UI round trips. Not a storage key.
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub logic: Logic,
    /// Inverts this condition's atomic match, never the aggregate.
    #[serde(default)]
    pub negate: bool,
    pub field: Field,
    #[serde(default)]
    pub operator: Operator,
    /// Scalar operand. Required for every field kind except multi-select.
    #[serde(default)]
    pub value: String,
    /// Operands for multi-select fields, matched with an implicit `in`.
    #[serde(default)]
    pub values: Vec<String>,
}

impl Condition {
    /// Whether this condition carries enough data to evaluate.
    ///
    /// Invalid conditions are excluded from evaluation rather than failing
    /// the whole sequence; callers pre-filter with
    /// [`crate::filter::valid_conditions`].
    pub fn is_valid(&self) -> bool {
        match self.field.kind() {
            FieldKind::MultiSelect => !self.values.is_empty(),
            FieldKind::Boolean => !self.value.is_empty(),
            FieldKind::Temporal => !self.value.is_empty() && self.operator.is_temporal(),
            FieldKind::Text => !self.value.is_empty() && self.operator.is_text(),
        }
    }
}

/// How a condition combines with the running result of the chain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    /// Chain opener. Only meaningful on the first condition.
    #[default]
    None,
    And,
    Or,
}

/// Article attributes a condition can match against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Link,
    Author,
    Content,
    Categories,
    PublishedAt,
    Read,
    Starred,
    FeedId,
}

/// The evaluation shape of a [`Field`], deciding which operators apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    MultiSelect,
    Boolean,
    Temporal,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Title | Self::Link | Self::Author | Self::Content | Self::FeedId => {
                FieldKind::Text
            }
            Self::Categories => FieldKind::MultiSelect,
            Self::Read | Self::Starred => FieldKind::Boolean,
            Self::PublishedAt => FieldKind::Temporal,
        }
    }
}

/// Per-field comparison operators.
///
/// Text fields take the text operators, `published_at` the temporal ones.
/// Boolean fields ignore the operator and multi-select fields fix it to
/// `in`, so `contains` doubles as the wire default for conditions that
/// omit it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    In,
    Before,
    After,
    WithinDays,
}

impl Operator {
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Contains | Self::Equals | Self::StartsWith | Self::EndsWith
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Before | Self::After | Self::WithinDays)
    }
}
