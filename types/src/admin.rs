use serde::{Deserialize, Serialize};

/// Tables exposed in the admin panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminTable {
    Case,
    Skin,
    User,
    Task,
    QuizQuestion,
}

impl AdminTable {
    pub const ALL: [AdminTable; 5] = [
        AdminTable::Case,
        AdminTable::Skin,
        AdminTable::User,
        AdminTable::Task,
        AdminTable::QuizQuestion,
    ];
}

/// How a field renders and validates in an admin form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    ImageRef,
    /// Relative selection weight (u64 weight units).
    WeightUnits,
    /// Coin amount.
    Coins,
}

/// One column of an admin table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

/// Column schema per table. Form rendering is a lookup over this map, so a
/// new table means a new variant here rather than untyped records.
pub fn field_schema(table: AdminTable) -> &'static [FieldSpec] {
    const CASE: &[FieldSpec] = &[
        field("name", FieldKind::Text, true),
        field("price", FieldKind::Coins, true),
        field("image_ref", FieldKind::ImageRef, true),
        field("is_free", FieldKind::Boolean, false),
    ];
    const SKIN: &[FieldSpec] = &[
        field("display_name", FieldKind::Text, true),
        field("image_ref", FieldKind::ImageRef, true),
        field("weight", FieldKind::WeightUnits, true),
        field("never_drop", FieldKind::Boolean, false),
        field("value", FieldKind::Coins, true),
    ];
    const USER: &[FieldSpec] = &[
        field("name", FieldKind::Text, true),
        field("balance", FieldKind::Coins, true),
        field("is_admin", FieldKind::Boolean, false),
    ];
    const TASK: &[FieldSpec] = &[
        field("title", FieldKind::Text, true),
        field("reward_coins", FieldKind::Coins, true),
        field("active", FieldKind::Boolean, false),
    ];
    const QUIZ_QUESTION: &[FieldSpec] = &[
        field("question", FieldKind::Text, true),
        field("answer", FieldKind::Text, true),
        field("reward_coins", FieldKind::Coins, true),
    ];

    match table {
        AdminTable::Case => CASE,
        AdminTable::Skin => SKIN,
        AdminTable::User => USER,
        AdminTable::Task => TASK,
        AdminTable::QuizQuestion => QUIZ_QUESTION,
    }
}
