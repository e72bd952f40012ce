//! Query compiler
//!
//! Translates a [`Filter`] into a [`Condition`]. The shape is identical on
//! both execution paths; on the search path it becomes the post-search
//! match stage. The free-text query never enters the predicate.

use serde_json::{json, Value};

use crate::filter::Filter;
use crate::model::CALORIES_NUTRIENT;

use super::ast::{Condition, FilterOp, Predicate};

/// Stored field names targeted by filters
pub mod fields {
    pub const ROW_ID: &str = "_id";
    pub const NUTRIENTS: &str = "nutrients";
    pub const NUTRIENT_NAME: &str = "name";
    pub const NUTRIENT_AMOUNT: &str = "amount";
    pub const VEGETARIAN: &str = "isVegetarian";
    pub const VEGAN: &str = "isVegan";
    pub const GLUTEN_FREE: &str = "isGlutenFree";
    pub const HEALTHY: &str = "isHealthy";
    pub const CHEAP: &str = "isCheap";
    pub const SUSTAINABLE: &str = "isSustainable";
    pub const RATING_AVERAGE: &str = "rating.average";
    pub const SPICE_LEVEL: &str = "spiceLevel";
    pub const TYPES: &str = "types";
    pub const CULTURE: &str = "culture";
}

/// Builds the structured predicate for a filter (token clauses excluded)
pub fn compile_predicate(filter: &Filter) -> Condition {
    let mut condition = Condition::new();

    if let Some(calories) = calories_condition(filter.min_cals, filter.max_cals) {
        condition.push(calories);
    }

    let flags = [
        (fields::VEGETARIAN, filter.vegetarian),
        (fields::VEGAN, filter.vegan),
        (fields::GLUTEN_FREE, filter.gluten_free),
        (fields::HEALTHY, filter.healthy),
        (fields::CHEAP, filter.cheap),
        (fields::SUSTAINABLE, filter.sustainable),
    ];
    for (field, flag) in flags {
        if let Some(value) = flag {
            condition.push(Predicate::eq(field, json!(value)));
        }
    }

    if let Some(rating) = filter.rating {
        condition.push(Predicate::gte(fields::RATING_AVERAGE, number(rating)));
    }

    push_membership(
        &mut condition,
        fields::SPICE_LEVEL,
        filter.spice_levels.as_deref().map(|s| s.iter().map(|v| json!(v.as_str())).collect()),
    );
    push_membership(
        &mut condition,
        fields::TYPES,
        filter.types.as_deref().map(|s| s.iter().map(|v| json!(v.as_str())).collect()),
    );
    push_membership(
        &mut condition,
        fields::CULTURE,
        filter.cultures.as_deref().map(|s| s.iter().map(|v| json!(v.as_str())).collect()),
    );

    condition
}

/// Both bounds fold into one range on the same nutrient match
fn calories_condition(min: Option<f64>, max: Option<f64>) -> Option<Predicate> {
    if min.is_none() && max.is_none() {
        return None;
    }

    let range = FilterOp::Range {
        gte: min.map(number),
        lte: max.map(number),
    };

    Some(Predicate::new(
        fields::NUTRIENTS,
        FilterOp::ElemMatch(vec![
            Predicate::eq(fields::NUTRIENT_NAME, json!(CALORIES_NUTRIENT)),
            Predicate::new(fields::NUTRIENT_AMOUNT, range),
        ]),
    ))
}

/// Applied only when the set is present and non-empty
fn push_membership(condition: &mut Condition, field: &str, values: Option<Vec<Value>>) {
    match values {
        Some(values) if !values.is_empty() => condition.push(Predicate::in_set(field, values)),
        _ => {}
    }
}

/// Whole numbers render as integers so stored documents compare cleanly
pub(crate) fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}
