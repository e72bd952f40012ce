//! # Filter Model
//!
//! Typed representation of a client's query intent, parsed from raw
//! parameters. Pure transformation: no store access.
//!
//! Parameters are validated in a fixed order (calorie bounds, flags,
//! rating, enum sets, query, sort, asc, token) so the first reported error
//! is deterministic.

use serde_json::Value;

use crate::model::{Cuisine, MealType, RecordId, SortField, SpiceLevel};

use super::errors::{ValidationError, ValidationResult};
use super::params::RawParams;

/// Inclusive bounds for calorie parameters
pub const CALORIES_RANGE: (f64, f64) = (0.0, 2000.0);

/// Inclusive bounds for the minimum-rating parameter
pub const RATING_RANGE: (f64, f64) = (0.0, 5.0);

/// Validated filter for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub min_cals: Option<f64>,
    pub max_cals: Option<f64>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub gluten_free: Option<bool>,
    pub healthy: Option<bool>,
    pub cheap: Option<bool>,
    pub sustainable: Option<bool>,
    pub rating: Option<f64>,
    pub spice_levels: Option<Vec<SpiceLevel>>,
    pub types: Option<Vec<MealType>>,
    pub cultures: Option<Vec<Cuisine>>,
    pub query: Option<String>,
    pub sort: Option<SortField>,
    pub asc: Option<bool>,
    pub token: Option<String>,
}

impl Filter {
    /// Parses and validates raw parameters
    pub fn parse(params: &RawParams) -> ValidationResult<Self> {
        let mut filter = Filter {
            min_cals: parse_bounded(params, "minCals", CALORIES_RANGE)?,
            max_cals: parse_bounded(params, "maxCals", CALORIES_RANGE)?,
            vegetarian: parse_flag(params, "vegetarian"),
            vegan: parse_flag(params, "vegan"),
            gluten_free: parse_flag(params, "glutenFree"),
            healthy: parse_flag(params, "healthy"),
            cheap: parse_flag(params, "cheap"),
            sustainable: parse_flag(params, "sustainable"),
            rating: parse_bounded(params, "rating", RATING_RANGE)?,
            spice_levels: parse_enum_set(
                params,
                &["spiceLevels", "spiceLevel"],
                SpiceLevel::LABEL,
                SpiceLevel::parse,
            )?,
            types: parse_enum_set(params, &["types", "type"], MealType::LABEL, MealType::parse)?,
            cultures: parse_enum_set(
                params,
                &["cultures", "culture"],
                Cuisine::LABEL,
                Cuisine::parse,
            )?,
            query: parse_text(params, "query")?,
            sort: None,
            asc: parse_flag(params, "asc"),
            token: None,
        };

        filter.sort = parse_text(params, "sort")?
            .map(|value| {
                SortField::parse(&value).ok_or(ValidationError::UnknownValue {
                    label: SortField::LABEL,
                    value,
                })
            })
            .transpose()?;

        filter.token = parse_text(params, "token")?;
        filter.validate_token()?;

        Ok(filter)
    }

    /// Without a free-text query the token must name a row identifier:
    /// either bare, or as the trailing segment of a compound cursor when a
    /// sort field is active.
    fn validate_token(&self) -> ValidationResult<()> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        if self.query.is_some() {
            return Ok(());
        }

        let row_id = match (self.sort, token.rsplit_once(':')) {
            (Some(_), Some((_, row_id))) => row_id,
            _ => token.as_str(),
        };

        if RecordId::is_valid(row_id) {
            Ok(())
        } else {
            Err(ValidationError::InvalidRecordId {
                param: "token".to_string(),
            })
        }
    }

    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// Ascending only when explicitly requested
    pub fn is_ascending(&self) -> bool {
        self.asc == Some(true)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_sort(mut self, sort: SortField, ascending: bool) -> Self {
        self.sort = Some(sort);
        self.asc = ascending.then_some(true);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Presence-triggered flag: any value sets it, an explicit JSON `false`
/// leaves it unset.
fn parse_flag(params: &RawParams, name: &str) -> Option<bool> {
    match params.get(name)? {
        Value::Bool(false) => None,
        _ => Some(true),
    }
}

fn parse_bounded(
    params: &RawParams,
    name: &str,
    (min, max): (f64, f64),
) -> ValidationResult<Option<f64>> {
    let Some(raw) = params.get(name) else {
        return Ok(None);
    };

    let not_numeric = || ValidationError::NotNumeric {
        param: name.to_string(),
    };

    let value = match raw {
        Value::Number(n) => n.as_f64().ok_or_else(not_numeric)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric())?,
        _ => return Err(not_numeric()),
    };

    if !value.is_finite() {
        return Err(not_numeric());
    }
    if value < min {
        return Err(ValidationError::BelowMinimum {
            param: name.to_string(),
            min,
        });
    }
    if value > max {
        return Err(ValidationError::AboveMaximum {
            param: name.to_string(),
            max,
        });
    }

    Ok(Some(value))
}

/// Accepts a single value or an array; reports the first entry that falls
/// outside the vocabulary.
fn parse_enum_set<T>(
    params: &RawParams,
    names: &[&str],
    label: &'static str,
    parse: fn(&str) -> Option<T>,
) -> ValidationResult<Option<Vec<T>>> {
    let Some((_, raw)) = params.lookup(names) else {
        return Ok(None);
    };

    let entries: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    let mut parsed = Vec::with_capacity(entries.len());
    for entry in entries {
        let member = entry.as_str().and_then(parse);
        match member {
            Some(member) => parsed.push(member),
            None => {
                let value = match entry {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(ValidationError::UnknownValue { label, value });
            }
        }
    }

    Ok(Some(parsed))
}

/// Trimmed text; empty text counts as absent
fn parse_text(params: &RawParams, name: &str) -> ValidationResult<Option<String>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(ValidationError::NotText {
            param: name.to_string(),
        }),
    }
}
