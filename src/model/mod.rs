//! Recipe data model
//!
//! The stored recipe document, its row identifier, and the closed
//! vocabularies used by enum-valued fields and filters.

mod recipe;
mod record_id;
mod vocab;

pub use recipe::{Nutrient, Rating, Recipe, RecipeHit, CALORIES_NUTRIENT};
pub use record_id::{InvalidRecordId, RecordId};
pub use vocab::{Cuisine, MealType, SortField, SpiceLevel, MATERIALIZED_CALORIES};
