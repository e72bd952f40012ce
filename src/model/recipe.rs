//! Recipe entity as stored and returned
//!
//! Field names follow the stored document (camelCase). Calories are always
//! nutrient index 0 by convention of the ingestion step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record_id::RecordId;
use super::vocab::{Cuisine, MealType, SortField, SpiceLevel};

/// Nutrient name that must sit at index 0
pub const CALORIES_NUTRIENT: &str = "Calories";

/// A single nutrient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

impl Nutrient {
    pub fn calories(amount: f64) -> Self {
        Self {
            name: CALORIES_NUTRIENT.to_string(),
            amount,
            unit: "kcal".to_string(),
        }
    }
}

/// Aggregate rating; `average` is null until the first rating lands
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    pub average: Option<f64>,
    pub count: u32,
}

impl Rating {
    /// Folds one more rating into the running average
    pub fn with_rating(&self, stars: u8) -> Self {
        let total = self.average.unwrap_or(0.0) * self.count as f64 + stars as f64;
        let count = self.count + 1;
        Self {
            average: Some(total / count as f64),
            count,
        }
    }
}

/// Recipe record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Row identifier; absent on recipes that have not been stored yet
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<RecordId>,
    /// External id, unique, used for upsert
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
    #[serde(default)]
    pub is_healthy: bool,
    #[serde(default)]
    pub is_cheap: bool,
    #[serde(default)]
    pub is_sustainable: bool,
    #[serde(default)]
    pub culture: Vec<Cuisine>,
    #[serde(default)]
    pub types: Vec<MealType>,
    #[serde(default = "default_spice_level")]
    pub spice_level: SpiceLevel,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub views: u64,
}

fn default_spice_level() -> SpiceLevel {
    SpiceLevel::Plain
}

impl Recipe {
    /// Minimal recipe, mostly useful for fixtures and ingestion
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            row_id: None,
            id,
            name: name.into(),
            summary: String::new(),
            is_vegetarian: false,
            is_vegan: false,
            is_gluten_free: false,
            is_healthy: false,
            is_cheap: false,
            is_sustainable: false,
            culture: Vec::new(),
            types: Vec::new(),
            spice_level: SpiceLevel::Plain,
            nutrients: Vec::new(),
            rating: Rating::default(),
            views: 0,
        }
    }

    /// Calories, read from nutrient index 0
    pub fn calories(&self) -> Option<f64> {
        self.nutrients.first().map(|n| n.amount)
    }

    /// Current value of a sort field, `None` when absent
    pub fn sort_value(&self, field: SortField) -> Option<f64> {
        match field {
            SortField::Calories => self.calories(),
            SortField::Rating => self.rating.average,
            SortField::Views => Some(self.views as f64),
        }
    }
}

/// A recipe in a query result; only the last row of a page may carry a token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeHit {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl RecipeHit {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            token: None,
        }
    }

    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_value(document)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_defaults() {
        let doc = json!({
            "_id": {"$oid": "65a1f0c2b3d4e5f60718293a"},
            "id": 715538,
            "name": "Bruschetta",
            "culture": ["Italian"],
            "nutrients": [{"name": "Calories", "amount": 310.5, "unit": "kcal"}]
        });

        let recipe: Recipe = serde_json::from_value(doc).unwrap();
        assert_eq!(recipe.id, 715538);
        assert_eq!(recipe.culture, vec![Cuisine::Italian]);
        assert_eq!(recipe.calories(), Some(310.5));
        assert_eq!(recipe.rating.average, None);
        assert_eq!(recipe.views, 0);
        assert_eq!(recipe.spice_level, SpiceLevel::Plain);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let doc = json!({"id": 1, "name": "Soup", "calories": 120, "paginationToken": "abc"});
        assert!(serde_json::from_value::<Recipe>(doc).is_ok());
    }

    #[test]
    fn test_rating_running_average() {
        let rating = Rating::default().with_rating(4).with_rating(5);
        assert_eq!(rating.count, 2);
        assert_eq!(rating.average, Some(4.5));
    }

    #[test]
    fn test_hit_serializes_token_only_when_set() {
        let mut hit = RecipeHit::new(Recipe::new(1, "Soup"));
        let plain = serde_json::to_value(&hit).unwrap();
        assert!(plain.get("token").is_none());

        hit.token = Some("views:3:65a1f0c2b3d4e5f60718293a".into());
        let tagged = serde_json::to_value(&hit).unwrap();
        assert_eq!(tagged["token"], json!("views:3:65a1f0c2b3d4e5f60718293a"));
        assert_eq!(tagged["isVegan"], json!(false));
    }
}
