//! Closed vocabularies for enum-valued recipe fields
//!
//! Each vocabulary maps wire strings to a typed variant. Matching is exact
//! (case-sensitive), mirroring how the values are stored.

use serde::{Deserialize, Serialize};

macro_rules! closed_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Human-readable name used in validation messages
            pub const LABEL: &'static str = $label;

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_vocabulary! {
    /// How hot a recipe is
    SpiceLevel, "spice level" {
        Plain => "none",
        Mild => "mild",
        Spicy => "spicy",
    }
}

closed_vocabulary! {
    /// Dish / meal classification
    MealType, "meal type" {
        MainCourse => "main course",
        SideDish => "side dish",
        Dessert => "dessert",
        Appetizer => "appetizer",
        Salad => "salad",
        Bread => "bread",
        Breakfast => "breakfast",
        Soup => "soup",
        Beverage => "beverage",
        Sauce => "sauce",
        Marinade => "marinade",
        Fingerfood => "fingerfood",
        Snack => "snack",
        Drink => "drink",
    }
}

closed_vocabulary! {
    /// Culture / cuisine tag
    Cuisine, "cuisine" {
        African => "African",
        Asian => "Asian",
        American => "American",
        British => "British",
        Cajun => "Cajun",
        Caribbean => "Caribbean",
        Chinese => "Chinese",
        EasternEuropean => "Eastern European",
        European => "European",
        French => "French",
        German => "German",
        Greek => "Greek",
        Indian => "Indian",
        Irish => "Irish",
        Italian => "Italian",
        Japanese => "Japanese",
        Jewish => "Jewish",
        Korean => "Korean",
        LatinAmerican => "Latin American",
        Mediterranean => "Mediterranean",
        Mexican => "Mexican",
        MiddleEastern => "Middle Eastern",
        Nordic => "Nordic",
        Southern => "Southern",
        Spanish => "Spanish",
        Thai => "Thai",
        Vietnamese => "Vietnamese",
    }
}

closed_vocabulary! {
    /// Fields a client may sort by
    SortField, "sort field" {
        Calories => "calories",
        Rating => "rating",
        Views => "views",
    }
}

impl SortField {
    /// Document path of the sort value on the find path
    pub fn stored_path(&self) -> &'static str {
        match self {
            SortField::Calories => "nutrients.0.amount",
            SortField::Rating => "rating.average",
            SortField::Views => "views",
        }
    }

    /// Calories live inside the nutrient array and must be materialized
    /// before a search pipeline can sort on them.
    pub fn requires_materialization(&self) -> bool {
        matches!(self, SortField::Calories)
    }

    /// Path of the sort value on the search path
    pub fn search_path(&self) -> &'static str {
        match self {
            SortField::Calories => MATERIALIZED_CALORIES,
            other => other.stored_path(),
        }
    }
}

/// Field the search pipeline writes the first nutrient amount into
pub const MATERIALIZED_CALORIES: &str = "calories";
