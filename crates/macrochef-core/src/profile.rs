//! Per-user dietary profile, as held by the profile store.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Amount of an ingredient the user has at home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    /// Whole grams.
    Grams(u32),
    /// Free-text amount such as "2 cans".
    Amount(String),
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Grams(grams) => write!(f, "{}g", grams),
            Quantity::Amount(amount) => f.write_str(amount.trim()),
        }
    }
}

impl From<u32> for Quantity {
    fn from(grams: u32) -> Self {
        Quantity::Grams(grams)
    }
}

impl From<&str> for Quantity {
    fn from(amount: &str) -> Self {
        Quantity::Amount(amount.to_string())
    }
}

/// A user's stored dietary profile. Read-only to the recipe pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryProfile {
    /// Ingredient name to quantity available at home.
    #[serde(default)]
    pub available_ingredients: BTreeMap<String, Quantity>,

    /// Ingredients that must never appear.
    #[serde(default)]
    pub allergies_or_intolerances: BTreeSet<String>,

    #[serde(default)]
    pub is_vegan: bool,

    #[serde(default)]
    pub is_vegetarian: bool,

    /// Names of recently generated recipes, most recent first.
    #[serde(default)]
    pub recent_recipe_names: Vec<String>,
}

impl DietaryProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ingredient available at home.
    pub fn with_ingredient(mut self, name: impl Into<String>, quantity: impl Into<Quantity>) -> Self {
        self.available_ingredients.insert(name.into(), quantity.into());
        self
    }

    /// Add an allergy or intolerance.
    pub fn with_allergy(mut self, name: impl Into<String>) -> Self {
        self.allergies_or_intolerances.insert(name.into());
        self
    }

    pub fn vegan(mut self, is_vegan: bool) -> Self {
        self.is_vegan = is_vegan;
        self
    }

    pub fn vegetarian(mut self, is_vegetarian: bool) -> Self {
        self.is_vegetarian = is_vegetarian;
        self
    }

    /// Record a recently generated recipe name.
    pub fn with_recent_recipe(mut self, name: impl Into<String>) -> Self {
        self.recent_recipe_names.push(name.into());
        self
    }
}
