//! Caller-supplied recipe request and its validation boundary.
//!
//! Requests arrive as flat key/value pairs (a JSON object of scalars, or the
//! legacy `{key=value, key=value}` query string). They are validated exactly
//! once, here, into a [`RecipeRequest`]; nothing downstream re-parses strings.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{RecipeError, Result};

/// Parameter keys accepted on the submission boundary.
pub mod keys {
    pub const USER_ID: &str = "userId";
    pub const CALORIES: &str = "calories";
    pub const PROTEIN: &str = "protein";
    pub const CARBS: &str = "carbs";
    pub const FAT: &str = "fat";
    pub const MEASURE_UNIT: &str = "measureUnit";
    pub const PRECISION: &str = "precision";
    pub const SATIETY_LEVEL: &str = "satietyLevel";
    pub const ANY_INGREDIENTS_MODE: &str = "anyIngredientsMode";
    pub const EXPAND_INGREDIENTS: &str = "expandIngredients";
    pub const GLUTEN_FREE: &str = "glutenFree";
    pub const VEGAN: &str = "vegan";
    pub const VEGETARIAN: &str = "vegetarian";
    pub const CUISINE_STYLE: &str = "cuisineStyle";
    pub const COOKING_TIME: &str = "cookingTime";
    pub const FLAVOR: &str = "flavor";
    pub const OCCASION: &str = "occasion";
}

/// Nutritional targets for each generated recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: u32,
    pub protein_grams: u32,
    pub carbs_grams: u32,
    pub fat_grams: u32,
}

/// A validated recipe-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub user_id: String,
    pub targets: MacroTargets,
    /// Unit appended to macro amounts, e.g. "g".
    pub measure_unit: String,
    /// Interpolated verbatim, e.g. "exactly" or "approximately".
    pub precision: String,
    pub satiety_level: String,
    /// Ignore the home-ingredient restriction entirely.
    pub any_ingredients_mode: bool,
    /// Permit ingredients beyond the home list.
    pub expand_ingredients: bool,
    pub gluten_free: bool,
    pub vegan: bool,
    pub vegetarian: bool,
    pub cuisine_style: Option<String>,
    pub cooking_time: Option<String>,
    pub flavor: Option<String>,
    pub occasion: Option<String>,
}

impl RecipeRequest {
    /// Start a fluent builder for the given user.
    pub fn builder(user_id: impl Into<String>) -> RecipeRequestBuilder {
        RecipeRequestBuilder::new(user_id)
    }

    /// Validate flat string parameters into a typed request.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let user_id = required_text(params, keys::USER_ID)?;
        let targets = MacroTargets {
            calories: required_u32(params, keys::CALORIES)?,
            protein_grams: required_u32(params, keys::PROTEIN)?,
            carbs_grams: required_u32(params, keys::CARBS)?,
            fat_grams: required_u32(params, keys::FAT)?,
        };

        Ok(Self {
            user_id,
            targets,
            measure_unit: required_text(params, keys::MEASURE_UNIT)?,
            precision: required_text(params, keys::PRECISION)?,
            satiety_level: required_text(params, keys::SATIETY_LEVEL)?,
            any_ingredients_mode: flag(params, keys::ANY_INGREDIENTS_MODE)?,
            expand_ingredients: flag(params, keys::EXPAND_INGREDIENTS)?,
            gluten_free: flag(params, keys::GLUTEN_FREE)?,
            vegan: flag(params, keys::VEGAN)?,
            vegetarian: flag(params, keys::VEGETARIAN)?,
            cuisine_style: optional_text(params, keys::CUISINE_STYLE),
            cooking_time: optional_text(params, keys::COOKING_TIME),
            flavor: optional_text(params, keys::FLAVOR),
            occasion: optional_text(params, keys::OCCASION),
        })
    }

    /// Render back to the flat parameter form accepted by [`RecipeRequest::from_params`].
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            params.insert(key.to_string(), value);
        };

        put(keys::USER_ID, self.user_id.clone());
        put(keys::CALORIES, self.targets.calories.to_string());
        put(keys::PROTEIN, self.targets.protein_grams.to_string());
        put(keys::CARBS, self.targets.carbs_grams.to_string());
        put(keys::FAT, self.targets.fat_grams.to_string());
        put(keys::MEASURE_UNIT, self.measure_unit.clone());
        put(keys::PRECISION, self.precision.clone());
        put(keys::SATIETY_LEVEL, self.satiety_level.clone());
        put(keys::ANY_INGREDIENTS_MODE, self.any_ingredients_mode.to_string());
        put(keys::EXPAND_INGREDIENTS, self.expand_ingredients.to_string());
        put(keys::GLUTEN_FREE, self.gluten_free.to_string());
        put(keys::VEGAN, self.vegan.to_string());
        put(keys::VEGETARIAN, self.vegetarian.to_string());

        let optional = [
            (keys::CUISINE_STYLE, &self.cuisine_style),
            (keys::COOKING_TIME, &self.cooking_time),
            (keys::FLAVOR, &self.flavor),
            (keys::OCCASION, &self.occasion),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                put(key, value.clone());
            }
        }

        params
    }
}

/// Builder for [`RecipeRequest`]; `build` runs the same validation as the wire boundary.
#[derive(Debug, Clone)]
pub struct RecipeRequestBuilder {
    params: HashMap<String, String>,
}

impl RecipeRequestBuilder {
    /// Create a builder with the usual defaults: grams, "approximately", "moderately filling".
    pub fn new(user_id: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert(keys::USER_ID.to_string(), user_id.into());
        params.insert(keys::MEASURE_UNIT.to_string(), "g".to_string());
        params.insert(keys::PRECISION.to_string(), "approximately".to_string());
        params.insert(keys::SATIETY_LEVEL.to_string(), "moderately filling".to_string());
        Self { params }
    }

    fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Set calories and macro grams in one go.
    pub fn macros(self, calories: u32, protein: u32, carbs: u32, fat: u32) -> Self {
        self.set(keys::CALORIES, calories)
            .set(keys::PROTEIN, protein)
            .set(keys::CARBS, carbs)
            .set(keys::FAT, fat)
    }

    pub fn measure_unit(self, unit: impl Into<String>) -> Self {
        self.set(keys::MEASURE_UNIT, unit.into())
    }

    pub fn precision(self, precision: impl Into<String>) -> Self {
        self.set(keys::PRECISION, precision.into())
    }

    pub fn satiety_level(self, satiety: impl Into<String>) -> Self {
        self.set(keys::SATIETY_LEVEL, satiety.into())
    }

    pub fn any_ingredients(self, enabled: bool) -> Self {
        self.set(keys::ANY_INGREDIENTS_MODE, enabled)
    }

    pub fn expand_ingredients(self, enabled: bool) -> Self {
        self.set(keys::EXPAND_INGREDIENTS, enabled)
    }

    pub fn gluten_free(self, enabled: bool) -> Self {
        self.set(keys::GLUTEN_FREE, enabled)
    }

    pub fn vegan(self, enabled: bool) -> Self {
        self.set(keys::VEGAN, enabled)
    }

    pub fn vegetarian(self, enabled: bool) -> Self {
        self.set(keys::VEGETARIAN, enabled)
    }

    pub fn cuisine_style(self, style: impl Into<String>) -> Self {
        self.set(keys::CUISINE_STYLE, style.into())
    }

    pub fn cooking_time(self, time: impl Into<String>) -> Self {
        self.set(keys::COOKING_TIME, time.into())
    }

    pub fn flavor(self, flavor: impl Into<String>) -> Self {
        self.set(keys::FLAVOR, flavor.into())
    }

    pub fn occasion(self, occasion: impl Into<String>) -> Self {
        self.set(keys::OCCASION, occasion.into())
    }

    /// Validate and build the request.
    pub fn build(self) -> Result<RecipeRequest> {
        RecipeRequest::from_params(&self.params)
    }
}

/// Parse the legacy `{key=value, key=value}` query-string form.
///
/// Surrounding braces are optional. Pairs that do not split into exactly one
/// key and one value are skipped.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let trimmed = query.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    inner
        .split(", ")
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if !key.trim().is_empty() => {
                    Some((key.trim().to_string(), value.trim().to_string()))
                }
                _ => None,
            }
        })
        .collect()
}

/// Flatten a JSON object of scalars into string parameters. `null` values are dropped.
pub fn params_from_json(
    object: &serde_json::Map<String, serde_json::Value>,
) -> Result<HashMap<String, String>> {
    let mut params = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                return Err(RecipeError::validation(key, "expected a scalar value"));
            }
        };
        params.insert(key.clone(), text);
    }
    Ok(params)
}

fn required_text(params: &HashMap<String, String>, key: &str) -> Result<String> {
    match params.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        Some(_) => Err(RecipeError::validation(key, "must not be empty")),
        None => Err(RecipeError::validation(key, "is required")),
    }
}

fn required_u32(params: &HashMap<String, String>, key: &str) -> Result<u32> {
    let raw = params
        .get(key)
        .ok_or_else(|| RecipeError::validation(key, "is required"))?;
    raw.trim().parse::<u32>().map_err(|_| {
        RecipeError::validation(key, format!("expected a non-negative integer, got '{}'", raw))
    })
}

fn flag(params: &HashMap<String, String>, key: &str) -> Result<bool> {
    match params.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(RecipeError::validation(
            key,
            format!("expected true or false, got '{}'", value),
        )),
    }
}

fn optional_text(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}
