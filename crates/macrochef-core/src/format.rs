//! Versioned response-format contracts.
//!
//! The shape the generation service must reply in is a parameter of the
//! encoder rather than a property of separate pipelines: each variant carries
//! its own recipe count, wording, format instruction and structural delimiters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecipeError;

/// How many recipes a batch request asks for.
pub const BATCH_RECIPE_COUNT: u32 = 5;

const RECIPE_ARRAY_INSTRUCTIONS: &str = r#"Return the response as a JSON array (always a single valid JSON array, with no title for each element, just valid JSON elements), where each recipe is a JSON object inside the array. The JSON array must follow this structure:
[
  {
    "recipeName": "",
    "cookingTime": "",
    "caloriesAndMacros": {
      "calories": "",
      "protein": "",
      "carbs": "",
      "fat": ""
    },
    "ingredientsAndQuantities": [
      { "ingredient": "", "quantity": "" },
      { "ingredient": "", "quantity": "" }
    ],
    "cookingProcess": [
      "Step 1",
      "Step 2"
    ]
  },
  ...
]"#;

const SINGLE_RECIPE_INSTRUCTIONS: &str = r#"Return the response as a single valid JSON object, with no surrounding text. The JSON object must follow this structure:
{
  "recipeName": "",
  "cookingTime": "",
  "caloriesAndMacros": {
    "calories": "",
    "protein": "",
    "carbs": "",
    "fat": ""
  },
  "ingredientsAndQuantities": [
    { "ingredient": "", "quantity": "" },
    { "ingredient": "", "quantity": "" }
  ],
  "cookingProcess": [
    "Step 1",
    "Step 2"
  ]
}"#;

const NAMES_ONLY_INSTRUCTIONS: &str = r#"Return only the recipe names as a single valid JSON array of strings, with no surrounding text. The JSON array must follow this structure:
["Recipe name 1", "Recipe name 2", ...]"#;

/// The structured shape the reply must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// A JSON array of full recipes.
    #[default]
    RecipeArray,
    /// One full recipe as a JSON object.
    SingleRecipe,
    /// A JSON array of recipe names.
    NamesOnly,
}

impl OutputFormat {
    /// Version tag of the format contract.
    pub fn version(&self) -> &'static str {
        match self {
            OutputFormat::RecipeArray => "recipes.v1",
            OutputFormat::SingleRecipe => "recipe.v1",
            OutputFormat::NamesOnly => "names.v1",
        }
    }

    pub fn recipe_count(&self) -> u32 {
        match self {
            OutputFormat::SingleRecipe => 1,
            OutputFormat::RecipeArray | OutputFormat::NamesOnly => BATCH_RECIPE_COUNT,
        }
    }

    /// Opening sentence of the prompt.
    pub fn base_clause(&self) -> String {
        match self {
            OutputFormat::RecipeArray => format!("Please generate {} recipes.", self.recipe_count()),
            OutputFormat::SingleRecipe => "Please generate 1 recipe.".to_string(),
            OutputFormat::NamesOnly => {
                format!("Please generate {} recipe names.", self.recipe_count())
            }
        }
    }

    /// Noun used when the prompt refers back to the output.
    pub fn subject(&self) -> &'static str {
        match self {
            OutputFormat::SingleRecipe => "recipe",
            OutputFormat::RecipeArray | OutputFormat::NamesOnly => "recipes",
        }
    }

    /// Determiner paired with [`OutputFormat::subject`] in the diet clauses.
    pub fn quantifier(&self) -> &'static str {
        match self {
            OutputFormat::SingleRecipe => "the recipe is",
            OutputFormat::RecipeArray | OutputFormat::NamesOnly => "all recipes are",
        }
    }

    /// The format instruction text.
    pub fn instructions(&self) -> &'static str {
        match self {
            OutputFormat::RecipeArray => RECIPE_ARRAY_INSTRUCTIONS,
            OutputFormat::SingleRecipe => SINGLE_RECIPE_INSTRUCTIONS,
            OutputFormat::NamesOnly => NAMES_ONLY_INSTRUCTIONS,
        }
    }

    /// Opening and closing delimiters of the structured payload.
    pub fn delimiters(&self) -> (char, char) {
        match self {
            OutputFormat::SingleRecipe => ('{', '}'),
            OutputFormat::RecipeArray | OutputFormat::NamesOnly => ('[', ']'),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for OutputFormat {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recipes" | "recipe_array" | "recipes.v1" => Ok(OutputFormat::RecipeArray),
            "single" | "single_recipe" | "recipe.v1" => Ok(OutputFormat::SingleRecipe),
            "names" | "names_only" | "names.v1" => Ok(OutputFormat::NamesOnly),
            other => Err(RecipeError::validation(
                "outputFormat",
                format!("unknown output format '{}'", other),
            )),
        }
    }
}

/// How format instructions reach the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstructionMode {
    /// Sent as a separate system-role message.
    #[default]
    System,
    /// Appended to the prompt text.
    Inline,
}

impl FromStr for InstructionMode {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(InstructionMode::System),
            "inline" => Ok(InstructionMode::Inline),
            other => Err(RecipeError::validation(
                "instructionMode",
                format!("unknown instruction mode '{}'", other),
            )),
        }
    }
}
