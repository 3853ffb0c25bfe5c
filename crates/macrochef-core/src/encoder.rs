//! Constraint encoder: turns a request and a dietary profile into prompt text.
//!
//! Clauses are appended in a fixed order, each under its own guard, and joined
//! without any normalization pass. The same inputs always produce the same
//! bytes. Nothing here performs I/O.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::format::OutputFormat;
use crate::profile::DietaryProfile;
use crate::request::RecipeRequest;

/// Which guard produced a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Base,
    Nutrition,
    Satiety,
    HomeIngredients,
    Allergies,
    Diet,
    GlutenFree,
    ExpandIngredients,
    CuisineStyle,
    CookingTime,
    Flavor,
    Occasion,
    Novelty,
}

/// One natural-language fragment of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub kind: ClauseKind,
    pub text: String,
}

/// Diet restriction resolved from profile and request flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diet {
    Vegan,
    Vegetarian,
}

impl Diet {
    pub fn label(&self) -> &'static str {
        match self {
            Diet::Vegan => "vegan-friendly",
            Diet::Vegetarian => "vegetarian-friendly",
        }
    }
}

/// Resolve the diet restriction. First match wins:
/// profile vegan, then profile vegetarian (tightened to vegan by the request),
/// then whatever the request alone asks for.
pub fn resolve_diet(request: &RecipeRequest, profile: &DietaryProfile) -> Option<Diet> {
    if profile.is_vegan {
        Some(Diet::Vegan)
    } else if profile.is_vegetarian {
        if request.vegan {
            Some(Diet::Vegan)
        } else {
            Some(Diet::Vegetarian)
        }
    } else if request.vegan {
        Some(Diet::Vegan)
    } else if request.vegetarian {
        Some(Diet::Vegetarian)
    } else {
        None
    }
}

/// The encoded prompt plus its companion format instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDocument {
    pub clauses: Vec<Clause>,
    pub format_instructions: String,
    pub format: OutputFormat,
}

impl PromptDocument {
    /// The prompt text, clauses concatenated in order.
    pub fn text(&self) -> String {
        self.clauses.iter().map(|c| c.text.as_str()).collect()
    }

    /// The prompt cut to at most `max_chars` characters.
    ///
    /// A plain prefix cut: clause boundaries are not preserved.
    pub fn truncated(&self, max_chars: usize) -> String {
        let text = self.text();
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => text[..byte_idx].to_string(),
            None => text,
        }
    }

    /// Prompt with the format instructions appended, for backends without role separation.
    pub fn inline_text(&self) -> String {
        format!("{} {}", self.text(), self.format_instructions)
    }

    /// Whether a clause of this kind was emitted.
    pub fn has_clause(&self, kind: ClauseKind) -> bool {
        self.clauses.iter().any(|c| c.kind == kind)
    }

    /// The clause of this kind, if emitted.
    pub fn clause(&self, kind: ClauseKind) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.kind == kind)
    }

    /// SHA-256 over prompt and instructions, hex-encoded. Safe to log.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.format_instructions.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

/// Encoder bound to one output format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintEncoder {
    format: OutputFormat,
}

impl ConstraintEncoder {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Encode a request against the user's profile.
    pub fn encode(&self, request: &RecipeRequest, profile: &DietaryProfile) -> PromptDocument {
        let format = self.format;
        let mut clauses = Vec::new();
        let mut push = |kind: ClauseKind, text: String| clauses.push(Clause { kind, text });

        push(ClauseKind::Base, format.base_clause());

        let precision = &request.precision;
        let unit = &request.measure_unit;
        let targets = &request.targets;
        push(
            ClauseKind::Nutrition,
            format!(
                " The {} should have {} {} calories, containing {} {}{} of protein, \
                 containing {} {}{} of carbs, and {} {}{} of fat",
                format.subject(),
                precision,
                targets.calories,
                precision,
                targets.protein_grams,
                unit,
                precision,
                targets.carbs_grams,
                unit,
                precision,
                targets.fat_grams,
                unit,
            ),
        );

        let pronoun = match format {
            OutputFormat::SingleRecipe => "it is",
            OutputFormat::RecipeArray | OutputFormat::NamesOnly => "they are",
        };
        push(
            ClauseKind::Satiety,
            format!(", ensuring {} {}", pronoun, request.satiety_level),
        );

        if !request.any_ingredients_mode {
            let mut text = String::from(", using just ingredients available at home:");
            let items: Vec<String> = profile
                .available_ingredients
                .iter()
                .map(|(name, quantity)| format!("{} of {}", quantity, name))
                .collect();
            if !items.is_empty() {
                text.push(' ');
                text.push_str(&items.join(", "));
            }
            push(ClauseKind::HomeIngredients, text);
        }

        if !profile.allergies_or_intolerances.is_empty() {
            let allergies: Vec<&str> = profile
                .allergies_or_intolerances
                .iter()
                .map(String::as_str)
                .collect();
            push(
                ClauseKind::Allergies,
                format!(", avoiding ingredients such as {}", allergies.join(", ")),
            );
        }

        if let Some(diet) = resolve_diet(request, profile) {
            push(
                ClauseKind::Diet,
                format!(", and ensuring {} {}", format.quantifier(), diet.label()),
            );
        }

        if request.gluten_free {
            push(
                ClauseKind::GlutenFree,
                format!(", and ensuring {} gluten-free", format.quantifier()),
            );
        }

        if request.expand_ingredients {
            push(
                ClauseKind::ExpandIngredients,
                ", allowing for additional ingredients as needed".to_string(),
            );
        }

        if let Some(style) = non_empty(&request.cuisine_style) {
            push(ClauseKind::CuisineStyle, format!(", with a focus on {} cuisine", style));
        }
        if let Some(time) = non_empty(&request.cooking_time) {
            push(ClauseKind::CookingTime, format!(", with a cooking time of {}", time));
        }
        if let Some(flavor) = non_empty(&request.flavor) {
            push(ClauseKind::Flavor, format!(", with a {} flavor profile", flavor));
        }
        if let Some(occasion) = non_empty(&request.occasion) {
            push(ClauseKind::Occasion, format!(", suitable for {}", occasion));
        }

        let recent: Vec<&str> = profile
            .recent_recipe_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if !recent.is_empty() {
            push(
                ClauseKind::Novelty,
                format!(", avoiding repeating these recent recipes: {}", recent.join(", ")),
            );
        }

        PromptDocument {
            clauses,
            format_instructions: format.instructions().to_string(),
            format,
        }
    }
}

/// Encode with the default batch format.
pub fn encode(request: &RecipeRequest, profile: &DietaryProfile) -> PromptDocument {
    ConstraintEncoder::default().encode(request, profile)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONAL_FRAGMENTS: [&str; 4] =
        ["focus on", "cooking time of", "flavor profile", "suitable for"];

    fn request() -> RecipeRequest {
        RecipeRequest::builder("u-1")
            .macros(600, 40, 55, 20)
            .precision("exactly")
            .satiety_level("very filling")
            .build()
            .unwrap()
    }

    fn chicken_and_rice() -> DietaryProfile {
        DietaryProfile::new()
            .with_ingredient("chicken", 200)
            .with_ingredient("rice", 150)
    }

    #[test]
    fn test_base_and_nutrition_clauses() {
        let doc = encode(&request(), &DietaryProfile::new());
        let text = doc.text();

        assert!(text.starts_with("Please generate 5 recipes. The recipes should have exactly 600 calories"));
        assert!(text.contains("containing exactly 40g of protein"));
        assert!(text.contains("containing exactly 55g of carbs"));
        assert!(text.contains("and exactly 20g of fat"));
        assert!(text.contains(", ensuring they are very filling"));
    }

    #[test]
    fn test_home_ingredients_scenario() {
        let doc = encode(&request(), &chicken_and_rice());
        let text = doc.text();

        assert!(text.contains("200g of chicken"));
        assert!(text.contains("150g of rice"));
        assert!(!doc.has_clause(ClauseKind::Diet));
        assert!(!doc.has_clause(ClauseKind::Allergies));
    }

    #[test]
    fn test_any_ingredients_mode_skips_home_list() {
        let mut req = request();
        req.any_ingredients_mode = true;
        let doc = encode(&req, &chicken_and_rice());

        assert!(!doc.has_clause(ClauseKind::HomeIngredients));
        assert!(!doc.text().contains("chicken"));
    }

    #[test]
    fn test_empty_home_list_keeps_lead_in() {
        let doc = encode(&request(), &DietaryProfile::new());
        let clause = doc.clause(ClauseKind::HomeIngredients).unwrap();
        assert_eq!(clause.text, ", using just ingredients available at home:");
    }

    #[test]
    fn test_free_text_quantity() {
        let profile = DietaryProfile::new().with_ingredient("tomatoes", "3 cans");
        let doc = encode(&request(), &profile);
        assert!(doc.text().contains("at home: 3 cans of tomatoes"));
    }

    #[test]
    fn test_allergy_clause_lists_each_once() {
        let profile = DietaryProfile::new()
            .with_allergy("peanut")
            .with_allergy("shellfish")
            .with_allergy("milk");
        let doc = encode(&request(), &profile);
        let clause = &doc.clause(ClauseKind::Allergies).unwrap().text;

        for allergy in ["peanut", "shellfish", "milk"] {
            assert_eq!(clause.matches(allergy).count(), 1);
        }
        assert!(!clause.ends_with(','));
        assert_eq!(clause, ", avoiding ingredients such as milk, peanut, shellfish");
    }

    #[test]
    fn test_profile_vegan_always_wins() {
        let profile = DietaryProfile::new().vegan(true);
        for (vegan, vegetarian) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut req = request();
            req.vegan = vegan;
            req.vegetarian = vegetarian;
            assert_eq!(resolve_diet(&req, &profile), Some(Diet::Vegan));
            let doc = encode(&req, &profile);
            assert!(doc.text().contains("vegan-friendly"));
            assert!(!doc.text().contains("vegetarian-friendly"));
        }
    }

    #[test]
    fn test_vegetarian_profile_tightened_by_request() {
        let profile = DietaryProfile::new().vegetarian(true);
        let mut req = request();
        req.vegan = true;
        assert_eq!(resolve_diet(&req, &profile).map(|d| d.label()), Some("vegan-friendly"));

        req.vegan = false;
        assert_eq!(
            resolve_diet(&req, &profile).map(|d| d.label()),
            Some("vegetarian-friendly")
        );
    }

    #[test]
    fn test_request_only_diet() {
        let profile = DietaryProfile::new();
        let mut req = request();
        req.vegetarian = true;
        assert_eq!(resolve_diet(&req, &profile), Some(Diet::Vegetarian));
        req.vegan = true;
        assert_eq!(resolve_diet(&req, &profile), Some(Diet::Vegan));

        let doc = encode(&req, &profile);
        assert_eq!(
            doc.clause(ClauseKind::Diet).unwrap().text,
            ", and ensuring all recipes are vegan-friendly"
        );
    }

    #[test]
    fn test_absent_optionals_render_nothing() {
        let doc = encode(&request(), &chicken_and_rice());
        let text = doc.text();
        for fragment in OPTIONAL_FRAGMENTS {
            assert!(!text.contains(fragment), "unexpected '{}'", fragment);
        }
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_blank_optional_is_omitted() {
        let mut req = request();
        req.flavor = Some("  ".to_string());
        let doc = encode(&req, &DietaryProfile::new());
        assert!(!doc.has_clause(ClauseKind::Flavor));
    }

    #[test]
    fn test_optional_clause_order() {
        let req = RecipeRequest::builder("u-1")
            .macros(500, 30, 50, 15)
            .expand_ingredients(true)
            .gluten_free(true)
            .cuisine_style("Italian")
            .cooking_time("30 minutes")
            .flavor("smoky")
            .occasion("a weeknight dinner")
            .build()
            .unwrap();
        let profile = DietaryProfile::new().with_recent_recipe("Chicken Pesto Pasta");
        let doc = encode(&req, &profile);

        let kinds: Vec<ClauseKind> = doc.clauses.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ClauseKind::Base,
                ClauseKind::Nutrition,
                ClauseKind::Satiety,
                ClauseKind::HomeIngredients,
                ClauseKind::GlutenFree,
                ClauseKind::ExpandIngredients,
                ClauseKind::CuisineStyle,
                ClauseKind::CookingTime,
                ClauseKind::Flavor,
                ClauseKind::Occasion,
                ClauseKind::Novelty,
            ]
        );
        assert!(doc.text().ends_with(
            ", suitable for a weeknight dinner, avoiding repeating these recent recipes: Chicken Pesto Pasta"
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let profile = chicken_and_rice().with_allergy("peanut").vegetarian(true);
        let a = encode(&request(), &profile);
        let b = encode(&request(), &profile);
        assert_eq!(a.text(), b.text());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_truncation_is_prefix_cut() {
        let doc = encode(&request(), &chicken_and_rice());
        let full = doc.text();
        let cut = doc.truncated(30);
        assert_eq!(cut.chars().count(), 30);
        assert!(full.starts_with(&cut));
        assert_eq!(doc.truncated(full.len() + 10), full);
    }

    #[test]
    fn test_single_recipe_wording() {
        let encoder = ConstraintEncoder::new(OutputFormat::SingleRecipe);
        let doc = encoder.encode(&request(), &DietaryProfile::new().vegan(true));
        let text = doc.text();
        assert!(text.starts_with("Please generate 1 recipe. The recipe should have"));
        assert!(text.contains(", ensuring it is very filling"));
        assert!(text.contains(", and ensuring the recipe is vegan-friendly"));
        assert_eq!(doc.format_instructions, OutputFormat::SingleRecipe.instructions());
    }

    #[test]
    fn test_inline_text_appends_instructions() {
        let doc = encode(&request(), &DietaryProfile::new());
        let inline = doc.inline_text();
        assert!(inline.starts_with(&doc.text()));
        assert!(inline.ends_with(&doc.format_instructions));
    }
}
