//! # MacroChef Core
//!
//! Core types and pure logic for personalized recipe generation.
//!
//! This crate provides:
//! - [`RecipeRequest`] - validated per-request preferences
//! - [`DietaryProfile`] - the user's stored dietary record
//! - [`ConstraintEncoder`] - deterministic prompt construction
//! - [`sanitize`] - payload extraction from generated text
//! - [`JobState`] / [`JobRecord`] - asynchronous job bookkeeping
//! - [`RecipeError`] - error types

pub mod encoder;
pub mod error;
pub mod format;
pub mod profile;
pub mod request;
pub mod sanitize;
pub mod types;

// Re-exports for convenience
pub use encoder::{encode, resolve_diet, Clause, ClauseKind, ConstraintEncoder, Diet, PromptDocument};
pub use error::{RecipeError, Result};
pub use format::{InstructionMode, OutputFormat};
pub use profile::{DietaryProfile, Quantity};
pub use request::{MacroTargets, RecipeRequest, RecipeRequestBuilder};
pub use sanitize::{sanitize, sanitize_json, strip_echo};
pub use types::{JobFailure, JobRecord, JobState};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::encoder::{ConstraintEncoder, PromptDocument};
    pub use crate::error::{RecipeError, Result};
    pub use crate::format::{InstructionMode, OutputFormat};
    pub use crate::profile::DietaryProfile;
    pub use crate::request::RecipeRequest;
    pub use crate::types::{JobRecord, JobState};
}
