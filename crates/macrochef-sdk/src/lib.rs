//! # MacroChef SDK
//!
//! Client SDK for submitting recipe jobs to a MacroChef node and
//! collecting their results.

pub mod client;
pub mod stream;

pub use client::MacroChefClient;
pub use stream::{JobEvent, JobStream};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::MacroChefClient;
    pub use crate::stream::{JobEvent, JobStream};
    pub use macrochef_core::prelude::*;
}
