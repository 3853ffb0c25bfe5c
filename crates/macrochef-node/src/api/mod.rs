//! HTTP API.

pub mod health;
pub mod recipes;
