// ABOUTME: Library module for churn-elt
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod utils;
