//! goldencheck-core — Rubric scoring engine, suite model, and report types.
//!
//! This crate defines the golden prompt suite data model, the response
//! parsers and heuristics each rubric dimension relies on, and the engine
//! that folds them into per-case and per-suite verdicts.

pub mod config;
pub mod engine;
pub mod error;
pub mod inspector;
pub mod json_path;
pub mod model;
pub mod numbers;
pub mod parser;
pub mod reference;
pub mod report;
pub mod results;
pub mod sections;
pub mod traits;
