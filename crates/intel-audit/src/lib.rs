//! Intelligence waste audits: questionnaire scoring plus cross-audit pattern learning.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
