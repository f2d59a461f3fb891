//! Career artifact extraction: turns free-form advisory text into typed,
//! renderable artifacts plus a cleaned display copy.

pub mod detectors;
pub mod engine;
pub mod generators;
pub mod handlers;
pub mod models;
pub mod patterns;
pub mod prioritizer;
pub mod sanitizer;
pub mod text;
