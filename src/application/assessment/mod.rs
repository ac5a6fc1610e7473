pub mod narrator;

pub use narrator::{AssessmentNarrator, classify};
