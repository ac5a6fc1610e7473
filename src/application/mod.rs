// Offline pipeline
pub mod integration;
pub mod training;

// Serving
pub mod comparables;
pub mod inference;

// Narration
pub mod assessment;
