pub mod engine;
pub mod registry;

pub use engine::InferenceEngine;
pub use registry::ArtifactRegistry;
