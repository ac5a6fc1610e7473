pub mod artifact_store;
pub mod dataset_store;

pub use artifact_store::ArtifactStore;
pub use dataset_store::DatasetStore;
