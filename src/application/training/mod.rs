pub mod metrics;
pub mod split;
pub mod trainer;

pub use split::{TemporalSplit, temporal_split};
pub use trainer::{ModelTrainer, TrainingReport};
