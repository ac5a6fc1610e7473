pub mod assessment;
pub mod prediction;
pub mod query;
pub mod training_example;

pub use assessment::{ActualContract, Assessment, FairnessLabel};
pub use prediction::{
    ComparableEntry, Estimate, FeatureAttribution, ModelAccuracy, PredictionResult,
    TwoWayPrediction, Valuation, ValueRange,
};
pub use query::{PredictionQuery, RecentForm, Role};
pub use training_example::{MatchKind, TrainingExample, UnmatchReason, UnmatchedContract};
