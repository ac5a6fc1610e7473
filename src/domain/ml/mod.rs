pub mod artifact;
pub mod feature_registry;
pub mod gbdt;
pub mod scaler;

pub use artifact::{ARTIFACT_SCHEMA_VERSION, EvaluationMetrics, ModelArtifact, Target};
pub use feature_registry::{
    BatterFeatures, FeatureKind, FeatureSpec, FeatureVector, PitcherFeatures, SegmentFeatures,
    ValuationContext,
};
pub use gbdt::{BoostingParams, GradientBoostedRegressor};
pub use scaler::StandardScaler;
