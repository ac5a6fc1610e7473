use crate::domain::ml::artifact::Target;
use crate::domain::player::Segment;
use thiserror::Error;

/// Raised when a position string does not name a known roster slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown position: {0:?}")]
pub struct UnknownPositionError(pub String);

/// Errors raised while building the training dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("Insufficient {segment} data: {found} examples < required {required}")]
    InsufficientData {
        segment: Segment,
        found: usize,
        required: usize,
    },
}

/// Errors that abort a single (segment, target) training run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("Insufficient {segment} data for {target}: {found} examples < required {required}")]
    InsufficientData {
        segment: Segment,
        target: Target,
        found: usize,
        required: usize,
    },

    #[error("Required feature column {feature} is absent from every {segment} example")]
    MissingFeatureColumn { segment: Segment, feature: String },

    #[error("Temporal split for {segment} needs 3 distinct signing years, found {distinct_years}")]
    InsufficientSeasons {
        segment: Segment,
        distinct_years: usize,
    },

    #[error("Temporal split for {segment} produced an empty {split} slice")]
    EmptySplit {
        segment: Segment,
        split: &'static str,
    },
}

/// Errors returned to callers of the serving path.
///
/// `Display` carries internal detail and is meant for server-side logs;
/// callers facing end users should show [`ServingError::public_message`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServingError {
    #[error("Invalid query field {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    UnknownPosition(#[from] UnknownPositionError),

    #[error("Model artifacts not loaded: {reason}")]
    ModelNotLoaded { reason: String },

    #[error("Artifact registry already installed")]
    RegistryAlreadyInstalled,
}

impl ServingError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn model_not_loaded(reason: impl Into<String>) -> Self {
        Self::ModelNotLoaded {
            reason: reason.into(),
        }
    }

    /// Generic, non-leaking message safe to surface to end users.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "The request contains a missing or out-of-range field.",
            Self::UnknownPosition(_) => "The position is not recognized.",
            Self::ModelNotLoaded { .. } | Self::RegistryAlreadyInstalled => {
                "Valuation models are not available right now."
            }
        }
    }

    /// True for errors caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::UnknownPosition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_error_formatting() {
        let error = TrainingError::InsufficientData {
            segment: Segment::Pitcher,
            target: Target::Aav,
            found: 12,
            required: 20,
        };

        let msg = error.to_string();
        assert!(msg.contains("pitcher"));
        assert!(msg.contains("12"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_public_message_hides_detail() {
        let error = ServingError::validation("batting.avg", "value 7.2 outside 0..=1 for /tmp/x");
        assert!(!error.public_message().contains("7.2"));
        assert!(error.to_string().contains("7.2"));
        assert!(error.is_client_error());

        let error = ServingError::model_not_loaded("missing batter_aav.json");
        assert!(!error.public_message().contains("batter_aav"));
        assert!(!error.is_client_error());
    }

    #[test]
    fn test_unknown_position_converts() {
        let error: ServingError = UnknownPositionError("QB".to_string()).into();
        assert!(error.to_string().contains("QB"));
        assert!(error.is_client_error());
    }
}
