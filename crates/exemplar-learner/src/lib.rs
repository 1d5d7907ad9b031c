//! Instance-based learning engine.
//!
//! This crate stores labeled examples ("experiences") and predicts outcomes for
//! new feature vectors by aggregating similarity-weighted votes of stored
//! experiences over many subsets of the feature space.
//!
//! # Modules
//!
//! - [`feature`]: Continuous and nominal features and their similarity measure
//! - [`experience`]: Labeled examples pairing features with an outcome
//! - [`combination`]: Sampled feature-index subsets, cached per feature arity
//! - [`distribution`]: Outcome distributions, confidence and aggregation
//! - [`learner`]: The learner storing experiences and running inference
//!
//! # Architecture
//!
//! ```text
//! Features + Outcome
//!     ↓ wrapped as
//! Experience
//!     ↓ learned by
//! Learner ──uses──> CombinationIndex (feature-index subsets)
//!     ↓ votes per subset, aggregated by confidence
//! Distribution
//!     ↓ thresholded by confidence
//! Classification
//! ```
//!
//! # Examples
//!
//! ```
//! use exemplar_learner::{feature::Feature, learner::Learner};
//!
//! let bits = |a: &str, b: &str| [Feature::nominal(a), Feature::nominal(b)];
//!
//! let mut learner = Learner::new();
//! learner.learn_features(bits("0", "0"), "even")?;
//! learner.learn_features(bits("1", "0"), "odd")?;
//! learner.learn_features(bits("0", "1"), "odd")?;
//! learner.learn_features(bits("1", "1"), "even")?;
//! learner.optimize()?;
//!
//! let classification = learner.classification(&bits("1", "0"), 0.0)?.unwrap();
//! assert_eq!(classification.outcome, "odd");
//! assert_eq!(classification.confidence, 1.0);
//! # Ok::<(), exemplar_learner::LearnerError>(())
//! ```

pub mod combination;
pub mod distribution;
pub mod experience;
pub mod feature;
pub mod learner;

use self::feature::FeatureTypeMismatch;

/// Errors surfaced by [`Learner`](learner::Learner) operations.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
pub enum LearnerError {
    /// An experience or query without any feature.
    #[display("experience must have at least one feature")]
    EmptyFeatures,
    /// Feature count differs from the learner's arity.
    #[display("features must be uniform size: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[display("learner has no experience")]
    NoExperience,
    #[display("feature type mismatch")]
    TypeMismatch(FeatureTypeMismatch),
}

impl From<FeatureTypeMismatch> for LearnerError {
    fn from(err: FeatureTypeMismatch) -> Self {
        Self::TypeMismatch(err)
    }
}
