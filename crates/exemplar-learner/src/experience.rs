use serde::{Deserialize, Serialize};

use crate::feature::Feature;

/// A labeled example: an ordered sequence of features and the outcome observed for them.
///
/// The outcome is opaque to the learner; it is only compared for equality and hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience<O> {
    features: Vec<Feature>,
    outcome: O,
}

impl<O> Experience<O> {
    pub fn new<F>(features: F, outcome: O) -> Self
    where
        F: IntoIterator<Item = Feature>,
    {
        Self {
            features: features.into_iter().collect(),
            outcome,
        }
    }

    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[must_use]
    pub fn outcome(&self) -> &O {
        &self.outcome
    }
}
