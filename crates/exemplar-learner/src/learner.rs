//! The memory-based learner.
//!
//! A [`Learner`] stores experiences and predicts outcomes for new feature
//! vectors by letting stored experiences vote, weighted by their similarity to
//! the query.
//!
//! # Inference
//!
//! 1. For every sampled feature-index combination (see
//!    [`combination`](crate::combination)), each experience votes for its
//!    outcome with the product of per-feature similarities over that
//!    combination.
//! 2. The per-combination distributions are grouped by combination size and
//!    merged per group with [`aggregate`].
//! 3. Each size group is rescaled to sum to the triangular number of its
//!    size, so votes over richer combinations weigh more. Groups without any
//!    weight are dropped.
//! 4. The size groups are merged with [`aggregate`] into the final
//!    distribution.
//!
//! Outcomes appear in the resulting distribution in the order they were first
//! learned.

use std::{collections::HashMap, hash::Hash, iter, sync::Arc};

use crate::{
    LearnerError,
    combination::{Combination, CombinationIndex},
    distribution::{self, Classification, Distribution, aggregate},
    experience::Experience,
    feature::Feature,
};

/// Entity that learns from experience.
#[derive(Debug, Clone)]
pub struct Learner<O> {
    experiences: Vec<Experience<O>>,
    outcome_ids: Vec<usize>,
    outcomes: Vec<O>,
    outcome_lookup: HashMap<O, usize>,
    feature_arity: Option<usize>,
    combinations: Arc<CombinationIndex>,
}

impl<O> Default for Learner<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Learner<O> {
    /// Creates a learner with no experience and its own combination index.
    #[must_use]
    pub fn new() -> Self {
        Self::with_index(Arc::new(CombinationIndex::new()))
    }

    /// Creates a learner with no experience that uses a shared combination index.
    #[must_use]
    pub fn with_index(combinations: Arc<CombinationIndex>) -> Self {
        Self {
            experiences: vec![],
            outcome_ids: vec![],
            outcomes: vec![],
            outcome_lookup: HashMap::new(),
            feature_arity: None,
            combinations,
        }
    }

    #[must_use]
    pub fn experiences(&self) -> &[Experience<O>] {
        &self.experiences
    }

    /// Distinct outcomes in the order they were first learned.
    #[must_use]
    pub fn outcomes(&self) -> &[O] {
        &self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.experiences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
    }

    /// Number of features per experience, fixed by the first experience learned.
    #[must_use]
    pub fn feature_arity(&self) -> Option<usize> {
        self.feature_arity
    }

    #[must_use]
    pub fn combination_index(&self) -> &Arc<CombinationIndex> {
        &self.combinations
    }

    fn check_arity(&self, actual: usize) -> Result<(), LearnerError> {
        if actual == 0 {
            return Err(LearnerError::EmptyFeatures);
        }
        match self.feature_arity {
            Some(expected) if expected != actual => {
                Err(LearnerError::ShapeMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn query_arity(&self, query: &[Feature]) -> Result<usize, LearnerError> {
        let expected = self.feature_arity.ok_or(LearnerError::NoExperience)?;
        if query.len() != expected {
            return Err(LearnerError::ShapeMismatch {
                expected,
                actual: query.len(),
            });
        }
        Ok(expected)
    }

    /// Pre-builds the feature combinations for the current arity.
    ///
    /// This moves the combination enumeration cost out of the first query.
    pub fn optimize(&self) -> Result<(), LearnerError> {
        let arity = self.feature_arity.ok_or(LearnerError::NoExperience)?;
        let combinations = self.combinations.combinations(arity);
        tracing::debug!(
            arity,
            combinations = combinations.len(),
            "feature combinations ready"
        );
        Ok(())
    }
}

impl<O> Learner<O>
where
    O: Clone + Eq + Hash,
{
    /// Creates a learner from existing experiences, using its own combination index.
    ///
    /// # Errors
    ///
    /// Fails if the experiences do not all have the same number of features, or
    /// if they have no features at all.
    pub fn from_experiences<I>(experiences: I) -> Result<Self, LearnerError>
    where
        I: IntoIterator<Item = Experience<O>>,
    {
        Self::from_experiences_with_index(experiences, Arc::new(CombinationIndex::new()))
    }

    /// Creates a learner from existing experiences that uses a shared combination index.
    pub fn from_experiences_with_index<I>(
        experiences: I,
        combinations: Arc<CombinationIndex>,
    ) -> Result<Self, LearnerError>
    where
        I: IntoIterator<Item = Experience<O>>,
    {
        let experiences = experiences.into_iter().collect::<Vec<_>>();
        let mut learner = Self::with_index(combinations);
        for experience in &experiences {
            let actual = experience.features().len();
            learner.check_arity(actual)?;
            learner.feature_arity = Some(actual);
        }
        for experience in experiences {
            learner.push(experience);
        }
        tracing::debug!(
            experiences = learner.len(),
            outcomes = learner.outcomes.len(),
            arity = ?learner.feature_arity,
            "created learner from experiences"
        );
        Ok(learner)
    }

    /// Adds an experience to learn from.
    ///
    /// The first experience fixes the feature arity of this learner.
    ///
    /// # Errors
    ///
    /// Fails without modifying the learner if the experience has no features,
    /// or if its feature count differs from the established arity.
    pub fn learn(&mut self, experience: Experience<O>) -> Result<(), LearnerError> {
        let actual = experience.features().len();
        self.check_arity(actual)?;
        self.feature_arity = Some(actual);
        self.push(experience);
        Ok(())
    }

    /// Adds an experience built from `features` and `outcome`.
    pub fn learn_features<F>(&mut self, features: F, outcome: O) -> Result<(), LearnerError>
    where
        F: IntoIterator<Item = Feature>,
    {
        self.learn(Experience::new(features, outcome))
    }

    fn push(&mut self, experience: Experience<O>) {
        let next_id = self.outcomes.len();
        let id = *self
            .outcome_lookup
            .entry(experience.outcome().clone())
            .or_insert(next_id);
        if id == next_id {
            self.outcomes.push(experience.outcome().clone());
        }
        self.outcome_ids.push(id);
        self.experiences.push(experience);
    }

    /// Computes the outcome distribution for `query` based on past experience.
    ///
    /// # Errors
    ///
    /// - [`LearnerError::NoExperience`] if nothing has been learned yet
    /// - [`LearnerError::ShapeMismatch`] if `query` has the wrong number of features
    /// - [`LearnerError::TypeMismatch`] if a query feature has a different kind than
    ///   the stored feature at the same position
    pub fn distribution(&self, query: &[Feature]) -> Result<Distribution<O>, LearnerError> {
        let arity = self.query_arity(query)?;
        let combinations = self.combinations.combinations(arity);

        let mut by_size = vec![vec![]; arity];
        for combination in combinations.iter() {
            let votes = self.combination_votes(query, combination)?;
            by_size[combination.len() - 1].push(votes);
        }

        let mut size_distributions = vec![];
        for (i, group) in by_size.iter().enumerate() {
            let mut size_distribution = aggregate(group);
            if size_distribution.total() <= 0.0 {
                continue;
            }
            size_distribution.normalize_to(triangular(i + 1));
            size_distributions.push(size_distribution);
        }

        let votes = aggregate(&size_distributions);
        tracing::trace!(
            arity,
            combinations = combinations.len(),
            size_groups = size_distributions.len(),
            experiences = self.len(),
            "computed outcome distribution"
        );
        Ok(votes.map_outcomes(|id| self.outcomes[id].clone()))
    }

    /// Returns the most probable outcome for `query` if the distribution is
    /// confident enough.
    ///
    /// Returns `Ok(None)` when the confidence is zero or below `min_confidence`.
    pub fn classification(
        &self,
        query: &[Feature],
        min_confidence: f64,
    ) -> Result<Option<Classification<O>>, LearnerError> {
        let votes = self.distribution(query)?;
        Ok(distribution::classify(&votes, min_confidence))
    }

    /// Votes of all experiences over one combination, keyed by outcome id.
    fn combination_votes(
        &self,
        query: &[Feature],
        combination: &Combination,
    ) -> Result<Distribution<usize>, LearnerError> {
        let mut weights = vec![0.0; self.outcomes.len()];
        for (experience, &outcome) in iter::zip(&self.experiences, &self.outcome_ids) {
            let features = experience.features();
            let mut similarity = 1.0;
            for &i in combination.indices() {
                similarity *= query[i].compare(&features[i])?;
                if similarity == 0.0 {
                    break;
                }
            }
            // underflow
            if similarity.is_nan() {
                similarity = 0.0;
            }
            weights[outcome] += similarity;
        }
        Ok(Distribution::from_distinct(
            weights.into_iter().enumerate().collect(),
        ))
    }
}

#[expect(clippy::cast_precision_loss)]
fn triangular(size: usize) -> f64 {
    (size * (size + 1) / 2) as f64
}
