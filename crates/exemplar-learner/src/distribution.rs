//! Outcome distributions, confidence scoring and confidence-weighted aggregation.
//!
//! A [`Distribution`] maps outcomes to non-negative weights. Weights are not
//! normalized. Entries keep the order in which their outcomes were first
//! inserted, which makes iteration and tie-breaking deterministic.
//!
//! # Confidence
//!
//! The [confidence](Distribution::confidence) of a distribution is the margin
//! between its leading and runner-up outcome after normalization:
//!
//! - no weight at all: `0`
//! - a single outcome: `1`
//! - otherwise: `top1 / total - top2 / total`
//!
//! # Aggregation
//!
//! [`aggregate`] merges distributions by adding every weight scaled by the
//! confidence of the distribution it came from. Indecisive distributions thus
//! contribute less than distributions strongly favoring one outcome.
//!
//! ```
//! use exemplar_learner::distribution::{Distribution, aggregate};
//!
//! let decisive = Distribution::from_iter([("a", 3.0), ("b", 1.0)]);
//! let tied = Distribution::from_iter([("a", 1.0), ("b", 1.0)]);
//! assert_eq!(decisive.confidence(), 0.5);
//! assert_eq!(tied.confidence(), 0.0);
//!
//! let merged = aggregate([&decisive, &tied]);
//! assert_eq!(merged.get(&"a"), Some(1.5));
//! assert_eq!(merged.get(&"b"), Some(0.5));
//! ```

use serde::{Deserialize, Serialize};

/// Mapping from outcome to accumulated weight, in first-insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution<O> {
    entries: Vec<(O, f64)>,
}

impl<O> Default for Distribution<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Distribution<O> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: vec![] }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&O, f64)> + '_ {
        self.entries.iter().map(|(outcome, weight)| (outcome, *weight))
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &O> + '_ {
        self.entries.iter().map(|(outcome, _)| outcome)
    }

    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(_, weight)| *weight)
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.weights().sum()
    }

    /// Rescales the weights so that they sum to `target_total`.
    ///
    /// Does nothing if the distribution carries no weight.
    pub fn normalize_to(&mut self, target_total: f64) {
        let total = self.total();
        if total <= 0.0 {
            return;
        }
        for (_, weight) in &mut self.entries {
            *weight = *weight / total * target_total;
        }
    }

    /// Returns the outcome with the greatest weight.
    ///
    /// On equal weights the outcome inserted first wins.
    #[must_use]
    pub fn best(&self) -> Option<(&O, f64)> {
        let mut best: Option<(&O, f64)> = None;
        for (outcome, weight) in self.iter() {
            if best.is_none_or(|(_, best_weight)| weight > best_weight) {
                best = Some((outcome, weight));
            }
        }
        best
    }

    /// Margin between the two leading outcomes after normalization.
    ///
    /// Returns a value in `[0, 1]` for non-negative weights.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        if self.len() == 1 {
            return 1.0;
        }
        let mut weights = self.weights().collect::<Vec<_>>();
        weights.sort_by(|a, b| b.total_cmp(a));
        weights[0] / total - weights[1] / total
    }

    /// Replaces every outcome by `f(outcome)`.
    ///
    /// `f` must map distinct outcomes to distinct outcomes.
    pub fn map_outcomes<P, F>(self, mut f: F) -> Distribution<P>
    where
        F: FnMut(O) -> P,
    {
        Distribution {
            entries: self
                .entries
                .into_iter()
                .map(|(outcome, weight)| (f(outcome), weight))
                .collect(),
        }
    }
}

impl<O> Distribution<O>
where
    O: PartialEq,
{
    /// Builds a distribution from entries whose outcomes are already distinct.
    pub(crate) fn from_distinct(entries: Vec<(O, f64)>) -> Self {
        debug_assert!(
            entries
                .iter()
                .enumerate()
                .all(|(i, (o, _))| entries[..i].iter().all(|(p, _)| p != o)),
            "outcomes must be distinct"
        );
        Self { entries }
    }

    /// Adds `weight` to the weight of `outcome`, inserting it if absent.
    pub fn add(&mut self, outcome: O, weight: f64) {
        match self.entries.iter_mut().find(|(o, _)| *o == outcome) {
            Some((_, w)) => *w += weight,
            None => self.entries.push((outcome, weight)),
        }
    }

    #[must_use]
    pub fn get(&self, outcome: &O) -> Option<f64> {
        self.entries
            .iter()
            .find(|(o, _)| o == outcome)
            .map(|(_, weight)| *weight)
    }
}

impl<O> FromIterator<(O, f64)> for Distribution<O>
where
    O: PartialEq,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (O, f64)>,
    {
        let mut distribution = Self::new();
        for (outcome, weight) in iter {
            distribution.add(outcome, weight);
        }
        distribution
    }
}

/// Computes the confidence of `distribution`.
///
/// See [`Distribution::confidence`].
#[must_use]
pub fn confidence<O>(distribution: &Distribution<O>) -> f64 {
    distribution.confidence()
}

/// A predicted outcome together with the confidence of the distribution it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification<O> {
    pub outcome: O,
    pub confidence: f64,
}

/// Picks the leading outcome of `distribution` if it is confident enough.
///
/// Returns `None` when the confidence is zero or below `min_confidence`. On
/// equal leading weights the outcome inserted first wins.
#[must_use]
pub fn classify<O>(
    distribution: &Distribution<O>,
    min_confidence: f64,
) -> Option<Classification<O>>
where
    O: Clone,
{
    let confidence = distribution.confidence();
    if confidence == 0.0 || confidence < min_confidence {
        return None;
    }
    let (outcome, _) = distribution.best()?;
    Some(Classification {
        outcome: outcome.clone(),
        confidence,
    })
}

/// Merges distributions, weighting each by its own confidence.
///
/// Aggregating no distributions yields an empty distribution.
pub fn aggregate<'a, O, I>(distributions: I) -> Distribution<O>
where
    O: Clone + PartialEq + 'a,
    I: IntoIterator<Item = &'a Distribution<O>>,
{
    let mut aggregated = Distribution::new();
    for distribution in distributions {
        let confidence = distribution.confidence();
        for (outcome, weight) in distribution.iter() {
            aggregated.add(outcome.clone(), confidence * weight);
        }
    }
    aggregated
}
