//! Classification accuracy measurement.
//!
//! Two evaluation schemes are provided:
//!
//! - [`resubstitution`]: classify the training instances themselves against a
//!   trained model. Cheap, but optimistic.
//! - [`repeated_holdout`]: repeatedly shuffle the instances, train a fresh model
//!   on a leading fraction and classify the rest.
//!
//! Outcomes are counted in a [`Tally`]. An instance the model declines to
//! classify (confidence below the floor) counts as unknown, which lowers
//! recall but not precision.
//!
//! # Metrics
//!
//! - precision: `right / (right + wrong)`
//! - accuracy: `right / (right + wrong + unknown)`
//! - recall: `(right + wrong) / (right + wrong + unknown)`

use std::{ops::AddAssign, sync::Arc};

use exemplar_learner::combination::CombinationIndex;
use rand::{SeedableRng as _, seq::SliceRandom as _};
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::{
    instance::Instance,
    model::{LearnerModel, Model, ModelError},
};

/// Counts of correct, incorrect and withheld classifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub right: usize,
    pub wrong: usize,
    pub unknown: usize,
}

impl Tally {
    pub fn record(&mut self, expected: &str, predicted: Option<&str>) {
        match predicted {
            None => self.unknown += 1,
            Some(predicted) if predicted == expected => self.right += 1,
            Some(_) => self.wrong += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.right + self.wrong + self.unknown
    }

    #[must_use]
    pub fn precision(&self) -> Option<f64> {
        ratio(self.right, self.right + self.wrong)
    }

    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.right, self.total())
    }

    #[must_use]
    pub fn recall(&self) -> Option<f64> {
        ratio(self.right + self.wrong, self.total())
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.right += rhs.right;
        self.wrong += rhs.wrong;
        self.unknown += rhs.unknown;
    }
}

#[expect(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// Classifies a copy of every instance with `model` and compares against its label.
///
/// # Errors
///
/// Fails with [`ModelError::MissingLabel`] if an instance has no label, or with
/// the model's error if classification fails.
pub fn resubstitution<M>(model: &M, instances: &[Instance]) -> Result<Tally, ModelError>
where
    M: Model + ?Sized,
{
    let mut tally = Tally::default();
    for instance in instances {
        tally.record(
            expected_label(instance)?,
            classify_copy(model, instance)?.as_deref(),
        );
    }
    Ok(tally)
}

fn expected_label(instance: &Instance) -> Result<&str, ModelError> {
    instance
        .classification
        .as_deref()
        .ok_or(ModelError::MissingLabel)
}

fn classify_copy<M>(model: &M, instance: &Instance) -> Result<Option<String>, ModelError>
where
    M: Model + ?Sized,
{
    let mut test = instance.unlabeled();
    model.classify(&mut test)?;
    Ok(test.classification)
}

/// Parameters of [`repeated_holdout`].
#[derive(Debug, Clone)]
pub struct HoldoutConfig {
    /// Fraction of the instances used for training in each round.
    pub training_fraction: f64,
    /// Number of shuffled train/test rounds.
    pub repeat: usize,
    /// Confidence floor passed to each round's model.
    pub min_confidence: f64,
    /// Seed of the shuffling RNG.
    pub seed: u64,
}

impl Default for HoldoutConfig {
    fn default() -> Self {
        Self {
            training_fraction: 0.8,
            repeat: 100,
            min_confidence: 0.0,
            seed: 0,
        }
    }
}

impl HoldoutConfig {
    /// Number of training instances per round out of `len` instances.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn training_count(&self, len: usize) -> usize {
        let fraction = self.training_fraction.clamp(0.0, 1.0);
        ((fraction * len as f64).round() as usize).min(len)
    }
}

/// Spread of per-round accuracy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracySummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl AccuracySummary {
    /// Summarizes `values`; `None` if there are none.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let n = values.len() as f64;
        let min = values.iter().copied().min_by(f64::total_cmp)?;
        let max = values.iter().copied().max_by(f64::total_cmp)?;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Result of [`repeated_holdout`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldoutReport {
    /// Counts accumulated over all rounds.
    pub tally: Tally,
    /// Accuracy spread over the rounds that had test instances.
    pub round_accuracy: Option<AccuracySummary>,
    pub num_training: usize,
    pub num_test: usize,
}

/// Repeatedly trains on a random split of `instances` and classifies the held-out rest.
///
/// Rounds are reproducible for a given [`HoldoutConfig::seed`]. All rounds
/// share one combination index, so the feature combinations are built once.
///
/// # Errors
///
/// Fails if an instance has no label, or if a round's model rejects its
/// instances. A training fraction that leaves no training instance while test
/// instances remain fails with [`LearnerError::NoExperience`].
///
/// [`LearnerError::NoExperience`]: exemplar_learner::LearnerError::NoExperience
pub fn repeated_holdout(
    instances: &[Instance],
    config: &HoldoutConfig,
) -> Result<HoldoutReport, ModelError> {
    let num_training = config.training_count(instances.len());
    let num_test = instances.len() - num_training;
    let combinations = Arc::new(CombinationIndex::new());
    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut order = (0..instances.len()).collect::<Vec<_>>();

    let mut tally = Tally::default();
    let mut accuracies = vec![];
    for round in 0..config.repeat {
        order.shuffle(&mut rng);
        let (training, test) = order.split_at(num_training);

        let mut model = LearnerModel::with_index(Arc::clone(&combinations))
            .with_min_confidence(config.min_confidence);
        for &i in training {
            model.add_training_instance(&instances[i])?;
        }
        model.train()?;

        let mut round_tally = Tally::default();
        for &i in test {
            let instance = &instances[i];
            round_tally.record(
                expected_label(instance)?,
                classify_copy(&model, instance)?.as_deref(),
            );
        }
        tracing::debug!(
            round,
            right = round_tally.right,
            wrong = round_tally.wrong,
            unknown = round_tally.unknown,
            "holdout round finished"
        );

        accuracies.extend(round_tally.accuracy());
        tally += round_tally;
    }

    Ok(HoldoutReport {
        tally,
        round_accuracy: AccuracySummary::new(accuracies),
        num_training,
        num_test,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::instance::FeatureValue;

    fn sized(x: f64) -> Instance {
        let label = if x < 50.0 { "small" } else { "large" };
        Instance::labeled(
            BTreeMap::from([("x".to_owned(), FeatureValue::Number(x))]),
            label,
        )
    }

    fn dataset() -> Vec<Instance> {
        [1.0, 3.0, 5.0, 8.0, 10.0, 12.0, 60.0, 70.0, 80.0, 90.0, 95.0, 99.0]
            .into_iter()
            .map(sized)
            .collect()
    }

    #[test]
    fn test_tally_metrics() {
        let mut tally = Tally::default();
        tally.record("a", Some("a"));
        tally.record("a", Some("a"));
        tally.record("a", Some("b"));
        tally.record("a", None);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.precision(), Some(2.0 / 3.0));
        assert_eq!(tally.accuracy(), Some(0.5));
        assert_eq!(tally.recall(), Some(0.75));

        let empty = Tally::default();
        assert_eq!(empty.precision(), None);
        assert_eq!(empty.accuracy(), None);
    }

    #[test]
    fn test_resubstitution_on_separable_data() {
        let instances = dataset();
        let mut model = LearnerModel::new();
        model.add_training_instances(&instances).unwrap();
        model.train().unwrap();

        let tally = resubstitution(&model, &instances).unwrap();
        assert_eq!(
            tally,
            Tally {
                right: instances.len(),
                wrong: 0,
                unknown: 0
            }
        );
    }

    #[test]
    fn test_resubstitution_requires_labels() {
        let instances = dataset();
        let mut model = LearnerModel::new();
        model.add_training_instances(&instances).unwrap();
        let err = resubstitution(&model, &[instances[0].unlabeled()]).unwrap_err();
        assert!(err.is_missing_label());
    }

    #[test]
    fn test_training_count() {
        let config = HoldoutConfig::default();
        assert_eq!(config.training_count(10), 8);
        assert_eq!(config.training_count(0), 0);
        let all = HoldoutConfig {
            training_fraction: 1.5,
            ..HoldoutConfig::default()
        };
        assert_eq!(all.training_count(7), 7);
    }

    #[test]
    fn test_repeated_holdout_is_reproducible() {
        let instances = dataset();
        let config = HoldoutConfig {
            repeat: 5,
            seed: 42,
            ..HoldoutConfig::default()
        };
        let first = repeated_holdout(&instances, &config).unwrap();
        let second = repeated_holdout(&instances, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.num_training, 10);
        assert_eq!(first.num_test, 2);
        assert_eq!(first.tally.total(), 10);
        assert!(first.round_accuracy.is_some());
    }

    #[test]
    fn test_repeated_holdout_confidence_floor_withholds() {
        let instances = dataset();
        let config = HoldoutConfig {
            repeat: 3,
            min_confidence: 2.0,
            ..HoldoutConfig::default()
        };
        let report = repeated_holdout(&instances, &config).unwrap();
        assert_eq!(report.tally.unknown, report.tally.total());
        assert_eq!(report.tally.recall(), Some(0.0));
        assert_eq!(report.tally.precision(), None);
    }

    #[test]
    fn test_accuracy_summary() {
        let summary = AccuracySummary::new([0.5, 1.0, 0.75, 0.75]).unwrap();
        assert_eq!(summary.min, 0.5);
        assert_eq!(summary.max, 1.0);
        assert_eq!(summary.mean, 0.75);
        assert!((summary.std_dev - 0.031_25_f64.sqrt()).abs() < 1e-12);
        assert_eq!(AccuracySummary::new([]), None);
    }
}
