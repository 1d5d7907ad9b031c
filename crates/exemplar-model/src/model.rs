//! Model façade over the learner.
//!
//! [`Model`] is the interface callers train and classify through. It works
//! with named-feature [`Instance`]s rather than positional features, and can
//! export its whole state as bytes and load it back.
//!
//! [`LearnerModel`] implements it on top of a [`Learner`]. Instance features
//! are converted in sorted-name order, so every instance fed to one model must
//! use the same feature names.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use exemplar_model::{
//!     instance::{FeatureValue, Instance},
//!     model::{LearnerModel, Model as _},
//! };
//!
//! let instance = |x: f64, label: &str| {
//!     Instance::labeled(BTreeMap::from([("x".to_owned(), FeatureValue::Number(x))]), label)
//! };
//!
//! let mut model = LearnerModel::new();
//! model.add_training_instances(&[instance(1.0, "small"), instance(100.0, "large")])?;
//! model.train()?;
//!
//! let mut restored = LearnerModel::new();
//! restored.load(&model.export()?)?;
//!
//! let mut query = instance(90.0, "unknown").unlabeled();
//! restored.classify(&mut query)?;
//! assert_eq!(query.classification.as_deref(), Some("large"));
//! # Ok::<(), exemplar_model::model::ModelError>(())
//! ```

use std::sync::Arc;

use exemplar_learner::{
    LearnerError, combination::CombinationIndex, distribution, experience::Experience,
    feature::Feature, learner::Learner,
};
use serde::{Deserialize, Serialize};

use crate::instance::{FeatureValue, Instance};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum ModelError {
    #[display("training instance has no classification")]
    MissingLabel,
    #[display("learner rejected the request")]
    Learner(LearnerError),
    #[display("stored feature arity {stored:?} does not match the stored experiences ({actual:?})")]
    InconsistentState {
        stored: Option<usize>,
        actual: Option<usize>,
    },
    /// JSON has no encoding for NaN or infinity, so such features cannot be stored.
    #[display("feature {name} is not a finite number")]
    NonFiniteFeature { name: String },
    #[display("failed to serialize or deserialize model state")]
    Serialization(serde_json::Error),
}

impl From<LearnerError> for ModelError {
    fn from(err: LearnerError) -> Self {
        Self::Learner(err)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

/// A trainable classifier working on [`Instance`]s.
pub trait Model {
    /// Replaces the state of this model with a previously exported one.
    fn load(&mut self, bytes: &[u8]) -> Result<(), ModelError>;

    /// Exports the state of this model.
    fn export(&self) -> Result<Vec<u8>, ModelError>;

    /// Prepares the model for classification after training instances were added.
    fn train(&mut self) -> Result<(), ModelError>;

    fn add_training_instance(&mut self, instance: &Instance) -> Result<(), ModelError>;

    fn add_training_instances(&mut self, instances: &[Instance]) -> Result<(), ModelError> {
        for instance in instances {
            self.add_training_instance(instance)?;
        }
        Ok(())
    }

    /// Classifies `instance`, storing the distribution, classification and
    /// confidence on it.
    fn classify<'a>(&self, instance: &'a mut Instance) -> Result<&'a mut Instance, ModelError>;

    fn classify_all(&self, instances: &mut [Instance]) -> Result<(), ModelError> {
        for instance in instances {
            self.classify(instance)?;
        }
        Ok(())
    }
}

/// Serializable state of a [`LearnerModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub feature_arity: Option<usize>,
    pub experiences: Vec<Experience<String>>,
}

/// [`Model`] backed by a [`Learner`].
#[derive(Debug, Clone)]
pub struct LearnerModel {
    learner: Learner<String>,
    min_confidence: f64,
}

impl Default for LearnerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LearnerModel {
    #[must_use]
    pub fn new() -> Self {
        Self::with_index(Arc::new(CombinationIndex::new()))
    }

    /// Creates an empty model whose learner uses a shared combination index.
    #[must_use]
    pub fn with_index(combinations: Arc<CombinationIndex>) -> Self {
        Self {
            learner: Learner::with_index(combinations),
            min_confidence: 0.0,
        }
    }

    /// Sets the confidence below which [`Model::classify`] leaves instances unclassified.
    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    #[must_use]
    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    #[must_use]
    pub fn learner(&self) -> &Learner<String> {
        &self.learner
    }

    #[must_use]
    pub fn to_state(&self) -> ModelState {
        ModelState {
            feature_arity: self.learner.feature_arity(),
            experiences: self.learner.experiences().to_vec(),
        }
    }

    /// Replaces the learner with one rebuilt from `state`.
    ///
    /// The experiences are revalidated for uniform arity and finite values.
    pub fn restore(&mut self, state: ModelState) -> Result<(), ModelError> {
        let ModelState {
            feature_arity,
            experiences,
        } = state;
        for experience in &experiences {
            if let Some(index) = experience
                .features()
                .iter()
                .position(|feature| matches!(feature, Feature::Continuous(v) if !v.is_finite()))
            {
                return Err(ModelError::NonFiniteFeature {
                    name: feature_name(index),
                });
            }
        }
        let learner = Learner::from_experiences_with_index(
            experiences,
            Arc::clone(self.learner.combination_index()),
        )?;
        if learner.feature_arity() != feature_arity {
            return Err(ModelError::InconsistentState {
                stored: feature_arity,
                actual: learner.feature_arity(),
            });
        }
        self.learner = learner;
        Ok(())
    }
}

impl Model for LearnerModel {
    fn load(&mut self, bytes: &[u8]) -> Result<(), ModelError> {
        let state: ModelState = serde_json::from_slice(bytes)?;
        self.restore(state)?;
        tracing::debug!(
            experiences = self.learner.len(),
            arity = ?self.learner.feature_arity(),
            "loaded model state"
        );
        Ok(())
    }

    fn export(&self) -> Result<Vec<u8>, ModelError> {
        Ok(serde_json::to_vec(&self.to_state())?)
    }

    /// There is nothing to fit; this pre-builds the feature combinations so
    /// that the first classification does not pay for them.
    fn train(&mut self) -> Result<(), ModelError> {
        if !self.learner.is_empty() {
            self.learner.optimize()?;
        }
        Ok(())
    }

    fn add_training_instance(&mut self, instance: &Instance) -> Result<(), ModelError> {
        self.learner.learn(to_experience(instance)?)?;
        Ok(())
    }

    fn classify<'a>(&self, instance: &'a mut Instance) -> Result<&'a mut Instance, ModelError> {
        let votes = self.learner.distribution(&instance.to_features())?;
        let classification = distribution::classify(&votes, self.min_confidence);
        instance.distribution = Some(votes);
        match classification {
            Some(classification) => {
                instance.classification = Some(classification.outcome);
                instance.confidence = Some(classification.confidence);
            }
            None => {
                instance.classification = None;
                instance.confidence = None;
            }
        }
        Ok(instance)
    }
}

/// Converts a labeled instance into an experience.
///
/// Fails if the instance has no label or a NaN or infinite feature.
pub fn to_experience(instance: &Instance) -> Result<Experience<String>, ModelError> {
    let outcome = instance
        .classification
        .clone()
        .ok_or(ModelError::MissingLabel)?;
    if let Some((name, _)) = instance
        .features
        .iter()
        .find(|(_, value)| value.is_non_finite())
    {
        return Err(ModelError::NonFiniteFeature { name: name.clone() });
    }
    Ok(Experience::new(instance.to_features(), outcome))
}

/// Converts an experience into a labeled instance.
///
/// Features are named `feature_000`, `feature_001`, ... so that their sorted
/// order matches their position.
#[must_use]
pub fn to_instance(experience: &Experience<String>) -> Instance {
    let features = experience
        .features()
        .iter()
        .enumerate()
        .map(|(i, feature)| (feature_name(i), FeatureValue::from(feature.clone())))
        .collect();
    Instance::labeled(features, experience.outcome().clone())
}

/// Positional feature name for unnamed columns.
#[must_use]
pub fn feature_name(index: usize) -> String {
    format!("feature_{index:03}")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::table::{TableOptions, read_instances};

    fn xor_instance(a: bool, b: bool, label: Option<&str>) -> Instance {
        let features = BTreeMap::from([
            ("a".to_owned(), FeatureValue::Text(a.to_string())),
            ("b".to_owned(), FeatureValue::Text(b.to_string())),
        ]);
        Instance {
            classification: label.map(str::to_owned),
            ..Instance::new(features)
        }
    }

    fn xor_model() -> LearnerModel {
        let mut model = LearnerModel::new();
        model
            .add_training_instances(&[
                xor_instance(false, false, Some("B")),
                xor_instance(true, false, Some("A")),
                xor_instance(false, true, Some("A")),
                xor_instance(true, true, Some("B")),
            ])
            .unwrap();
        model.train().unwrap();
        model
    }

    #[test]
    fn test_classify_writes_back_results() {
        let model = xor_model();
        let mut query = xor_instance(false, true, None);
        model.classify(&mut query).unwrap();
        assert_eq!(query.classification.as_deref(), Some("A"));
        assert_eq!(query.confidence, Some(1.0));
        let distribution = query.distribution.unwrap();
        assert_eq!(
            distribution.outcomes().cloned().collect::<Vec<_>>(),
            ["B", "A"]
        );
    }

    #[test]
    fn test_classify_clears_stale_label_when_unsure() {
        let model = xor_model().with_min_confidence(1.5);
        let mut query = xor_instance(true, true, Some("stale"));
        query.confidence = Some(0.9);
        model.classify(&mut query).unwrap();
        assert_eq!(query.classification, None);
        assert_eq!(query.confidence, None);
        assert!(query.distribution.is_some());
    }

    #[test]
    fn test_training_requires_label() {
        let mut model = LearnerModel::new();
        let err = model
            .add_training_instance(&xor_instance(true, true, None))
            .unwrap_err();
        assert!(err.is_missing_label());
        assert!(model.learner().is_empty());
    }

    #[test]
    fn test_training_rejects_different_feature_count() {
        let mut model = xor_model();
        let mut instance = xor_instance(true, true, Some("B"));
        instance
            .features
            .insert("c".to_owned(), FeatureValue::Number(1.0));
        let err = model.add_training_instance(&instance).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Learner(LearnerError::ShapeMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(model.learner().len(), 4);
    }

    #[test]
    fn test_export_load_round_trip() {
        let model = xor_model();
        let bytes = model.export().unwrap();

        let mut restored = LearnerModel::new();
        restored.load(&bytes).unwrap();
        assert_eq!(restored.to_state(), model.to_state());
        assert_eq!(restored.learner().feature_arity(), Some(2));

        for (a, b) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut original = xor_instance(a, b, None);
            let mut reloaded = xor_instance(a, b, None);
            model.classify(&mut original).unwrap();
            restored.classify(&mut reloaded).unwrap();
            assert_eq!(original, reloaded);
        }
    }

    #[test]
    fn test_load_empty_model() {
        let bytes = LearnerModel::new().export().unwrap();
        let mut restored = xor_model();
        restored.load(&bytes).unwrap();
        assert!(restored.learner().is_empty());
        assert_eq!(restored.learner().feature_arity(), None);
    }

    #[test]
    fn test_load_rejects_inconsistent_state() {
        let mut state = xor_model().to_state();
        state.feature_arity = Some(3);
        let bytes = serde_json::to_vec(&state).unwrap();

        let mut model = LearnerModel::new();
        let err = model.load(&bytes).unwrap_err();
        assert!(err.is_inconsistent_state());
        assert!(model.learner().is_empty());
    }

    #[test]
    fn test_load_rejects_non_uniform_experiences() {
        let state = ModelState {
            feature_arity: Some(2),
            experiences: vec![
                Experience::new([Feature::nominal("x"), Feature::nominal("y")], "A".to_owned()),
                Experience::new([Feature::nominal("x")], "B".to_owned()),
            ],
        };
        let bytes = serde_json::to_vec(&state).unwrap();
        let err = LearnerModel::new().load(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Learner(LearnerError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = LearnerModel::new().load(b"not json").unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_non_finite_cells_survive_export_load() {
        let data = "NaN,a,x\n1.0,b,y\ninf,a,x\n";
        let instances = read_instances(data.as_bytes(), &TableOptions::default()).unwrap();
        let mut model = LearnerModel::new();
        model.add_training_instances(&instances).unwrap();

        let mut restored = LearnerModel::new();
        restored.load(&model.export().unwrap()).unwrap();
        assert_eq!(restored.to_state(), model.to_state());
    }

    #[test]
    fn test_training_rejects_non_finite_number() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut model = LearnerModel::new();
            let instance = Instance::labeled(
                BTreeMap::from([
                    ("a".to_owned(), FeatureValue::Number(1.0)),
                    ("b".to_owned(), FeatureValue::Number(value)),
                ]),
                "x",
            );
            let err = model.add_training_instance(&instance).unwrap_err();
            assert!(matches!(err, ModelError::NonFiniteFeature { ref name } if name == "b"));
            assert!(model.learner().is_empty());
        }
    }

    #[test]
    fn test_restore_rejects_non_finite_experience() {
        let state = ModelState {
            feature_arity: Some(2),
            experiences: vec![Experience::new(
                [Feature::nominal("x"), Feature::continuous(f64::INFINITY)],
                "A".to_owned(),
            )],
        };
        let mut model = xor_model();
        let err = model.restore(state).unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteFeature { ref name } if name == "feature_001"));
        assert_eq!(model.learner().len(), 4);
    }

    #[test]
    fn test_classify_all() {
        let model = xor_model();
        let mut queries = vec![
            xor_instance(false, false, None),
            xor_instance(true, false, None),
        ];
        model.classify_all(&mut queries).unwrap();
        let labels = queries
            .iter()
            .map(|query| query.classification.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(labels, [Some("B"), Some("A")]);
    }

    #[test]
    fn test_instance_experience_conversion() {
        let experience = Experience::new(
            [Feature::continuous(2.5), Feature::nominal("red")],
            "yes".to_owned(),
        );
        let instance = to_instance(&experience);
        assert_eq!(
            instance.features.keys().collect::<Vec<_>>(),
            ["feature_000", "feature_001"]
        );
        assert_eq!(to_experience(&instance).unwrap(), experience);
    }
}
