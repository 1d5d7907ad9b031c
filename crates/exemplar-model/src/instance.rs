//! Typed instances exchanged with a [`Model`](crate::model::Model).
//!
//! An [`Instance`] describes one example by named feature values. It may carry
//! a known classification (for training) and, after classification, the
//! predicted outcome, its confidence and the full outcome distribution.
//!
//! # Serialization
//!
//! Feature values serialize as plain JSON numbers or strings:
//!
//! ```json
//! {
//!   "features": { "petal_length": 1.4, "color": "red" },
//!   "classification": "setosa",
//!   "confidence": 0.92,
//!   "distribution": [["setosa", 3.1], ["versicolor", 0.2]]
//! }
//! ```

use std::collections::BTreeMap;

use exemplar_learner::{distribution::Distribution, feature::Feature};
use serde::{Deserialize, Serialize};

/// Value of one named feature of an [`Instance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    /// Interprets a table cell: finite numbers become [`FeatureValue::Number`],
    /// anything else [`FeatureValue::Text`].
    ///
    /// Surrounding whitespace is ignored. Cells such as `NaN` or `inf` stay text.
    #[must_use]
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        match cell.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Number(number),
            _ => Self::Text(cell.to_owned()),
        }
    }

    /// Whether this is a NaN or infinite number.
    #[must_use]
    pub fn is_non_finite(&self) -> bool {
        matches!(self, Self::Number(number) if !number.is_finite())
    }
}

impl From<&FeatureValue> for Feature {
    fn from(value: &FeatureValue) -> Self {
        match value {
            FeatureValue::Number(number) => Feature::Continuous(*number),
            FeatureValue::Text(text) => Feature::Nominal(text.clone()),
        }
    }
}

impl From<Feature> for FeatureValue {
    fn from(feature: Feature) -> Self {
        match feature {
            Feature::Continuous(number) => Self::Number(number),
            Feature::Nominal(text) => Self::Text(text),
        }
    }
}

/// One example described by named feature values.
///
/// Features are kept sorted by name; this sorted order is the canonical
/// feature order used when converting to learner features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub features: BTreeMap<String, FeatureValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution<String>>,
}

impl Instance {
    #[must_use]
    pub fn new(features: BTreeMap<String, FeatureValue>) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn labeled<S>(features: BTreeMap<String, FeatureValue>, classification: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            features,
            classification: Some(classification.into()),
            ..Self::default()
        }
    }

    /// Copy of this instance with its features only.
    #[must_use]
    pub fn unlabeled(&self) -> Self {
        Self::new(self.features.clone())
    }

    /// Learner features in canonical (sorted name) order.
    #[must_use]
    pub fn to_features(&self) -> Vec<Feature> {
        self.features.values().map(Feature::from).collect()
    }
}
