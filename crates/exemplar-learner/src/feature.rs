//! Comparable attributes of an experience.
//!
//! A [`Feature`] is either continuous (a real value) or nominal (a label).
//! Two features of the same kind can be compared, producing a similarity score
//! in `[0, 1]`, where `1` means identical and `0` means no similarity at all.
//!
//! # Continuous Similarity
//!
//! Continuous similarity is measured relative to the magnitude of the feature
//! the comparison is made *from*:
//!
//! ```text
//! similarity(v, w) = (max(0, |v| - |v - w|) / v)²
//! ```
//!
//! The score is asymmetric: `compare(a, b)` and `compare(b, a)` generally
//! differ. Squaring biases the score toward near-exact matches.
//!
//! When `v` is zero the formula has no value, so the limit is used instead:
//! `1` if the other value is also zero, `0` otherwise. Equal values, infinities
//! included, are always fully similar.
//!
//! # Examples
//!
//! ```
//! use exemplar_learner::feature::Feature;
//!
//! let a = Feature::continuous(8.0);
//! let b = Feature::continuous(6.0);
//! assert_eq!(a.compare(&b)?, 0.5625);
//!
//! let red = Feature::nominal("red");
//! assert_eq!(red.compare(&Feature::nominal("red"))?, 1.0);
//! assert_eq!(red.compare(&Feature::nominal("blue"))?, 0.0);
//!
//! assert!(red.compare(&a).is_err());
//! # Ok::<(), exemplar_learner::feature::FeatureTypeMismatch>(())
//! ```

use serde::{Deserialize, Serialize};

/// One comparable attribute of an experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Feature {
    /// A real-valued attribute.
    Continuous(f64),
    /// A categorical attribute.
    Nominal(String),
}

/// Kind of a [`Feature`], without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FeatureKind {
    #[display("continuous")]
    Continuous,
    #[display("nominal")]
    Nominal,
}

/// Features of different kinds were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cannot compare {left} feature with {right} feature")]
pub struct FeatureTypeMismatch {
    pub left: FeatureKind,
    pub right: FeatureKind,
}

impl Feature {
    #[must_use]
    pub fn continuous(value: f64) -> Self {
        Self::Continuous(value)
    }

    pub fn nominal<S>(label: S) -> Self
    where
        S: Into<String>,
    {
        Self::Nominal(label.into())
    }

    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Continuous(_) => FeatureKind::Continuous,
            Self::Nominal(_) => FeatureKind::Nominal,
        }
    }

    /// Computes how similar `other` is to `self`.
    ///
    /// Returns a score in `[0, 1]`. Never returns NaN; a NaN score (from NaN
    /// inputs) is reported as `0`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureTypeMismatch`] if the features are of different kinds.
    pub fn compare(&self, other: &Self) -> Result<f64, FeatureTypeMismatch> {
        match (self, other) {
            (Self::Continuous(v), Self::Continuous(w)) => Ok(continuous_similarity(*v, *w)),
            (Self::Nominal(a), Self::Nominal(b)) => Ok(if a == b { 1.0 } else { 0.0 }),
            _ => Err(FeatureTypeMismatch {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }
}

impl From<f64> for Feature {
    fn from(value: f64) -> Self {
        Self::Continuous(value)
    }
}

impl From<String> for Feature {
    fn from(label: String) -> Self {
        Self::Nominal(label)
    }
}

impl From<&str> for Feature {
    fn from(label: &str) -> Self {
        Self::Nominal(label.to_owned())
    }
}

fn continuous_similarity(v: f64, w: f64) -> f64 {
    // equal infinities would otherwise give inf - NaN
    if v == w {
        return 1.0;
    }
    if v == 0.0 {
        return 0.0;
    }
    let ratio = f64::max(0.0, v.abs() - (v - w).abs()) / v;
    let similarity = ratio * ratio;
    if similarity.is_nan() { 0.0 } else { similarity }
}
