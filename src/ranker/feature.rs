//! Contextual features and their smoothing weights.

use rustc_hash::FxHashMap;

/// Fallback smoothing weight for kinds without a configured entry.
pub const DEFAULT_FEATURE_WEIGHT: f64 = 1.0;

/// The kind of a contextual feature.
///
/// Kinds are extensible; the one built-in kind is the token found in the
/// text surrounding the edit point.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum FeatureKind {
    /// A token found in the environment of the edit point.
    EnvironmentToken,
}

/// A typed unit of context evidence.
///
/// Features are immutable values compared and hashed by `(kind, value)`.
/// Their smoothing weight is a per-kind configuration lookup (see
/// [`FeatureWeights`]), not per-instance state.
///
/// # Examples
///
/// ```
/// use contextual_ranker::ranker::{Feature, FeatureKind};
///
/// let feature = Feature::token("galaxy");
/// assert_eq!(feature.kind(), FeatureKind::EnvironmentToken);
/// assert_eq!(feature.value(), "galaxy");
/// assert_eq!(feature, Feature::token("galaxy"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Feature {
    kind: FeatureKind,
    value: String,
}

impl Feature {
    /// Create a feature of the given kind.
    pub fn new(kind: FeatureKind, value: impl Into<String>) -> Self {
        Feature {
            kind,
            value: value.into(),
        }
    }

    /// Create an environment-token feature.
    pub fn token(value: impl Into<String>) -> Self {
        Feature::new(FeatureKind::EnvironmentToken, value)
    }

    /// The feature's kind.
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// The feature's value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self.kind, self.value)
    }
}

/// Per-kind smoothing weight table.
///
/// The weight of a kind controls how strongly the neutral prior dampens
/// probability estimates for rarely-seen features of that kind. Weights
/// must be positive; kinds without an entry fall back to
/// [`DEFAULT_FEATURE_WEIGHT`].
///
/// # Examples
///
/// ```
/// use contextual_ranker::ranker::{FeatureKind, FeatureWeights};
///
/// let mut weights = FeatureWeights::new();
/// assert_eq!(weights.weight(FeatureKind::EnvironmentToken), 1.0);
///
/// weights.set(FeatureKind::EnvironmentToken, 2.5);
/// assert_eq!(weights.weight(FeatureKind::EnvironmentToken), 2.5);
/// ```
#[derive(Debug, Clone)]
pub struct FeatureWeights {
    weights: FxHashMap<FeatureKind, f64>,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        let mut weights = FxHashMap::default();
        weights.insert(FeatureKind::EnvironmentToken, DEFAULT_FEATURE_WEIGHT);
        FeatureWeights { weights }
    }
}

impl FeatureWeights {
    /// Create the default weight table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The smoothing weight for a kind.
    pub fn weight(&self, kind: FeatureKind) -> f64 {
        self.weights
            .get(&kind)
            .copied()
            .unwrap_or(DEFAULT_FEATURE_WEIGHT)
    }

    /// Set the smoothing weight for a kind. `weight` must be positive.
    pub fn set(&mut self, kind: FeatureKind, weight: f64) {
        debug_assert!(weight > 0.0, "feature weights must be positive");
        self.weights.insert(kind, weight);
    }
}
