//! Immutable read views over a computed classification distribution.

use super::feature::Feature;
use crate::ranker::Category;
use std::sync::Arc;

/// One category with its computed probability.
///
/// Entries of a distribution are ordered by descending probability; ties
/// between distinct categories are broken by the category string so that
/// equally-probable categories never collapse into one rank slot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Classification {
    category: Category,
    probability: f64,
}

impl Classification {
    pub(crate) fn new(category: Category, probability: f64) -> Self {
        Classification {
            category,
            probability,
        }
    }

    /// The category this entry scores.
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// The probability the featureset belongs to this category.
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.category, self.probability)
    }
}

/// The full sorted distribution computed for one featureset.
///
/// Built once per query and discarded after use; rank accessors are
/// 1-based (most probable first) and exist for offline rank-quality
/// evaluation of the classifier.
///
/// # Examples
///
/// ```
/// use contextual_ranker::ranker::{BayesianRanker, Feature};
///
/// let ranker = BayesianRanker::new(100);
/// ranker.learn("Star", &[Feature::token("galaxy")]).unwrap();
///
/// let detailed = ranker.classify_detailed(&[Feature::token("galaxy")]);
/// assert_eq!(detailed.position_for("Star"), Some(1));
/// assert_eq!(detailed.category_at_position(1).map(String::as_str), Some("Star"));
/// assert!(detailed.probability_for("Star") > 0.0);
/// assert_eq!(detailed.probability_for("Planet"), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DetailedClassification {
    features: Vec<Feature>,
    distribution: Arc<[Classification]>,
}

impl DetailedClassification {
    pub(crate) fn new(features: Vec<Feature>, distribution: Arc<[Classification]>) -> Self {
        DetailedClassification {
            features,
            distribution,
        }
    }

    /// The featureset this distribution was computed for.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The probability for a category, `0.0` when the category is unknown.
    pub fn probability_for(&self, category: &str) -> f64 {
        self.distribution
            .iter()
            .find(|c| c.category() == category)
            .map(Classification::probability)
            .unwrap_or(0.0)
    }

    /// The 1-based rank of a category, most probable first.
    pub fn position_for(&self, category: &str) -> Option<usize> {
        self.distribution
            .iter()
            .position(|c| c.category() == category)
            .map(|i| i + 1)
    }

    /// The category at a 1-based rank.
    pub fn category_at_position(&self, position: usize) -> Option<&Category> {
        position
            .checked_sub(1)
            .and_then(|i| self.distribution.get(i))
            .map(Classification::category)
    }

    /// The most probable entry, `None` for an empty distribution.
    pub fn best(&self) -> Option<&Classification> {
        self.distribution.first()
    }

    /// Number of categories in the distribution.
    pub fn len(&self) -> usize {
        self.distribution.len()
    }

    /// `true` when no category was known at query time.
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }

    /// Iterate over the distribution, most probable first.
    pub fn iter(&self) -> impl Iterator<Item = &Classification> {
        self.distribution.iter()
    }
}
