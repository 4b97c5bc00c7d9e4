//! Online naive Bayes classifier with weighted smoothing.

use super::classification::{Classification, DetailedClassification};
use super::error::{RankerError, Result};
use super::feature::{Feature, FeatureWeights};
use super::Category;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An online naive Bayes ranker over contextual features.
///
/// Maintains co-occurrence counts between features and categories (a
/// category is the full identifier of an accepted candidate) and scores a
/// featureset against every known category:
///
/// ```text
/// classify(f1..fN) = argmax over c of P(c) * PROD(weighedAverage(fi | c))
/// ```
///
/// where the weighed average blends the observed rate of a feature with a
/// neutral prior of `0.5`, weighted by how often the feature has been seen
/// at all. This damps overconfidence for rarely-observed features.
///
/// # Memory capacity
///
/// Training examples are kept in a FIFO history bounded by the memory
/// capacity. When the bound is exceeded the oldest example is evicted and
/// its counts decremented symmetrically, so the model forgets stale usage
/// and tracks drift.
///
/// # Caching
///
/// The most recently computed distribution is cached, keyed by a
/// fingerprint of the feature collection, and cleared by any mutation.
/// Repeated queries with an unchanged featureset between learn events cost
/// one recomputation total; a query for a different featureset replaces
/// the slot rather than returning a stale distribution.
///
/// # Numeric note
///
/// Probabilities are plain `f64` products of sub-1.0 terms and can
/// underflow toward zero for very large featuresets. Only the relative
/// order of categories is used for ranking, so this is accepted rather
/// than worked around in log-space.
///
/// # Thread Safety
///
/// Uses `Arc<RwLock<...>>` for interior mutability. Safe for concurrent
/// reads, exclusive writes; all operations are synchronous and CPU-bound.
///
/// # Examples
///
/// ```
/// use contextual_ranker::ranker::{BayesianRanker, Feature};
///
/// let ranker = BayesianRanker::new(1000);
/// ranker.learn("Star", &[Feature::token("galaxy"), Feature::token("bright")])?;
/// ranker.learn("Planet", &[Feature::token("orbit"), Feature::token("rocky")])?;
///
/// let best = ranker.classify(&[Feature::token("galaxy")]).unwrap();
/// assert_eq!(best.category(), "Star");
/// # Ok::<(), contextual_ranker::ranker::RankerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BayesianRanker {
    inner: Arc<RwLock<RankerInner>>,
}

#[derive(Debug)]
pub(crate) struct RankerInner {
    /// Per-feature, per-category observation counts.
    pub(crate) feature_counts: FxHashMap<Feature, FxHashMap<Category, u64>>,
    /// Per-category training example counts.
    pub(crate) category_counts: FxHashMap<Category, u64>,
    /// FIFO of retained training examples, oldest first.
    pub(crate) history: VecDeque<(Category, Vec<Feature>)>,
    pub(crate) memory_capacity: usize,
    pub(crate) weights: FeatureWeights,
    cache: Option<CachedDistribution>,
    recomputes: u64,
}

#[derive(Debug)]
struct CachedDistribution {
    fingerprint: u64,
    distribution: Arc<[Classification]>,
}

/// Order-insensitive fingerprint of a feature collection.
///
/// Summing per-feature hashes keeps the fingerprint stable under
/// reordering while remaining sensitive to the multiset of features.
fn fingerprint(features: &[Feature]) -> u64 {
    let mut acc = features.len() as u64;
    for feature in features {
        let mut hasher = FxHasher::default();
        feature.hash(&mut hasher);
        acc = acc.wrapping_add(hasher.finish());
    }
    acc
}

impl BayesianRanker {
    /// Create a ranker with the given memory capacity and default weights.
    pub fn new(memory_capacity: usize) -> Self {
        Self::with_weights(memory_capacity, FeatureWeights::default())
    }

    /// Create a ranker with an explicit smoothing weight table.
    pub fn with_weights(memory_capacity: usize, weights: FeatureWeights) -> Self {
        BayesianRanker {
            inner: Arc::new(RwLock::new(RankerInner {
                feature_counts: FxHashMap::default(),
                category_counts: FxHashMap::default(),
                history: VecDeque::new(),
                memory_capacity,
                weights,
                cache: None,
                recomputes: 0,
            })),
        }
    }

    /// Learn one training example: the user accepted `category` while the
    /// context showed `features`.
    ///
    /// Rejects an empty category with no partial mutation. When the
    /// history exceeds the memory capacity the oldest example is evicted
    /// and its counts undone before this call returns.
    pub fn learn(&self, category: &str, features: &[Feature]) -> Result<()> {
        if category.is_empty() {
            return Err(RankerError::EmptyCategory);
        }
        let mut inner = self.inner.write();
        inner.admit(category.to_string(), features.to_vec());
        inner.cache = None;
        Ok(())
    }

    /// Update the bound on retained training examples.
    ///
    /// Evicts immediately down to the new bound (oldest first); the
    /// history never exceeds the capacity once this call returns.
    pub fn set_memory_capacity(&self, capacity: usize) {
        let mut inner = self.inner.write();
        inner.memory_capacity = capacity;
        while inner.history.len() > capacity {
            inner.evict_oldest();
        }
        inner.cache = None;
    }

    /// The bound on retained training examples.
    pub fn memory_capacity(&self) -> usize {
        self.inner.read().memory_capacity
    }

    /// Number of currently retained training examples.
    pub fn total_learned(&self) -> usize {
        self.inner.read().history.len()
    }

    /// Number of retained examples labeled with `category`.
    pub fn category_count(&self, category: &str) -> u64 {
        self.inner
            .read()
            .category_counts
            .get(category)
            .copied()
            .unwrap_or(0)
    }

    /// All categories with at least one retained example.
    pub fn categories(&self) -> Vec<Category> {
        self.inner.read().category_counts.keys().cloned().collect()
    }

    /// `P(feature | category)`: the observed rate of the feature among
    /// examples of the category, `0.0` for an unknown category.
    pub fn feature_probability(&self, feature: &Feature, category: &str) -> f64 {
        self.inner.read().feature_probability(feature, category)
    }

    /// The smoothed feature probability used for ranking.
    ///
    /// Blends a neutral prior of `0.5` with the observed rate, weighted by
    /// the total number of times the feature has been seen across all
    /// categories and the per-kind smoothing weight.
    pub fn feature_weighed_average(&self, feature: &Feature, category: &str) -> f64 {
        self.inner.read().feature_weighed_average(feature, category)
    }

    /// `P(category) * PROD(weighedAverage(feature | category))`.
    pub fn category_probability(&self, features: &[Feature], category: &str) -> f64 {
        self.inner.read().category_probability(features, category)
    }

    /// Score `features` against every known category.
    ///
    /// The distribution is sorted by descending probability with ties
    /// between distinct categories broken by the category string, so the
    /// ranking is a strict total order and reproducible. A ranker with no
    /// learned categories yields an empty distribution.
    pub fn classify_detailed(&self, features: &[Feature]) -> DetailedClassification {
        let fingerprint = fingerprint(features);
        let mut inner = self.inner.write();

        if let Some(cache) = &inner.cache {
            if cache.fingerprint == fingerprint {
                return DetailedClassification::new(
                    features.to_vec(),
                    Arc::clone(&cache.distribution),
                );
            }
        }

        let distribution: Arc<[Classification]> = inner.distribution_for(features).into();
        inner.recomputes += 1;
        inner.cache = Some(CachedDistribution {
            fingerprint,
            distribution: Arc::clone(&distribution),
        });
        DetailedClassification::new(features.to_vec(), distribution)
    }

    /// The top-ranked classification, `None` when no category is known.
    pub fn classify(&self, features: &[Feature]) -> Option<Classification> {
        self.classify_detailed(features).best().cloned()
    }

    /// Number of full distribution recomputations performed so far.
    ///
    /// Cache hits do not recompute; this counter makes the caching
    /// discipline observable for evaluation and tests.
    pub fn recompute_count(&self) -> u64 {
        self.inner.read().recomputes
    }

    #[cfg(feature = "serialization")]
    pub(crate) fn read_inner(&self) -> parking_lot::RwLockReadGuard<'_, RankerInner> {
        self.inner.read()
    }
}

impl RankerInner {
    fn admit(&mut self, category: Category, features: Vec<Feature>) {
        for feature in &features {
            *self
                .feature_counts
                .entry(feature.clone())
                .or_default()
                .entry(category.clone())
                .or_insert(0) += 1;
        }
        *self.category_counts.entry(category.clone()).or_insert(0) += 1;
        self.history.push_back((category, features));

        while self.history.len() > self.memory_capacity {
            self.evict_oldest();
        }
    }

    /// Pop the oldest example and undo its counts symmetrically.
    fn evict_oldest(&mut self) {
        let Some((category, features)) = self.history.pop_front() else {
            return;
        };
        for feature in &features {
            if let Some(per_category) = self.feature_counts.get_mut(feature) {
                if let Some(count) = per_category.get_mut(&category) {
                    *count -= 1;
                    if *count == 0 {
                        per_category.remove(&category);
                    }
                }
                if per_category.is_empty() {
                    self.feature_counts.remove(feature);
                }
            }
        }
        if let Some(count) = self.category_counts.get_mut(&category) {
            *count -= 1;
            if *count == 0 {
                self.category_counts.remove(&category);
            }
        }
    }

    fn feature_count(&self, feature: &Feature, category: &str) -> u64 {
        self.feature_counts
            .get(feature)
            .and_then(|per_category| per_category.get(category))
            .copied()
            .unwrap_or(0)
    }

    fn feature_total(&self, feature: &Feature) -> u64 {
        self.feature_counts
            .get(feature)
            .map(|per_category| per_category.values().sum())
            .unwrap_or(0)
    }

    fn feature_probability(&self, feature: &Feature, category: &str) -> f64 {
        let category_total = self.category_counts.get(category).copied().unwrap_or(0);
        if category_total == 0 {
            return 0.0;
        }
        self.feature_count(feature, category) as f64 / category_total as f64
    }

    fn feature_weighed_average(&self, feature: &Feature, category: &str) -> f64 {
        let weight = self.weights.weight(feature.kind());
        let total = self.feature_total(feature) as f64;
        let raw = self.feature_probability(feature, category);
        (weight * 0.5 + total * raw) / (weight + total)
    }

    fn category_probability(&self, features: &[Feature], category: &str) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let prior = self.category_counts.get(category).copied().unwrap_or(0) as f64
            / self.history.len() as f64;
        features.iter().fold(prior, |product, feature| {
            product * self.feature_weighed_average(feature, category)
        })
    }

    fn distribution_for(&self, features: &[Feature]) -> Vec<Classification> {
        let mut entries: Vec<Classification> = self
            .category_counts
            .keys()
            .map(|category| {
                Classification::new(
                    category.clone(),
                    self.category_probability(features, category),
                )
            })
            .collect();
        entries.sort_by(|a, b| {
            b.probability()
                .total_cmp(&a.probability())
                .then_with(|| a.category().cmp(b.category()))
        });
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<Feature> {
        values.iter().map(|value| Feature::token(*value)).collect()
    }

    #[test]
    fn test_learn_rejects_empty_category() {
        let ranker = BayesianRanker::new(10);
        let err = ranker.learn("", &tokens(&["galaxy"])).unwrap_err();
        assert_eq!(err, RankerError::EmptyCategory);
        assert_eq!(ranker.total_learned(), 0);
    }

    #[test]
    fn test_learn_updates_counts() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy", "bright"])).unwrap();
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();

        assert_eq!(ranker.total_learned(), 2);
        assert_eq!(ranker.category_count("Star"), 2);
        assert_eq!(ranker.category_count("Planet"), 0);
        assert_eq!(
            ranker.feature_probability(&Feature::token("galaxy"), "Star"),
            1.0
        );
        assert_eq!(
            ranker.feature_probability(&Feature::token("bright"), "Star"),
            0.5
        );
    }

    #[test]
    fn test_feature_probability_unknown_category_is_zero() {
        let ranker = BayesianRanker::new(10);
        assert_eq!(
            ranker.feature_probability(&Feature::token("galaxy"), "Star"),
            0.0
        );
    }

    #[test]
    fn test_weighed_average_of_unseen_feature_is_neutral() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();
        // total = 0 for an unseen feature: (w * 0.5 + 0) / (w + 0) = 0.5
        assert_eq!(
            ranker.feature_weighed_average(&Feature::token("nebula"), "Star"),
            0.5
        );
    }

    #[test]
    fn test_weighed_average_damps_rare_features() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();
        // Seen once, always with Star: (1.0 * 0.5 + 1 * 1.0) / (1.0 + 1) = 0.75
        assert_eq!(
            ranker.feature_weighed_average(&Feature::token("galaxy"), "Star"),
            0.75
        );
    }

    #[test]
    fn test_classify_empty_ranker() {
        let ranker = BayesianRanker::new(10);
        assert!(ranker.classify(&tokens(&["galaxy"])).is_none());
        assert!(ranker.classify_detailed(&tokens(&["galaxy"])).is_empty());
    }

    #[test]
    fn test_classify_returns_trained_category() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy", "bright"])).unwrap();

        let best = ranker.classify(&tokens(&["galaxy", "bright"])).unwrap();
        assert_eq!(best.category(), "Star");
        assert!(best.probability() > 0.0);
    }

    #[test]
    fn test_distribution_strict_total_order_on_ties() {
        let ranker = BayesianRanker::new(10);
        // Symmetric training: both categories end up with equal probability.
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();
        ranker.learn("Planet", &tokens(&["orbit"])).unwrap();

        let detailed = ranker.classify_detailed(&tokens(&["comet"]));
        assert_eq!(detailed.len(), 2);
        assert_eq!(
            detailed.probability_for("Star"),
            detailed.probability_for("Planet")
        );
        // Ties break by category string; both slots survive.
        assert_eq!(detailed.position_for("Planet"), Some(1));
        assert_eq!(detailed.position_for("Star"), Some(2));
    }

    #[test]
    fn test_memory_capacity_evicts_oldest() {
        let ranker = BayesianRanker::new(2);
        ranker.learn("A", &tokens(&["a"])).unwrap();
        ranker.learn("B", &tokens(&["b"])).unwrap();
        ranker.learn("C", &tokens(&["c"])).unwrap();

        assert_eq!(ranker.total_learned(), 2);
        assert_eq!(ranker.category_count("A"), 0);
        assert_eq!(ranker.category_count("B"), 1);
        assert_eq!(ranker.category_count("C"), 1);
        // The evicted example no longer affects any probability.
        assert_eq!(ranker.feature_probability(&Feature::token("a"), "A"), 0.0);
        let categories = ranker.categories();
        assert!(!categories.contains(&"A".to_string()));
    }

    #[test]
    fn test_set_memory_capacity_evicts_immediately() {
        let ranker = BayesianRanker::new(10);
        for i in 0..5 {
            ranker.learn(&format!("C{i}"), &tokens(&["t"])).unwrap();
        }
        ranker.set_memory_capacity(2);

        assert_eq!(ranker.memory_capacity(), 2);
        assert_eq!(ranker.total_learned(), 2);
        assert_eq!(ranker.category_count("C0"), 0);
        assert_eq!(ranker.category_count("C4"), 1);
    }

    #[test]
    fn test_capacity_zero_retains_nothing() {
        let ranker = BayesianRanker::new(0);
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();
        assert_eq!(ranker.total_learned(), 0);
        assert!(ranker.categories().is_empty());
    }

    #[test]
    fn test_cache_one_recompute_per_mutation() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();

        let features = tokens(&["galaxy"]);
        ranker.classify_detailed(&features);
        assert_eq!(ranker.recompute_count(), 1);
        ranker.classify_detailed(&features);
        assert_eq!(ranker.recompute_count(), 1);

        ranker.learn("Planet", &tokens(&["orbit"])).unwrap();
        ranker.classify_detailed(&features);
        assert_eq!(ranker.recompute_count(), 2);
    }

    #[test]
    fn test_cache_keyed_by_featureset() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();
        ranker.learn("Planet", &tokens(&["orbit"])).unwrap();

        let star_view = ranker.classify_detailed(&tokens(&["galaxy", "bright"]));
        assert_eq!(ranker.recompute_count(), 1);

        // Ordering within the featureset does not defeat the cache.
        ranker.classify_detailed(&tokens(&["bright", "galaxy"]));
        assert_eq!(ranker.recompute_count(), 1);

        // A different featureset replaces the slot instead of returning
        // the stale distribution.
        let planet_view = ranker.classify_detailed(&tokens(&["orbit"]));
        assert_eq!(ranker.recompute_count(), 2);
        assert_eq!(star_view.position_for("Star"), Some(1));
        assert_eq!(planet_view.position_for("Planet"), Some(1));
    }

    #[test]
    fn test_set_memory_capacity_invalidates_cache() {
        let ranker = BayesianRanker::new(10);
        ranker.learn("Star", &tokens(&["galaxy"])).unwrap();

        let features = tokens(&["galaxy"]);
        ranker.classify_detailed(&features);
        ranker.set_memory_capacity(10);
        ranker.classify_detailed(&features);
        assert_eq!(ranker.recompute_count(), 2);
    }

    #[test]
    fn test_fingerprint_order_insensitive() {
        let a = fingerprint(&tokens(&["galaxy", "bright"]));
        let b = fingerprint(&tokens(&["bright", "galaxy"]));
        let c = fingerprint(&tokens(&["bright"]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
