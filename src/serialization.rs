//! Versioned export/import of learned ranker state.
//!
//! The persisted format is an explicit count dump rather than an opaque
//! object graph: a version tag, the memory capacity, the retained training
//! history, and the per-category and per-feature-per-category counts. The
//! counts are derivable from the history; both are written so the format
//! is self-describing and checkable across implementations and language
//! boundaries. The storage mechanism (file, database, ...) stays with the
//! caller.
//!
//! # Example
//!
//! ```
//! use contextual_ranker::ranker::{BayesianRanker, Feature, FeatureWeights};
//! use contextual_ranker::serialization::RankerSnapshot;
//!
//! let ranker = BayesianRanker::new(100);
//! ranker.learn("Star", &[Feature::token("galaxy")]).unwrap();
//!
//! let mut buffer = Vec::new();
//! ranker.export().to_json_writer(&mut buffer).unwrap();
//!
//! let snapshot = RankerSnapshot::from_json_reader(&buffer[..]).unwrap();
//! let restored = BayesianRanker::import(&snapshot, FeatureWeights::default()).unwrap();
//! assert_eq!(restored.category_count("Star"), 1);
//! ```

use crate::ranker::{BayesianRanker, Category, Feature, FeatureWeights, RankerError};
use rustc_hash::FxHashMap;
use std::io::{Read, Write};
use thiserror::Error;

/// The snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur during snapshot export/import.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot carries a version this crate does not understand.
    #[error("Unsupported snapshot version {0} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion(u32),

    /// The explicit counts disagree with the training history.
    #[error("Snapshot counts are inconsistent with its history")]
    InconsistentCounts,

    /// The history exceeds the snapshot's own memory capacity.
    #[error("Snapshot history ({len} examples) exceeds its capacity ({capacity})")]
    CapacityExceeded {
        /// Number of history entries in the snapshot.
        len: usize,
        /// The snapshot's memory capacity.
        capacity: usize,
    },

    /// A history entry is not a valid training example.
    #[error("Invalid snapshot example")]
    InvalidExample(#[from] RankerError),

    /// Error during JSON encoding/decoding.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Error during bincode encoding/decoding.
    #[error("Bincode error")]
    Bincode(#[from] bincode::Error),

    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// One retained training example.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotExample {
    /// The accepted identifier.
    pub category: Category,
    /// The features observed at acceptance time.
    pub features: Vec<Feature>,
}

/// The complete learned state of a [`BayesianRanker`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankerSnapshot {
    /// Format version, see [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Bound on retained training examples.
    pub memory_capacity: usize,
    /// Retained examples, oldest first.
    pub history: Vec<SnapshotExample>,
    /// Per-category example counts, sorted by category.
    pub category_counts: Vec<(Category, u64)>,
    /// Per-feature-per-category observation counts, sorted by
    /// (feature, category).
    pub feature_counts: Vec<(Feature, Category, u64)>,
}

impl RankerSnapshot {
    /// Write the snapshot as JSON.
    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read a snapshot from JSON.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the snapshot as bincode.
    pub fn to_bincode_writer<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Read a snapshot from bincode.
    pub fn from_bincode_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize_from(reader)?)
    }

    fn counts_from_history(
        &self,
    ) -> (FxHashMap<&str, u64>, FxHashMap<(&Feature, &str), u64>) {
        let mut categories: FxHashMap<&str, u64> = FxHashMap::default();
        let mut features: FxHashMap<(&Feature, &str), u64> = FxHashMap::default();
        for example in &self.history {
            *categories.entry(example.category.as_str()).or_insert(0) += 1;
            for feature in &example.features {
                *features
                    .entry((feature, example.category.as_str()))
                    .or_insert(0) += 1;
            }
        }
        (categories, features)
    }

    /// Check the explicit counts against the history.
    fn validate_counts(&self) -> Result<(), SnapshotError> {
        let (categories, features) = self.counts_from_history();

        if self.category_counts.len() != categories.len()
            || self.feature_counts.len() != features.len()
        {
            return Err(SnapshotError::InconsistentCounts);
        }
        for (category, count) in &self.category_counts {
            if categories.get(category.as_str()) != Some(count) {
                return Err(SnapshotError::InconsistentCounts);
            }
        }
        for (feature, category, count) in &self.feature_counts {
            if features.get(&(feature, category.as_str())) != Some(count) {
                return Err(SnapshotError::InconsistentCounts);
            }
        }
        Ok(())
    }
}

impl BayesianRanker {
    /// Dump the complete learned state as a versioned snapshot.
    pub fn export(&self) -> RankerSnapshot {
        let inner = self.read_inner();

        let history = inner
            .history
            .iter()
            .map(|(category, features)| SnapshotExample {
                category: category.clone(),
                features: features.clone(),
            })
            .collect();

        let mut category_counts: Vec<(Category, u64)> = inner
            .category_counts
            .iter()
            .map(|(category, count)| (category.clone(), *count))
            .collect();
        category_counts.sort();

        let mut feature_counts: Vec<(Feature, Category, u64)> = inner
            .feature_counts
            .iter()
            .flat_map(|(feature, per_category)| {
                per_category
                    .iter()
                    .map(|(category, count)| (feature.clone(), category.clone(), *count))
            })
            .collect();
        feature_counts.sort();

        RankerSnapshot {
            version: SNAPSHOT_VERSION,
            memory_capacity: inner.memory_capacity,
            history,
            category_counts,
            feature_counts,
        }
    }

    /// Restore a ranker from a snapshot.
    ///
    /// Rejects unknown versions, a history longer than the snapshot's own
    /// capacity, and counts that disagree with the history. Smoothing
    /// weights are configuration, not learned state, so they are supplied
    /// by the caller.
    pub fn import(
        snapshot: &RankerSnapshot,
        weights: FeatureWeights,
    ) -> Result<BayesianRanker, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        if snapshot.history.len() > snapshot.memory_capacity {
            return Err(SnapshotError::CapacityExceeded {
                len: snapshot.history.len(),
                capacity: snapshot.memory_capacity,
            });
        }
        snapshot.validate_counts()?;

        let ranker = BayesianRanker::with_weights(snapshot.memory_capacity, weights);
        for example in &snapshot.history {
            ranker.learn(&example.category, &example.features)?;
        }
        Ok(ranker)
    }
}
