//! # contextual-ranker
//!
//! Contextual autocomplete ranking: a character-trie candidate index and
//! an online naive Bayes classifier that scores candidates against the
//! features of the text surrounding the edit point.
//!
//! The engine is editor-agnostic. An orchestrator registers candidate
//! entities with a [`PrefixIndex`](index::PrefixIndex) as they become
//! known, feeds accepted completions to a
//! [`BayesianRanker`](ranker::BayesianRanker) as training signal, and on
//! each completion request combines the index's prefix matches with the
//! ranker's per-category scores. The merge into a displayable list is the
//! orchestrator's job, not the engine's.
//!
//! ## Example
//!
//! ```rust
//! use contextual_ranker::prelude::*;
//!
//! let mut interner = EntityInterner::new();
//! let star = interner.intern("astro#Star", EntityKind::Class);
//! let cluster = interner.intern("astro#StarCluster", EntityKind::Class);
//!
//! let index = PrefixIndex::new();
//! index.add(star.clone());
//! index.add(cluster.clone());
//!
//! let ranker = BayesianRanker::new(1000);
//! ranker.learn(star.id(), &[Feature::token("galaxy")])?;
//!
//! // Candidates for the prefix the user typed...
//! let candidates = index.postfixes_of("star");
//! assert_eq!(candidates.len(), 2);
//!
//! // ...scored against the current context.
//! let scores = ranker.classify_detailed(&[Feature::token("galaxy")]);
//! assert!(scores.probability_for(star.id()) > scores.probability_for(cluster.id()));
//! # Ok::<(), contextual_ranker::ranker::RankerError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod entity;
pub mod index;
pub mod ranker;

/// Versioned export/import of learned classifier state
#[cfg(feature = "serialization")]
pub mod serialization;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::context::{extract_features, DEFAULT_TOKENS_AFTER, DEFAULT_TOKENS_BEFORE};
    pub use crate::entity::{Entity, EntityInterner, EntityKind, EntityRef};
    pub use crate::index::PrefixIndex;
    pub use crate::ranker::{
        BayesianRanker, Category, Classification, DetailedClassification, Feature, FeatureKind,
        FeatureWeights, RankerError,
    };

    #[cfg(feature = "serialization")]
    pub use crate::serialization::{RankerSnapshot, SnapshotError, SNAPSHOT_VERSION};
}
