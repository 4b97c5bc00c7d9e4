//! Contextual relevance ranking via online naive Bayes.
//!
//! This module provides the learning half of the engine: [`Feature`]s
//! extracted from the text around the edit point are associated with the
//! identifiers the user accepts, and [`BayesianRanker`] scores future
//! featuresets against every identifier learned so far.

mod classification;
mod classifier;
pub mod error;
mod feature;

pub use classification::{Classification, DetailedClassification};
pub use classifier::BayesianRanker;
pub use error::{RankerError, Result};
pub use feature::{Feature, FeatureKind, FeatureWeights, DEFAULT_FEATURE_WEIGHT};

/// A classification label: the full identifier of a candidate.
///
/// The ranker never inspects category contents; labels have string
/// identity only.
pub type Category = String;
