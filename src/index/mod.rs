//! Prefix lookup over candidate entities.
//!
//! This module provides [`PrefixIndex`], a character trie that maps the
//! normalized key of each registered entity to the entity itself and
//! supports fast prefix enumeration for autocompletion.

mod prefix_trie;

pub use prefix_trie::PrefixIndex;
