//! Character trie over candidate entities.

use crate::entity::{Entity, EntityRef};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// A character trie indexing entities by their normalized key.
///
/// Each edge is labeled with one character of an entity's key (the
/// lower-cased short identifier, see [`Entity::key`]); walking a key down
/// from the root lands on the single node whose value set holds the entity.
/// The empty key is legal and lives in the root's own value set.
///
/// # Compaction
///
/// [`remove`](PrefixIndex::remove) splices away the chain of nodes left
/// behind by the removed entity, up to the nearest ancestor that still
/// holds values or other branches, so churn never accumulates dead chains.
///
/// # Thread Safety
///
/// Uses `Arc<RwLock<...>>` for interior mutability. Safe for concurrent
/// reads, exclusive writes. Bulk loads should issue individual `add` calls
/// rather than holding an external lock across the whole import.
///
/// # Examples
///
/// ```
/// use contextual_ranker::entity::{EntityInterner, EntityKind};
/// use contextual_ranker::index::PrefixIndex;
///
/// let mut interner = EntityInterner::new();
/// let star = interner.intern("astro#Star", EntityKind::Class);
/// let cluster = interner.intern("astro#StarCluster", EntityKind::Class);
///
/// let index = PrefixIndex::new();
/// index.add(star);
/// index.add(cluster);
///
/// assert_eq!(index.postfixes_of("star").len(), 2);
/// assert_eq!(index.postfixes_of("starc").len(), 1);
/// assert!(index.postfixes_of("planet").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    inner: Arc<RwLock<IndexInner>>,
}

#[derive(Debug, Default)]
struct IndexInner {
    root: TrieNode,
    len: usize,
}

#[derive(Debug, Default)]
struct TrieNode {
    // Sorted by label; SmallVec keeps nodes with few children allocation-free
    children: SmallVec<[(char, Box<TrieNode>); 4]>,
    values: FxHashSet<EntityRef>,
}

impl TrieNode {
    fn is_dead(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }

    fn child(&self, label: char) -> Option<&TrieNode> {
        self.children
            .binary_search_by_key(&label, |(l, _)| *l)
            .ok()
            .map(|i| self.children[i].1.as_ref())
    }

    /// Walk/create the child for `label`, keeping the edge list sorted.
    fn child_or_insert(&mut self, label: char) -> &mut TrieNode {
        let index = match self.children.binary_search_by_key(&label, |(l, _)| *l) {
            Ok(i) => i,
            Err(i) => {
                self.children.insert(i, (label, Box::default()));
                i
            }
        };
        self.children[index].1.as_mut()
    }

    fn collect_into(&self, out: &mut Vec<EntityRef>) {
        out.extend(self.values.iter().cloned());
        for (_, child) in &self.children {
            child.collect_into(out);
        }
    }

    fn count_nodes(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|(_, child)| child.count_nodes())
            .sum::<usize>()
    }

    /// Remove `entity` under `key`, pruning dead descendants on the way
    /// back up. Returns `(removed, this node is now dead)`.
    fn remove_under(&mut self, key: &[char], entity: &Entity) -> (bool, bool) {
        match key.split_first() {
            None => {
                let removed = self.values.remove(entity);
                (removed, removed && self.is_dead())
            }
            Some((&label, rest)) => {
                let Ok(index) = self.children.binary_search_by_key(&label, |(l, _)| *l) else {
                    return (false, false);
                };
                let (removed, child_dead) = self.children[index].1.remove_under(rest, entity);
                if child_dead {
                    self.children.remove(index);
                }
                (removed, removed && self.is_dead())
            }
        }
    }
}

impl PrefixIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index from an iterator of entity handles.
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = EntityRef>,
    {
        let index = Self::new();
        for entity in entities {
            index.add(entity);
        }
        index
    }

    /// Register an entity under its normalized key.
    ///
    /// Returns `true` if the entity was newly inserted, `false` if an equal
    /// entity was already present. O(key length).
    pub fn add(&self, entity: EntityRef) -> bool {
        let key = entity.key();
        let mut inner = self.inner.write();

        let mut node = &mut inner.root;
        for label in key.chars() {
            node = node.child_or_insert(label);
        }
        let inserted = node.values.insert(entity);
        if inserted {
            inner.len += 1;
        }
        inserted
    }

    /// Unregister an entity.
    ///
    /// Returns `false` when the entity's key path does not exist or the
    /// terminal node does not hold the entity. On success the entity is
    /// removed and every ancestor left both childless and valueless is
    /// spliced away, stopping at the first ancestor that is still valued
    /// or branching. O(key length).
    pub fn remove(&self, entity: &Entity) -> bool {
        let key: Vec<char> = entity.key().chars().collect();
        let mut inner = self.inner.write();

        let (removed, _) = inner.root.remove_under(&key, entity);
        if removed {
            inner.len -= 1;
        }
        removed
    }

    /// Membership test. O(key length).
    pub fn contains(&self, entity: &Entity) -> bool {
        let key = entity.key();
        let inner = self.inner.read();

        let mut node = &inner.root;
        for label in key.chars() {
            match node.child(label) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.values.contains(entity)
    }

    /// All indexed entities, via a full traversal.
    pub fn postfixes(&self) -> Vec<EntityRef> {
        let inner = self.inner.read();
        let mut out = Vec::with_capacity(inner.len);
        inner.root.collect_into(&mut out);
        out
    }

    /// All indexed entities whose normalized key starts with `prefix`.
    ///
    /// The prefix is case-folded before the walk. An unmatched prefix
    /// yields an empty result, not an error. O(prefix length + subtree).
    pub fn postfixes_of(&self, prefix: &str) -> Vec<EntityRef> {
        let prefix = prefix.to_lowercase();
        let inner = self.inner.read();

        let mut node = &inner.root;
        for label in prefix.chars() {
            match node.child(label) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut out = Vec::new();
        node.collect_into(&mut out);
        out
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    /// `true` if no entity is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of trie nodes, root included.
    ///
    /// After removals this stays minimal: a trie holding the same entities
    /// built from scratch has the same node count.
    pub fn node_count(&self) -> usize {
        self.inner.read().root.count_nodes()
    }

    /// Empty the index.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.root = TrieNode::default();
        inner.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn entity(id: &str) -> EntityRef {
        Arc::new(Entity::new(id, EntityKind::Class))
    }

    #[test]
    fn test_add_then_contains() {
        let index = PrefixIndex::new();
        let star = entity("astro#Star");
        assert!(index.add(Arc::clone(&star)));
        assert!(index.contains(&star));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_add_is_idempotent() {
        let index = PrefixIndex::new();
        let star = entity("astro#Star");
        assert!(index.add(Arc::clone(&star)));
        assert!(!index.add(Arc::clone(&star)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_then_contains() {
        let index = PrefixIndex::new();
        let star = entity("astro#Star");
        index.add(Arc::clone(&star));

        assert!(index.remove(&star));
        assert!(!index.contains(&star));
        assert!(!index.remove(&star));
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_remove_missing_path() {
        let index = PrefixIndex::new();
        index.add(entity("astro#Star"));
        assert!(!index.remove(&entity("astro#Planet")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_prunes_dead_chain() {
        let index = PrefixIndex::new();
        let star = entity("astro#Star");
        let cluster = entity("astro#StarCluster");
        index.add(Arc::clone(&star));
        index.add(Arc::clone(&cluster));

        // root + s,t,a,r + c,l,u,s,t,e,r
        assert_eq!(index.node_count(), 12);

        assert!(index.remove(&cluster));
        // The "cluster" suffix chain is spliced away, "star" survives.
        assert_eq!(index.node_count(), 5);
        assert!(index.contains(&star));
    }

    #[test]
    fn test_remove_keeps_shared_prefix() {
        let index = PrefixIndex::new();
        let star = entity("astro#Star");
        let cluster = entity("astro#StarCluster");
        index.add(Arc::clone(&star));
        index.add(Arc::clone(&cluster));

        assert!(index.remove(&star));
        assert!(index.contains(&cluster));
        // All nodes are still on the path to "starcluster".
        assert_eq!(index.node_count(), 12);
    }

    #[test]
    fn test_distinct_entities_share_key_node() {
        let index = PrefixIndex::new();
        let class = Arc::new(Entity::new("astro#Star", EntityKind::Class));
        let individual = Arc::new(Entity::new("astro#Star", EntityKind::NamedIndividual));
        assert!(index.add(Arc::clone(&class)));
        assert!(index.add(Arc::clone(&individual)));
        assert_eq!(index.len(), 2);

        assert!(index.remove(&class));
        assert!(index.contains(&individual));
        // Node chain survives while the sibling value remains.
        assert_eq!(index.node_count(), 5);
    }

    #[test]
    fn test_postfixes_of_prefix() {
        let index = PrefixIndex::new();
        index.add(entity("astro#Star"));
        index.add(entity("astro#StarCluster"));
        index.add(entity("astro#Planet"));

        let star_matches = index.postfixes_of("star");
        assert_eq!(star_matches.len(), 2);

        let starc_matches = index.postfixes_of("starc");
        assert_eq!(starc_matches.len(), 1);
        assert_eq!(starc_matches[0].short_id(), "StarCluster");

        assert!(index.postfixes_of("x").is_empty());
    }

    #[test]
    fn test_postfixes_of_case_folds_prefix() {
        let index = PrefixIndex::new();
        index.add(entity("astro#Star"));
        assert_eq!(index.postfixes_of("STAR").len(), 1);
    }

    #[test]
    fn test_postfixes_returns_everything() {
        let index = PrefixIndex::new();
        index.add(entity("astro#Star"));
        index.add(entity("astro#Planet"));
        index.add(entity("astro#Comet"));
        assert_eq!(index.postfixes().len(), 3);
    }

    #[test]
    fn test_empty_key_lives_in_root() {
        let index = PrefixIndex::new();
        let empty = entity("astro#");
        assert_eq!(empty.key(), "");

        assert!(index.add(Arc::clone(&empty)));
        assert!(index.contains(&empty));
        assert_eq!(index.node_count(), 1);
        assert_eq!(index.postfixes_of("").len(), 1);

        assert!(index.remove(&empty));
        assert!(!index.contains(&empty));
    }

    #[test]
    fn test_clear() {
        let index = PrefixIndex::new();
        index.add(entity("astro#Star"));
        index.add(entity("astro#Planet"));
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.node_count(), 1);
        assert!(index.postfixes().is_empty());
    }

    #[test]
    fn test_from_entities() {
        let index =
            PrefixIndex::from_entities(vec![entity("astro#Star"), entity("astro#Planet")]);
        assert_eq!(index.len(), 2);
    }
}
