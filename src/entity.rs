//! Candidate entity model and identity interning.
//!
//! An [`Entity`] is a candidate completion identifier: a full identifier
//! (e.g. an IRI), a short identifier derived from it, and a type tag.
//! Entities are shared between the prefix index and any orchestrating code
//! as cheap [`EntityRef`] handles produced by an [`EntityInterner`].

use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared handle to an interned [`Entity`].
pub type EntityRef = Arc<Entity>;

/// The type tag of a candidate entity.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum EntityKind {
    /// A class definition.
    Class,
    /// A named individual.
    NamedIndividual,
    /// A data property.
    DataProperty,
    /// A data type.
    DataType,
    /// An object property.
    ObjectProperty,
    /// An annotation property.
    AnnotationProperty,
    /// A whole ontology / knowledge base.
    Ontology,
    /// Anything else.
    Other,
}

/// A candidate completion identifier.
///
/// Holds the full identifier used as a classification category, the short
/// identifier shown to users, and the entity's type tag. The short
/// identifier is derived at construction: the fragment after the last `'#'`
/// of the full identifier, or the full identifier when it has no fragment.
///
/// Equality and hashing consider `(id, kind)` only.
///
/// # Examples
///
/// ```
/// use contextual_ranker::entity::{Entity, EntityKind};
///
/// let entity = Entity::new("http://example.org/astro#Star", EntityKind::Class);
/// assert_eq!(entity.short_id(), "Star");
/// assert_eq!(entity.key(), "star");
///
/// let plain = Entity::new("Comet", EntityKind::Class);
/// assert_eq!(plain.short_id(), "Comet");
/// ```
#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    short_id: String,
    kind: EntityKind,
}

impl Entity {
    /// Create an entity from its full identifier and type tag.
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        let id = id.into();
        let short_id = match id.rsplit_once('#') {
            Some((_, fragment)) => fragment.to_string(),
            None => id.clone(),
        };
        Entity { id, short_id, kind }
    }

    /// The full identifier (the classification category label).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The short identifier.
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// The normalization key: the lower-cased short identifier.
    ///
    /// This is the key under which the entity is reachable in a
    /// [`PrefixIndex`](crate::index::PrefixIndex).
    pub fn key(&self) -> String {
        self.short_id.to_lowercase()
    }

    /// The entity's type tag.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Check the entity's type tag.
    pub fn is_kind(&self, kind: EntityKind) -> bool {
        self.kind == kind
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.kind.hash(state);
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_id)
    }
}

/// Identity-interning map for entities.
///
/// Deduplicates [`Entity`] instances by full identifier so that the index,
/// the classifier's categories, and the orchestrator all share one handle
/// per entity. The interner is owned by whoever orchestrates the engine and
/// passed by reference; it is deliberately not a process-wide singleton.
///
/// # Examples
///
/// ```
/// use contextual_ranker::entity::{EntityInterner, EntityKind};
///
/// let mut interner = EntityInterner::new();
/// let a = interner.intern("http://example.org#Star", EntityKind::Class);
/// let b = interner.intern("http://example.org#Star", EntityKind::Class);
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(interner.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct EntityInterner {
    entities: FxHashMap<String, EntityRef>,
}

impl EntityInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or create the shared handle for the given identifier.
    ///
    /// The `kind` is only consulted when the identifier is seen for the
    /// first time; later calls return the existing handle unchanged.
    pub fn intern(&mut self, id: &str, kind: EntityKind) -> EntityRef {
        if let Some(existing) = self.entities.get(id) {
            return Arc::clone(existing);
        }
        let entity = Arc::new(Entity::new(id, kind));
        self.entities.insert(id.to_string(), Arc::clone(&entity));
        entity
    }

    /// Retrieve the handle for an already-interned identifier.
    pub fn get(&self, id: &str) -> Option<EntityRef> {
        self.entities.get(id).cloned()
    }

    /// Number of interned entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop all interned handles.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
