//! Identity resolution: external key → previously minted node.
//!
//! Tabular inputs name elements by one of two keys: the model GlobalId
//! (primary) or the Navisworks ObjectId/SyncID (fallback). Each key kind has
//! its own predicate and its own cache, so a hit under one kind is never
//! returned for the other. Misses are cached too; injectors never mint nodes
//! carrying either key, so a miss stays a miss for the life of the cache.

use std::collections::HashMap;

use crate::graph::{Iri, Literal, Term, TripleGraph};
use crate::vocab::{bim, navis};

/// Which external key a lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `bim:hasGlobalId`
    GlobalId,
    /// `navis:hasObjectId`
    ObjectId,
}

impl KeyKind {
    /// The predicate carrying this key as a literal.
    pub fn predicate(self) -> Iri {
        match self {
            KeyKind::GlobalId => bim::HAS_GLOBAL_ID,
            KeyKind::ObjectId => navis::HAS_OBJECT_ID,
        }
    }
}

/// Per-run cache; create one per enrichment session.
#[derive(Debug, Default)]
pub struct IdentityCache {
    global_ids: HashMap<String, Option<Iri>>,
    object_ids: HashMap<String, Option<Iri>>,
    graph_lookups: usize,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve by primary key first, then by fallback key.
    ///
    /// Blank keys are treated as absent. `None` means neither key names a
    /// node in `graph`; callers record the row as not found.
    pub fn resolve(&mut self, graph: &TripleGraph, primary: Option<&str>, fallback: Option<&str>) -> Option<Iri> {
        let primary = primary.map(str::trim).filter(|k| !k.is_empty());
        let fallback = fallback.map(str::trim).filter(|k| !k.is_empty());
        primary
            .and_then(|key| self.resolve_key(graph, KeyKind::GlobalId, key))
            .or_else(|| fallback.and_then(|key| self.resolve_key(graph, KeyKind::ObjectId, key)))
    }

    /// Resolve one key of one kind, consulting the graph only on first sight.
    pub fn resolve_key(&mut self, graph: &TripleGraph, kind: KeyKind, key: &str) -> Option<Iri> {
        let cache = match kind {
            KeyKind::GlobalId => &mut self.global_ids,
            KeyKind::ObjectId => &mut self.object_ids,
        };
        if let Some(hit) = cache.get(key) {
            return hit.clone();
        }
        let found = graph.find_subject(&kind.predicate(), &Term::Literal(Literal::string(key)));
        self.graph_lookups += 1;
        tracing::trace!(?kind, key, found = found.is_some(), "identity lookup");
        cache.insert(key.to_string(), found.clone());
        found
    }

    /// Number of graph point-queries issued so far.
    pub fn graph_lookups(&self) -> usize {
        self.graph_lookups
    }

    /// Number of cached keys (hits and misses) across both kinds.
    pub fn len(&self) -> usize {
        self.global_ids.len() + self.object_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything, e.g. after the graph was rebuilt.
    pub fn clear(&mut self) {
        self.global_ids.clear();
        self.object_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{self, EntityKey};

    fn graph() -> (TripleGraph, Iri, Iri) {
        let mut g = TripleGraph::new();
        let wall = vocab::mint_entity("IfcWall", EntityKey::GlobalId("3vB2"));
        g.add(&wall, &bim::HAS_GLOBAL_ID, Literal::string("3vB2"));
        let pipe = vocab::mint_navis_object("9f1c-77");
        g.add(&pipe, &navis::HAS_OBJECT_ID, Literal::string("9f1c-77"));
        (g, wall, pipe)
    }

    #[test]
    fn primary_then_fallback() {
        let (g, wall, pipe) = graph();
        let mut cache = IdentityCache::new();
        assert_eq!(cache.resolve(&g, Some("3vB2"), Some("9f1c-77")), Some(wall));
        assert_eq!(cache.resolve(&g, Some("missing"), Some("9f1c-77")), Some(pipe.clone()));
        assert_eq!(cache.resolve(&g, None, Some(" 9f1c-77 ")), Some(pipe));
        assert_eq!(cache.resolve(&g, Some(""), None), None);
        assert_eq!(cache.resolve(&g, None, None), None);
    }

    #[test]
    fn caches_are_separate_per_key_kind() {
        let (g, _, _) = graph();
        let mut cache = IdentityCache::new();
        assert!(cache.resolve_key(&g, KeyKind::GlobalId, "3vB2").is_some());
        assert!(cache.resolve_key(&g, KeyKind::ObjectId, "3vB2").is_none());
        assert!(cache.resolve_key(&g, KeyKind::GlobalId, "9f1c-77").is_none());
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let (g, wall, _) = graph();
        let mut cache = IdentityCache::new();
        for _ in 0..3 {
            assert_eq!(cache.resolve_key(&g, KeyKind::GlobalId, "3vB2"), Some(wall.clone()));
            assert_eq!(cache.resolve_key(&g, KeyKind::GlobalId, "nope"), None);
        }
        assert_eq!(cache.graph_lookups(), 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
