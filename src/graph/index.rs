//! In-memory triple graph with set semantics.
//!
//! Uses a `petgraph` stable graph for adjacency (nodes are terms, edges carry an
//! interned predicate) plus a hash index over `(subject, predicate, object)` so
//! inserts are deduplicated and removals are O(1).

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::error::GraphResult;

use super::sink::TripleSink;
use super::{Iri, Term, Triple};

/// Interned predicate id; edge weight in the adjacency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PredicateId(u32);

/// The set of all triples produced by a conversion/enrichment run.
///
/// Literal objects are nodes too, which makes "find the node carrying literal X
/// on predicate Y" an incoming-edge scan on a single node.
#[derive(Default)]
pub struct TripleGraph {
    graph: StableDiGraph<Term, PredicateId>,
    /// Term → node mapping.
    node_index: HashMap<Term, NodeIndex>,
    /// Predicate interning table.
    predicates: Vec<Iri>,
    predicate_ids: HashMap<Iri, PredicateId>,
    /// `(subject, predicate, object)` → edge, the dedup index.
    edges: HashMap<(NodeIndex, PredicateId, NodeIndex), EdgeIndex>,
}

impl TripleGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, term: Term) -> NodeIndex {
        if let Some(idx) = self.node_index.get(&term) {
            return *idx;
        }
        let idx = self.graph.add_node(term.clone());
        self.node_index.insert(term, idx);
        idx
    }

    fn intern(&mut self, predicate: &Iri) -> PredicateId {
        if let Some(id) = self.predicate_ids.get(predicate) {
            return *id;
        }
        let id = PredicateId(self.predicates.len() as u32);
        self.predicates.push(predicate.clone());
        self.predicate_ids.insert(predicate.clone(), id);
        id
    }

    fn node_of_iri(&self, iri: &Iri) -> Option<NodeIndex> {
        self.node_index.get(&Term::Iri(iri.clone())).copied()
    }

    /// Insert a triple. Returns `true` if it was not already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let s = self.ensure_node(Term::Iri(triple.subject));
        let o = self.ensure_node(triple.object);
        let p = self.intern(&triple.predicate);
        if self.edges.contains_key(&(s, p, o)) {
            return false;
        }
        let e = self.graph.add_edge(s, o, p);
        self.edges.insert((s, p, o), e);
        true
    }

    /// Convenience wrapper around [`insert`](Self::insert).
    pub fn add(&mut self, subject: &Iri, predicate: &Iri, object: impl Into<Term>) -> bool {
        self.insert(Triple::new(subject.clone(), predicate.clone(), object))
    }

    /// Whether the exact triple is present.
    pub fn contains(&self, subject: &Iri, predicate: &Iri, object: &Term) -> bool {
        let (Some(s), Some(p), Some(o)) = (
            self.node_of_iri(subject),
            self.predicate_ids.get(predicate),
            self.node_index.get(object),
        ) else {
            return false;
        };
        self.edges.contains_key(&(s, *p, *o))
    }

    /// Remove the exact triple. Returns `true` if it was present.
    pub fn remove(&mut self, subject: &Iri, predicate: &Iri, object: &Term) -> bool {
        let (Some(s), Some(p), Some(o)) = (
            self.node_of_iri(subject),
            self.predicate_ids.get(predicate).copied(),
            self.node_index.get(object).copied(),
        ) else {
            return false;
        };
        match self.edges.remove(&(s, p, o)) {
            Some(e) => self.graph.remove_edge(e).is_some(),
            None => false,
        }
    }

    /// Remove every `(subject, predicate, *)` triple. Returns how many were removed.
    pub fn remove_all(&mut self, subject: &Iri, predicate: &Iri) -> usize {
        let objects = self.objects(subject, predicate);
        objects
            .iter()
            .filter(|o| self.remove(subject, predicate, o))
            .count()
    }

    /// Replace every `(subject, predicate, *)` triple with a single value.
    ///
    /// Returns `true` if the graph changed.
    pub fn replace(&mut self, subject: &Iri, predicate: &Iri, object: impl Into<Term>) -> bool {
        let object = object.into();
        let existing = self.objects(subject, predicate);
        if existing.len() == 1 && existing[0] == object {
            return false;
        }
        self.remove_all(subject, predicate);
        self.add(subject, predicate, object)
    }

    /// All objects for a subject and predicate.
    pub fn objects(&self, subject: &Iri, predicate: &Iri) -> Vec<Term> {
        let (Some(s), Some(p)) = (self.node_of_iri(subject), self.predicate_ids.get(predicate))
        else {
            return vec![];
        };
        self.graph
            .edges_directed(s, Direction::Outgoing)
            .filter(|e| e.weight() == p)
            .filter_map(|e| self.graph.node_weight(e.target()).cloned())
            .collect()
    }

    /// First object for a subject and predicate, if any.
    pub fn object(&self, subject: &Iri, predicate: &Iri) -> Option<Term> {
        self.objects(subject, predicate).into_iter().next()
    }

    /// All subjects carrying `object` on `predicate`.
    pub fn subjects(&self, predicate: &Iri, object: &Term) -> Vec<Iri> {
        let (Some(o), Some(p)) = (self.node_index.get(object), self.predicate_ids.get(predicate))
        else {
            return vec![];
        };
        self.graph
            .edges_directed(*o, Direction::Incoming)
            .filter(|e| e.weight() == p)
            .filter_map(|e| self.graph.node_weight(e.source())?.as_iri().cloned())
            .collect()
    }

    /// Point lookup: the first subject carrying `object` on `predicate`.
    pub fn find_subject(&self, predicate: &Iri, object: &Term) -> Option<Iri> {
        self.subjects(predicate, object).into_iter().next()
    }

    /// Whether `subject rdf:type class` is asserted.
    pub fn has_type(&self, subject: &Iri, class: &Iri) -> bool {
        self.contains(subject, &crate::vocab::rdf::TYPE, &Term::Iri(class.clone()))
    }

    /// All instances of a class.
    pub fn instances_of(&self, class: &Iri) -> Vec<Iri> {
        self.subjects(&crate::vocab::rdf::TYPE, &Term::Iri(class.clone()))
    }

    /// All `(subject, object)` pairs for a predicate.
    pub fn pairs(&self, predicate: &Iri) -> Vec<(Iri, Term)> {
        let Some(p) = self.predicate_ids.get(predicate) else {
            return vec![];
        };
        self.graph
            .edge_indices()
            .filter(|e| self.graph.edge_weight(*e) == Some(p))
            .filter_map(|e| {
                let (s, o) = self.graph.edge_endpoints(e)?;
                let subject = self.graph.node_weight(s)?.as_iri()?.clone();
                let object = self.graph.node_weight(o)?.clone();
                Some((subject, object))
            })
            .collect()
    }

    /// Every triple, in insertion order (modulo slots reused after removals).
    pub fn triples(&self) -> impl Iterator<Item = Triple> + '_ {
        self.graph.edge_indices().filter_map(move |e| {
            let (s, o) = self.graph.edge_endpoints(e)?;
            let p = self.graph.edge_weight(e)?;
            Some(Triple {
                subject: self.graph.node_weight(s)?.as_iri()?.clone(),
                predicate: self.predicates.get(p.0 as usize)?.clone(),
                object: self.graph.node_weight(o)?.clone(),
            })
        })
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph holds no triples.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of distinct terms (IRIs and literals) in the graph.
    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }
}

impl TripleSink for TripleGraph {
    fn emit(&mut self, triple: Triple) -> GraphResult<()> {
        self.insert(triple);
        Ok(())
    }
}

impl std::fmt::Debug for TripleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleGraph")
            .field("triples", &self.len())
            .field("nodes", &self.node_count())
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Literal;

    fn iri(s: &str) -> Iri {
        Iri::new(format!("http://example.org/{s}"))
    }

    #[test]
    fn insert_is_deduplicated() {
        let mut g = TripleGraph::new();
        assert!(g.add(&iri("a"), &iri("p"), iri("b")));
        assert!(!g.add(&iri("a"), &iri("p"), iri("b")));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn literal_point_lookup() {
        let mut g = TripleGraph::new();
        g.add(&iri("wall"), &iri("gid"), Literal::string("2O2Fr$t4X7Zf8NOew3FLOH"));
        g.add(&iri("slab"), &iri("gid"), Literal::string("other"));
        g.add(&iri("wall"), &iri("name"), Literal::string("2O2Fr$t4X7Zf8NOew3FLOH"));

        let found = g.find_subject(
            &iri("gid"),
            &Term::Literal(Literal::string("2O2Fr$t4X7Zf8NOew3FLOH")),
        );
        assert_eq!(found, Some(iri("wall")));
        assert!(g
            .find_subject(&iri("gid"), &Term::Literal(Literal::string("missing")))
            .is_none());
    }

    #[test]
    fn remove_and_replace() {
        let mut g = TripleGraph::new();
        g.add(&iri("e"), &iri("status"), Literal::string("Ordered"));
        g.add(&iri("e"), &iri("status"), Literal::string("Shipped"));
        assert_eq!(g.objects(&iri("e"), &iri("status")).len(), 2);

        assert!(g.replace(&iri("e"), &iri("status"), Literal::string("Installed")));
        assert_eq!(
            g.objects(&iri("e"), &iri("status")),
            vec![Term::Literal(Literal::string("Installed"))]
        );
        assert!(!g.replace(&iri("e"), &iri("status"), Literal::string("Installed")));
        assert_eq!(g.len(), 1);

        // A removed triple can be re-inserted.
        assert!(g.remove(&iri("e"), &iri("status"), &Literal::string("Installed").into()));
        assert!(g.is_empty());
        assert!(g.add(&iri("e"), &iri("status"), Literal::string("Installed")));
    }

    #[test]
    fn triples_and_pairs() {
        let mut g = TripleGraph::new();
        g.add(&iri("a"), &iri("p"), iri("b"));
        g.add(&iri("b"), &iri("p"), iri("c"));
        g.add(&iri("a"), &iri("q"), Literal::integer(3));
        assert_eq!(g.triples().count(), 3);
        assert_eq!(g.pairs(&iri("p")).len(), 2);
        assert!(g.pairs(&iri("missing")).is_empty());
    }
}
