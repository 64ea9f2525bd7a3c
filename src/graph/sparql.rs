//! SPARQL query layer backed by oxigraph.
//!
//! The in-memory [`TripleGraph`] is loaded into an oxigraph store when a
//! declarative query is needed (the `query` CLI command, lean statistics
//! cross-checks). Results come back as plain strings.

use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::error::{GraphError, GraphResult};

use super::serialize::to_quad;
use super::{Triple, TripleGraph};

/// SPARQL-capable RDF store.
pub struct SparqlStore {
    store: Store,
}

impl SparqlStore {
    /// Create a new in-memory SPARQL store.
    pub fn in_memory() -> GraphResult<Self> {
        let store = Store::new().map_err(|e| GraphError::Sparql {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self { store })
    }

    /// Build an in-memory store holding every triple of `graph`.
    pub fn from_graph(graph: &TripleGraph) -> GraphResult<Self> {
        let store = Self::in_memory()?;
        store.sync_from(graph)?;
        Ok(store)
    }

    /// Insert a triple into the SPARQL store.
    pub fn insert_triple(&self, triple: &Triple) -> GraphResult<()> {
        let quad = to_quad(triple)?;
        self.store.insert(&quad).map_err(|e| GraphError::Sparql {
            message: format!("insert failed: {e}"),
        })?;
        Ok(())
    }

    /// Copy all triples from an in-memory graph into the store.
    pub fn sync_from(&self, graph: &TripleGraph) -> GraphResult<usize> {
        let mut count = 0;
        for triple in graph.triples() {
            self.insert_triple(&triple)?;
            count += 1;
        }
        Ok(count)
    }

    /// Execute a SPARQL SELECT query and return results as Vec of binding maps.
    ///
    /// Literal values are returned in their lexical form; IRIs without angle
    /// brackets.
    pub fn query_select(&self, sparql: &str) -> GraphResult<Vec<Vec<(String, String)>>> {
        let results = self.store.query(sparql).map_err(|e| GraphError::Sparql {
            message: format!("SPARQL query failed: {e}"),
        })?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| GraphError::Sparql {
                        message: format!("solution error: {e}"),
                    })?;
                    let mut row = Vec::new();
                    for (var, term) in solution.iter() {
                        row.push((var.as_str().to_string(), term_text(term)));
                    }
                    rows.push(row);
                }
                Ok(rows)
            }
            QueryResults::Boolean(b) => Ok(vec![vec![("result".to_string(), b.to_string())]]),
            QueryResults::Graph(_) => Err(GraphError::Sparql {
                message: "CONSTRUCT/DESCRIBE queries not supported via query_select".into(),
            }),
        }
    }

    /// Execute a SPARQL ASK query.
    pub fn query_ask(&self, sparql: &str) -> GraphResult<bool> {
        let results = self.store.query(sparql).map_err(|e| GraphError::Sparql {
            message: format!("SPARQL query failed: {e}"),
        })?;
        match results {
            QueryResults::Boolean(b) => Ok(b),
            _ => Err(GraphError::Sparql {
                message: "expected boolean result from ASK query".into(),
            }),
        }
    }

    /// Run a query whose first binding is a number (`SELECT (COUNT(*) AS ?n)`).
    pub fn query_number(&self, sparql: &str) -> GraphResult<Option<f64>> {
        let rows = self.query_select(sparql)?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .and_then(|(_, value)| value.parse().ok()))
    }

    /// Get the number of triples in the store.
    pub fn len(&self) -> GraphResult<usize> {
        let count = self.query_number("SELECT (COUNT(*) AS ?count) WHERE { ?s ?p ?o }")?;
        Ok(count.map_or(0, |n| n as usize))
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> GraphResult<bool> {
        self.len().map(|n| n == 0)
    }
}

fn term_text(term: &oxigraph::model::Term) -> String {
    match term {
        oxigraph::model::Term::NamedNode(n) => n.as_str().to_string(),
        oxigraph::model::Term::Literal(l) => l.value().to_string(),
        other => other.to_string(),
    }
}

impl std::fmt::Debug for SparqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlStore").finish()
    }
}
