//! Triple graph: the output side of every conversion and enrichment run.
//!
//! The graph stores RDF triples (subject, predicate, object) where subjects and
//! predicates are IRIs and objects are IRIs or typed literals.
//!
//! - **In-memory layer** ([`TripleGraph`]): `petgraph`-backed set of triples with
//!   the point lookups the enrichment injectors need
//! - **Sink seam** ([`TripleSink`]): where converters emit triples, so the same
//!   emission code can fill a graph or stream straight to a file
//! - **Query layer** ([`SparqlStore`]): `oxigraph` store for declarative queries
//! - **Serialization** ([`serialize`]): Turtle / N-Triples / RDF-XML output

pub mod index;
pub mod serialize;
pub mod sink;
pub mod sparql;

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use index::TripleGraph;
pub use sink::{CountingSink, TripleSink};
pub use sparql::SparqlStore;

/// An absolute IRI naming a node, class or property.
///
/// Vocabulary constants borrow `'static` strings; minted instance IRIs own
/// their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iri(Cow<'static, str>);

impl Iri {
    /// Wrap a `'static` IRI without allocating.
    pub const fn from_static(iri: &'static str) -> Self {
        Self(Cow::Borrowed(iri))
    }

    /// Wrap an owned IRI string.
    pub fn new(iri: impl Into<String>) -> Self {
        Self(Cow::Owned(iri.into()))
    }

    /// Join a namespace and a local name.
    pub fn in_namespace(namespace: &str, local: &str) -> Self {
        Self::new(format!("{namespace}{local}"))
    }

    /// The IRI text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the last `#` or `/`.
    pub fn local_name(&self) -> &str {
        let s = self.as_str();
        s.rfind(['#', '/']).map_or(s, |i| &s[i + 1..])
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// XML Schema datatypes used by emitted literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum XsdType {
    String,
    Double,
    Integer,
    Boolean,
    Date,
    DateTime,
}

impl XsdType {
    /// The datatype IRI.
    pub fn iri(self) -> Iri {
        use crate::vocab::xsd;
        match self {
            XsdType::String => xsd::STRING,
            XsdType::Double => xsd::DOUBLE,
            XsdType::Integer => xsd::INTEGER,
            XsdType::Boolean => xsd::BOOLEAN,
            XsdType::Date => xsd::DATE,
            XsdType::DateTime => xsd::DATE_TIME,
        }
    }
}

/// A typed literal, kept in lexical form so equality and hashing are exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    lexical: String,
    datatype: XsdType,
}

impl Literal {
    /// A literal with an explicit datatype. The lexical form is taken as-is.
    pub fn typed(lexical: impl Into<String>, datatype: XsdType) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, XsdType::String)
    }

    pub fn double(value: f64) -> Self {
        let lexical = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() { "INF" } else { "-INF" }.to_string()
        } else {
            value.to_string()
        };
        Self::typed(lexical, XsdType::Double)
    }

    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), XsdType::Integer)
    }

    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), XsdType::Boolean)
    }

    /// An `xsd:date`; the caller is responsible for the `YYYY-MM-DD` form.
    pub fn date(value: impl Into<String>) -> Self {
        Self::typed(value, XsdType::Date)
    }

    /// An `xsd:dateTime`; the caller is responsible for the ISO-8601 form.
    pub fn date_time(value: impl Into<String>) -> Self {
        Self::typed(value, XsdType::DateTime)
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> XsdType {
        self.datatype
    }

    /// Numeric view of `xsd:double` / `xsd:integer` literals.
    pub fn as_f64(&self) -> Option<f64> {
        match self.datatype {
            XsdType::Double | XsdType::Integer => self.lexical.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.datatype {
            XsdType::Boolean => self.lexical.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"^^{}", self.lexical, self.datatype.iri())
    }
}

/// Object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
}

impl Term {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            Term::Iri(_) => None,
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<&Iri> for Term {
    fn from(iri: &Iri) -> Self {
        Term::Iri(iri.clone())
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => iri.fmt(f),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

/// A triple (subject, predicate, object) in the output graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    /// The subject node.
    pub subject: Iri,
    /// The predicate (property) IRI.
    pub predicate: Iri,
    /// The object node or literal.
    pub object: Term,
}

impl Triple {
    /// Create a new triple.
    pub fn new(subject: Iri, predicate: Iri, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate,
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_after_hash_or_slash() {
        assert_eq!(
            Iri::from_static("http://example.org/bim-ontology/schema#Pipe").local_name(),
            "Pipe"
        );
        assert_eq!(Iri::from_static("https://w3id.org/bot/Site").local_name(), "Site");
    }

    #[test]
    fn static_and_owned_iris_compare_equal() {
        let a = Iri::from_static("http://example.org/x");
        let b = Iri::new(String::from("http://example.org/x"));
        assert_eq!(a, b);
    }

    #[test]
    fn literal_equality_includes_datatype() {
        assert_ne!(Literal::string("8"), Literal::integer(8));
        assert_eq!(Literal::integer(8), Literal::typed("8", XsdType::Integer));
    }

    #[test]
    fn double_lexical_forms() {
        assert_eq!(Literal::double(1500.5).lexical(), "1500.5");
        assert_eq!(Literal::double(f64::INFINITY).lexical(), "INF");
        assert_eq!(Literal::double(3.0).as_f64(), Some(3.0));
    }

    #[test]
    fn triple_display_is_ntriples_like() {
        let t = Triple::new(
            Iri::from_static("http://e.org/s"),
            Iri::from_static("http://e.org/p"),
            Literal::boolean(true),
        );
        assert_eq!(
            t.to_string(),
            "<http://e.org/s> <http://e.org/p> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> ."
        );
    }
}
