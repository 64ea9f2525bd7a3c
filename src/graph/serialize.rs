//! RDF serialization of triple sets via `oxigraph::io`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use oxigraph::io::{RdfFormat, RdfSerializer, WriterQuadSerializer};
use oxigraph::model::{GraphName, Literal as OxLiteral, NamedNode, Quad};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::vocab;

use super::sink::TripleSink;
use super::{Iri, Term, Triple, TripleGraph, XsdType};

/// Output formats supported by the writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Turtle,
    NTriples,
    RdfXml,
}

impl OutputFormat {
    fn rdf_format(self) -> RdfFormat {
        match self {
            Self::Turtle => RdfFormat::Turtle,
            Self::NTriples => RdfFormat::NTriples,
            Self::RdfXml => RdfFormat::RdfXml,
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
            Self::RdfXml => "rdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "nt" | "n-triples" => Ok(Self::NTriples),
            "rdfxml" | "xml" | "rdf" | "rdf/xml" => Ok(Self::RdfXml),
            _ => Err(GraphError::UnknownFormat {
                format: s.to_string(),
            }),
        }
    }
}

pub(crate) fn named_node(iri: &Iri) -> GraphResult<NamedNode> {
    NamedNode::new(iri.as_str()).map_err(|e| GraphError::InvalidIri {
        iri: iri.as_str().to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn to_quad(triple: &Triple) -> GraphResult<Quad> {
    let subject = named_node(&triple.subject)?;
    let predicate = named_node(&triple.predicate)?;
    let quad = match &triple.object {
        Term::Iri(iri) => Quad::new(subject, predicate, named_node(iri)?, GraphName::DefaultGraph),
        Term::Literal(lit) => {
            let literal = match lit.datatype() {
                XsdType::String => OxLiteral::new_simple_literal(lit.lexical()),
                other => OxLiteral::new_typed_literal(lit.lexical(), named_node(&other.iri())?),
            };
            Quad::new(subject, predicate, literal, GraphName::DefaultGraph)
        }
    };
    Ok(quad)
}

fn io_error(e: std::io::Error) -> GraphError {
    GraphError::Serialize {
        message: e.to_string(),
    }
}

/// A sink that serializes triples as they arrive.
///
/// Used by the streaming converter so the output never has to be held in
/// memory. Call [`finish`](Self::finish) to flush trailing syntax.
pub struct RdfWriterSink<W: Write> {
    inner: WriterQuadSerializer<W>,
    written: usize,
}

impl<W: Write> RdfWriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> GraphResult<Self> {
        let mut serializer = RdfSerializer::from_format(format.rdf_format());
        for (prefix, ns) in vocab::PREFIXES {
            serializer = serializer
                .with_prefix(*prefix, *ns)
                .map_err(|e| GraphError::InvalidIri {
                    iri: ns.to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(Self {
            inner: serializer.for_writer(writer),
            written: 0,
        })
    }

    /// Number of triples written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Finish the document and hand back the writer.
    pub fn finish(self) -> GraphResult<W> {
        self.inner.finish().map_err(io_error)
    }
}

impl<W: Write> TripleSink for RdfWriterSink<W> {
    fn emit(&mut self, triple: Triple) -> GraphResult<()> {
        let quad = to_quad(&triple)?;
        self.inner.serialize_quad(&quad).map_err(io_error)?;
        self.written += 1;
        Ok(())
    }
}

/// Serialize a whole graph to a writer. Returns the number of triples written.
pub fn write_graph<W: Write>(graph: &TripleGraph, writer: W, format: OutputFormat) -> GraphResult<usize> {
    let mut sink = RdfWriterSink::new(writer, format)?;
    for triple in graph.triples() {
        sink.emit(triple)?;
    }
    let written = sink.written();
    let mut writer = sink.finish()?;
    writer.flush().map_err(io_error)?;
    Ok(written)
}

/// Serialize a whole graph to a file.
pub fn write_graph_to_path(graph: &TripleGraph, path: &Path, format: OutputFormat) -> GraphResult<usize> {
    let file = File::create(path).map_err(|e| GraphError::Serialize {
        message: format!("cannot create {}: {e}", path.display()),
    })?;
    let written = write_graph(graph, BufWriter::new(file), format)?;
    tracing::info!(path = %path.display(), triples = written, "graph written");
    Ok(written)
}
