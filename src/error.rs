//! Rich diagnostic error types for the bim-graph converter.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.
//!
//! Only run-level failures are errors. Row-level and entity-level data problems
//! (a CSV row without an identifier, a malformed number, an entity without a
//! GlobalId) are counted in run reports instead.

use miette::Diagnostic;
use thiserror::Error;

use crate::convert::error::ConvertError;
use crate::inject::error::InjectError;

/// Top-level error type for the bim-graph crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum BimError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Inject(#[from] InjectError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Source model errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("model file not found: {path}")]
    #[diagnostic(
        code(bim::source::not_found),
        help("Check the path passed to --model. Nothing was converted.")
    )]
    NotFound { path: String },

    #[error("failed to read model file {path}")]
    #[diagnostic(
        code(bim::source::io),
        help("A filesystem operation failed. Check file permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model snapshot: {message}")]
    #[diagnostic(
        code(bim::source::parse),
        help(
            "The model snapshot must be a JSON document with `schema`, `entities`, \
             `aggregations`, `containments` and `property_sets` fields."
        )
    )]
    Parse { message: String },

    #[error("unsupported source schema: {schema}")]
    #[diagnostic(
        code(bim::source::unsupported_schema),
        help(
            "Supported schemas are IFC4 and IFC2X3. Re-export the model with one of \
             these schema versions. Conversion aborted before emitting any triple."
        )
    )]
    UnsupportedSchema { schema: String },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("invalid IRI <{iri}>: {message}")]
    #[diagnostic(
        code(bim::graph::invalid_iri),
        help(
            "Minted identifiers are percent-encoded, so this usually means a \
             vocabulary constant or a configured category name is malformed."
        )
    )]
    InvalidIri { iri: String, message: String },

    #[error("SPARQL store error: {message}")]
    #[diagnostic(
        code(bim::graph::sparql),
        help(
            "The oxigraph store rejected the operation. Check the query syntax \
             and ensure the store is initialized."
        )
    )]
    Sparql { message: String },

    #[error("serialization failed: {message}")]
    #[diagnostic(
        code(bim::graph::serialize),
        help("Writing the triple set failed. Check that the output path is writable.")
    )]
    Serialize { message: String },

    #[error("unknown output format: \"{format}\"")]
    #[diagnostic(
        code(bim::graph::unknown_format),
        help("Supported output formats are: turtle, ntriples, rdfxml.")
    )]
    UnknownFormat { format: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(bim::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(bim::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid classification pattern \"{pattern}\" for category {category}: {message}")]
    #[diagnostic(
        code(bim::config::invalid_pattern),
        help("Classification patterns are regular expressions matched case-insensitively.")
    )]
    InvalidPattern {
        category: String,
        pattern: String,
        message: String,
    },

    #[error("invalid category name \"{category}\"")]
    #[diagnostic(
        code(bim::config::invalid_category),
        help(
            "Category names become class IRIs, so they must be non-empty and contain \
             only ASCII letters, digits and underscores."
        )
    )]
    InvalidCategory { category: String },

    #[error("batch size must be greater than zero")]
    #[diagnostic(
        code(bim::config::batch_size),
        help("Set `batch_size` (or --batch-size) to a positive number, e.g. 1000.")
    )]
    ZeroBatchSize,
}

/// Convenience alias used throughout the crate.
pub type BimResult<T> = std::result::Result<T, BimError>;

/// Result type for source model operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Result type for configuration handling.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
