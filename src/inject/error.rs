//! Enrichment error types.

use miette::Diagnostic;
use thiserror::Error;

use crate::error::GraphError;

#[derive(Debug, Error, Diagnostic)]
pub enum InjectError {
    #[error("CSV file not found: {path}")]
    #[diagnostic(
        code(bim::inject::not_found),
        help("Check the CSV path. No rows from this file were injected.")
    )]
    NotFound { path: String },

    #[error("failed to read CSV file {path}")]
    #[diagnostic(
        code(bim::inject::io),
        help("A filesystem operation failed. Check file permissions and that the file is UTF-8.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV file {path} has no header row")]
    #[diagnostic(
        code(bim::inject::missing_header),
        help("The first line of every input CSV must name its columns.")
    )]
    MissingHeader { path: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

pub type InjectResult<T> = std::result::Result<T, InjectError>;
