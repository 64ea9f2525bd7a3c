//! Conversion error types.

use miette::Diagnostic;
use thiserror::Error;

use crate::error::{GraphError, SourceError};
use crate::inject::error::InjectError;

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error("batch size must be greater than zero")]
    #[diagnostic(
        code(bim::convert::batch_size),
        help("Streaming conversion flushes every N triples; pass a positive --batch-size.")
    )]
    InvalidBatchSize,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Table(#[from] InjectError),

    #[error("hierarchy export {path} has no ObjectId column")]
    #[diagnostic(
        code(bim::convert::hierarchy_header),
        help(
            "A hierarchy export is a long-format CSV with at least the columns \
             ObjectId, ParentId, Level, DisplayName, Category, PropertyName, RawValue."
        )
    )]
    HierarchyHeader { path: String },
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
