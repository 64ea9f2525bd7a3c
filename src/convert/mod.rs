//! Graph conversion: source model → triple graph.
//!
//! Two converters share one emission core ([`emit`]):
//!
//! - [`engine::convert`] builds the whole graph in memory.
//! - [`streaming::StreamingConverter`] walks the model type by type and writes
//!   through to any [`TripleSink`](crate::graph::TripleSink) in fixed-size
//!   batches, reporting progress after every source type.
//!
//! [`navis::NavisConverter`] builds a graph from a Navisworks hierarchy export
//! instead of a parsed model.

pub mod emit;
pub mod engine;
pub mod error;
pub mod navis;
pub mod streaming;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use engine::{Conversion, convert};
pub use error::{ConvertError, ConvertResult};
pub use navis::{NavisConverter, NavisStats};
pub use streaming::StreamingConverter;

/// Counters surfaced after every conversion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionStats {
    /// Schema version the run converted.
    pub schema: String,
    pub entities_converted: usize,
    pub spatial_elements: usize,
    pub physical_elements: usize,
    /// Convertible entities skipped for lacking a GlobalId.
    pub entities_skipped: usize,
    pub aggregation_links: usize,
    pub containment_links: usize,
    /// Links and property-set owners dropped because an end has no GlobalId.
    pub links_skipped: usize,
    pub property_sets: usize,
    pub properties: usize,
    /// Proxy elements per assigned category.
    pub categories: BTreeMap<String, usize>,
    /// Source types walked, including skipped meta-types.
    pub types_processed: usize,
    /// Triples handed to the sink (before any deduplication).
    pub triples_emitted: usize,
    /// Batches flushed by the streaming converter.
    pub batches_flushed: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ConversionStats {
    /// Counts that must agree between the two converters.
    pub fn structural_counts(&self) -> [usize; 6] {
        [
            self.spatial_elements,
            self.physical_elements,
            self.entities_skipped,
            self.aggregation_links,
            self.containment_links,
            self.property_sets,
        ]
    }
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema:              {}", self.schema)?;
        writeln!(
            f,
            "entities converted:  {} ({} spatial, {} physical)",
            self.entities_converted, self.spatial_elements, self.physical_elements
        )?;
        writeln!(f, "entities skipped:    {}", self.entities_skipped)?;
        writeln!(
            f,
            "links:               {} aggregation, {} containment, {} skipped",
            self.aggregation_links, self.containment_links, self.links_skipped
        )?;
        writeln!(
            f,
            "property sets:       {} ({} properties)",
            self.property_sets, self.properties
        )?;
        if !self.categories.is_empty() {
            writeln!(f, "categories:")?;
            for (category, count) in &self.categories {
                writeln!(f, "  {category:<18} {count}")?;
            }
        }
        if self.batches_flushed > 0 {
            writeln!(f, "batches flushed:     {}", self.batches_flushed)?;
        }
        write!(
            f,
            "triples emitted:     {} in {:.2}s",
            self.triples_emitted,
            self.elapsed.as_secs_f64()
        )
    }
}
