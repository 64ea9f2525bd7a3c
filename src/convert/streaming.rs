//! Type-by-type streaming conversion.
//!
//! Triples are buffered and handed to the caller's sink every `batch_size`
//! triples. The converter itself retains only counters and the set of declared
//! categories, so peak memory is bounded by the batch when the sink writes
//! straight to a file.

use std::time::Instant;

use crate::classify::RuleSet;
use crate::error::GraphResult;
use crate::graph::{Triple, TripleSink};
use crate::schema::SPATIAL_CLASSES;
use crate::source::SourceModel;
use crate::vocab::SchemaVersion;

use super::emit::{Emitter, TypeRole, type_role};
use super::{ConversionStats, ConvertError, ConvertResult};

/// Default number of triples per flushed batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Buffers triples and forwards them to the inner sink in batches.
struct BatchSink<S: TripleSink> {
    inner: S,
    buffer: Vec<Triple>,
    batch_size: usize,
    batches: usize,
}

impl<S: TripleSink> BatchSink<S> {
    fn new(inner: S, batch_size: usize) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            batches: 0,
        }
    }

    fn flush(&mut self) -> GraphResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        let n = batch.len();
        self.inner.emit_all(batch)?;
        self.batches += 1;
        tracing::trace!(batch = self.batches, triples = n, "batch flushed");
        Ok(())
    }
}

impl<S: TripleSink> TripleSink for BatchSink<S> {
    fn emit(&mut self, triple: Triple) -> GraphResult<()> {
        self.buffer.push(triple);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }
}

/// Streaming converter with a fixed batch size.
#[derive(Debug, Clone, Copy)]
pub struct StreamingConverter {
    batch_size: usize,
}

impl Default for StreamingConverter {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl StreamingConverter {
    /// A converter flushing every `batch_size` triples. Zero is rejected.
    pub fn new(batch_size: usize) -> ConvertResult<Self> {
        if batch_size == 0 {
            return Err(ConvertError::InvalidBatchSize);
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Convert without progress reporting.
    pub fn convert<M, S>(&self, source: &M, rules: &RuleSet, sink: S) -> ConvertResult<ConversionStats>
    where
        M: SourceModel,
        S: TripleSink,
    {
        self.convert_with_progress(source, rules, sink, |_, _, _| {})
    }

    /// Convert `source` into `sink`, calling `progress(done, total_types, message)`
    /// after each source type.
    ///
    /// Spatial types are walked first (Project → Space), then the remaining
    /// types in first-seen order; links and property sets follow once every
    /// type is done. The emitted triple set equals that of
    /// [`convert`](super::convert) for the same input.
    pub fn convert_with_progress<M, S, P>(
        &self,
        source: &M,
        rules: &RuleSet,
        sink: S,
        mut progress: P,
    ) -> ConvertResult<ConversionStats>
    where
        M: SourceModel,
        S: TripleSink,
        P: FnMut(usize, usize, &str),
    {
        let version = SchemaVersion::parse(source.schema())?;
        let started = Instant::now();
        let mut emitter = Emitter::new(BatchSink::new(sink, self.batch_size), rules);
        emitter.schema(version)?;

        let types = source.entity_types();
        let total = types.len();
        let mut ordered: Vec<&str> = Vec::with_capacity(total);
        for (class, _) in SPATIAL_CLASSES {
            ordered.extend(types.iter().filter(|t| type_role(t) == TypeRole::Spatial(class.clone())));
        }
        ordered.extend(types.iter().filter(|t| !matches!(type_role(t), TypeRole::Spatial(_))));

        for (done, type_name) in ordered.into_iter().enumerate() {
            let role = type_role(type_name);
            let mut count = 0usize;
            for entity in source.entities_of_type(type_name) {
                match &role {
                    TypeRole::Spatial(class) => emitter.spatial(entity, class)?,
                    TypeRole::Physical => {
                        emitter.physical(entity)?;
                    }
                    TypeRole::Skipped => {}
                }
                count += 1;
            }
            let message = match role {
                TypeRole::Skipped => format!("{type_name}: {count} skipped"),
                _ => format!("{type_name}: {count} entities"),
            };
            tracing::debug!(done = done + 1, total, "{message}");
            progress(done + 1, total, &message);
        }

        for (parent, child) in source.aggregations() {
            emitter.aggregation(parent, child)?;
        }
        for (structure, element) in source.containments() {
            emitter.containment(structure, element)?;
        }
        for def in source.property_definitions() {
            emitter.property_set(&def)?;
        }
        emitter.sink_mut().flush()?;

        let (batches, mut stats) = emitter.into_parts();
        stats.schema = version.to_string();
        stats.types_processed = total;
        stats.batches_flushed = batches.batches;
        stats.elapsed = started.elapsed();
        tracing::info!(
            schema = %version,
            entities = stats.entities_converted,
            skipped = stats.entities_skipped,
            triples = stats.triples_emitted,
            batches = stats.batches_flushed,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "streaming conversion complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::convert::convert;
    use crate::graph::{CountingSink, TripleGraph};
    use crate::source::model::{EntityRecord, PropertySetRecord};
    use crate::source::{ModelDocument, NominalValue, RawValue};

    fn model() -> ModelDocument {
        ModelDocument::new("IFC2X3")
            .with_entity(EntityRecord::new(1, "IfcBuilding").with_global_id("b"))
            .with_entity(EntityRecord::new(2, "IfcPipeSegment").with_global_id("p1").with_name("Line 100"))
            .with_entity(EntityRecord::new(3, "IfcBuildingStorey").with_global_id("s").with_elevation(0.0))
            .with_entity(EntityRecord::new(4, "IfcBuildingElementProxy").with_global_id("x").with_name("Steel Column"))
            .with_entity(EntityRecord::new(5, "IfcBuildingElementProxy").with_global_id("y").with_name("column base"))
            .with_entity(EntityRecord::new(6, "IfcCartesianPoint"))
            .aggregate(1, 3)
            .contain(3, 2)
            .contain(3, 4)
            .property_set(
                PropertySetRecord::new(10)
                    .with_name("Pset_PipeCommon")
                    .with_property("Size", Some(NominalValue::new("IfcLabel", RawValue::Text("DN100".into()))))
                    .with_related([2]),
            )
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(StreamingConverter::new(0), Err(ConvertError::InvalidBatchSize)));
        assert_eq!(StreamingConverter::new(5).unwrap().batch_size(), 5);
    }

    #[test]
    fn streaming_matches_whole_graph() {
        let rules = RuleSet::default();
        let whole = convert(&model(), &rules).unwrap();

        let mut streamed = TripleGraph::new();
        let stats = StreamingConverter::new(7)
            .unwrap()
            .convert(&model(), &rules, &mut streamed)
            .unwrap();

        assert_eq!(stats.structural_counts(), whole.stats.structural_counts());
        assert_eq!(stats.categories, whole.stats.categories);
        let a: HashSet<_> = whole.graph.triples().collect();
        let b: HashSet<_> = streamed.triples().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn batches_cover_every_triple() {
        let rules = RuleSet::default();
        let mut sink = CountingSink::default();
        let stats = StreamingConverter::new(10)
            .unwrap()
            .convert(&model(), &rules, &mut sink)
            .unwrap();
        assert_eq!(sink.count, stats.triples_emitted);
        assert_eq!(stats.batches_flushed, stats.triples_emitted.div_ceil(10));
    }

    #[test]
    fn progress_reports_every_type() {
        let rules = RuleSet::default();
        let mut calls = Vec::new();
        StreamingConverter::default()
            .convert_with_progress(&model(), &rules, CountingSink::default(), |done, total, msg| {
                calls.push((done, total, msg.to_string()))
            })
            .unwrap();
        assert_eq!(calls.len(), 5);
        assert!(calls.iter().all(|(_, total, _)| *total == 5));
        assert_eq!(calls.last().map(|c| c.0), Some(5));
        assert_eq!(calls[0].2, "IfcBuilding: 1 entities");
        assert!(calls.iter().any(|c| c.2 == "IfcCartesianPoint: 1 skipped"));
    }

    #[test]
    fn unsupported_schema_emits_nothing() {
        let model = ModelDocument::new("CIS2");
        let mut sink = CountingSink::default();
        assert!(StreamingConverter::default().convert(&model, &RuleSet::default(), &mut sink).is_err());
        assert_eq!(sink.count, 0);
    }
}
