//! Whole-graph conversion.

use std::time::Instant;

use crate::classify::RuleSet;
use crate::graph::TripleGraph;
use crate::schema::SPATIAL_CLASSES;
use crate::source::SourceModel;
use crate::vocab::SchemaVersion;

use super::emit::{Emitter, TypeRole, type_role};
use super::{ConversionStats, ConvertResult};

/// The result of a whole-graph conversion.
#[derive(Debug)]
pub struct Conversion {
    pub graph: TripleGraph,
    pub stats: ConversionStats,
}

/// Convert a source model into an in-memory graph.
///
/// Order: schema, spatial structure (Project → Space), aggregation links,
/// containment links, physical elements (first-seen type order), property
/// sets. An unsupported schema fails before anything is emitted.
pub fn convert<M: SourceModel>(source: &M, rules: &RuleSet) -> ConvertResult<Conversion> {
    let version = SchemaVersion::parse(source.schema())?;
    let started = Instant::now();
    let mut graph = TripleGraph::new();

    let stats = {
        let mut emitter = Emitter::new(&mut graph, rules);
        emitter.schema(version)?;

        let types = source.entity_types();
        for (class, _) in SPATIAL_CLASSES {
            for type_name in types.iter().filter(|t| type_role(t) == TypeRole::Spatial(class.clone())) {
                for entity in source.entities_of_type(type_name) {
                    emitter.spatial(entity, class)?;
                }
            }
        }

        for (parent, child) in source.aggregations() {
            emitter.aggregation(parent, child)?;
        }
        for (structure, element) in source.containments() {
            emitter.containment(structure, element)?;
        }

        for type_name in &types {
            if type_role(type_name) != TypeRole::Physical {
                continue;
            }
            for entity in source.entities_of_type(type_name) {
                emitter.physical(entity)?;
            }
        }

        for def in source.property_definitions() {
            emitter.property_set(&def)?;
        }

        let mut stats = emitter.stats;
        stats.types_processed = types.len();
        stats
    };

    let mut stats = stats;
    stats.schema = version.to_string();
    stats.elapsed = started.elapsed();
    tracing::info!(
        schema = %version,
        entities = stats.entities_converted,
        skipped = stats.entities_skipped,
        triples = graph.len(),
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "conversion complete"
    );
    Ok(Conversion { graph, stats })
}
