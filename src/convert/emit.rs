//! Instance-triple emission shared by the whole-graph and streaming converters.
//!
//! Both converters drive an [`Emitter`] over the same source model; they differ
//! only in the sink they hand it and in traversal order.

use std::collections::HashSet;

use crate::classify::RuleSet;
use crate::error::GraphResult;
use crate::graph::{Iri, Literal, Term, Triple, TripleSink};
use crate::schema;
use crate::source::{self, PropertyDefinition, SourceEntity, TypeGroup, present};
use crate::vocab::{self, EntityKey, SchemaVersion, bim, rdf, rdfs};

use super::ConversionStats;

/// What a source type becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeRole {
    Spatial(Iri),
    Physical,
    Skipped,
}

pub(crate) fn type_role(type_name: &str) -> TypeRole {
    if let Some(class) = source::spatial_class(type_name) {
        return TypeRole::Spatial(class);
    }
    if TypeGroup::of(type_name).is_convertible() {
        TypeRole::Physical
    } else {
        TypeRole::Skipped
    }
}

/// Instance IRI for an entity, preferring its GlobalId.
pub fn entity_iri<E: SourceEntity + ?Sized>(entity: &E) -> Iri {
    vocab::mint_entity(entity.type_name(), entity_key(entity))
}

fn entity_key<E: SourceEntity + ?Sized>(entity: &E) -> EntityKey<'_> {
    match present(entity.global_id()) {
        Some(gid) => EntityKey::GlobalId(gid),
        None => EntityKey::Sequence(entity.sequence()),
    }
}

/// IRI for an entity that may take part in links and enrichment; `None` when
/// the entity has no GlobalId.
fn linkable_iri<E: SourceEntity + ?Sized>(entity: &E) -> Option<Iri> {
    present(entity.global_id()).map(|gid| vocab::mint_entity(entity.type_name(), EntityKey::GlobalId(gid)))
}

/// Whether a property-set name marks plant-design data.
pub fn is_plant_property_set(name: &str) -> bool {
    name.starts_with("SP3D") || name.contains("SmartPlant") || name.contains("Smart3D")
}

/// Per-run emission state: the sink, the rules, the declared categories and
/// the counters.
pub(crate) struct Emitter<'r, S: TripleSink> {
    sink: S,
    rules: &'r RuleSet,
    declared: HashSet<String>,
    pub(crate) stats: ConversionStats,
}

impl<'r, S: TripleSink> Emitter<'r, S> {
    pub(crate) fn new(sink: S, rules: &'r RuleSet) -> Self {
        Self {
            sink,
            rules,
            declared: HashSet::new(),
            stats: ConversionStats::default(),
        }
    }

    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub(crate) fn into_parts(self) -> (S, ConversionStats) {
        (self.sink, self.stats)
    }

    fn emit(&mut self, subject: &Iri, predicate: &Iri, object: impl Into<Term>) -> GraphResult<()> {
        self.sink.emit(Triple::new(subject.clone(), predicate.clone(), object))?;
        self.stats.triples_emitted += 1;
        Ok(())
    }

    pub(crate) fn schema(&mut self, version: SchemaVersion) -> GraphResult<()> {
        let n = schema::build_schema(&mut self.sink, version)?;
        self.stats.triples_emitted += n;
        Ok(())
    }

    /// Identity and descriptive attributes shared by every converted entity.
    fn attributes<E: SourceEntity + ?Sized>(&mut self, iri: &Iri, entity: &E) -> GraphResult<()> {
        if let Some(gid) = present(entity.global_id()) {
            self.emit(iri, &bim::HAS_GLOBAL_ID, Literal::string(gid))?;
        }
        if let Some(name) = present(entity.name()) {
            self.emit(iri, &bim::HAS_NAME, Literal::string(name))?;
            self.emit(iri, &rdfs::LABEL, Literal::string(name))?;
        }
        if let Some(description) = present(entity.description()) {
            self.emit(iri, &bim::HAS_DESCRIPTION, Literal::string(description))?;
            self.emit(iri, &rdfs::COMMENT, Literal::string(description))?;
        }
        if let Some(object_type) = present(entity.object_type()) {
            self.emit(iri, &bim::HAS_OBJECT_TYPE, Literal::string(object_type))?;
        }
        if let Some(tag) = present(entity.tag()) {
            self.emit(iri, &bim::HAS_TAG, Literal::string(tag))?;
        }
        Ok(())
    }

    /// A spatial-structure entity. Entities without a GlobalId are still
    /// emitted, keyed by sequence number.
    pub(crate) fn spatial<E: SourceEntity + ?Sized>(&mut self, entity: &E, class: &Iri) -> GraphResult<()> {
        let iri = entity_iri(entity);
        self.emit(&iri, &rdf::TYPE, class)?;
        self.attributes(&iri, entity)?;
        if *class == bim::BUILDING_STOREY {
            if let Some(elevation) = entity.elevation() {
                self.emit(&iri, &bim::HAS_ELEVATION, Literal::double(elevation))?;
            }
        }
        self.stats.entities_converted += 1;
        self.stats.spatial_elements += 1;
        Ok(())
    }

    /// A non-spatial convertible entity. Returns `false` when it was skipped
    /// for lacking a GlobalId.
    pub(crate) fn physical<E: SourceEntity + ?Sized>(&mut self, entity: &E) -> GraphResult<bool> {
        let Some(iri) = linkable_iri(entity) else {
            self.stats.entities_skipped += 1;
            return Ok(false);
        };
        let type_name = entity.type_name();
        self.emit(&iri, &rdf::TYPE, &bim::PHYSICAL_ELEMENT)?;
        self.attributes(&iri, entity)?;
        self.emit(&iri, &bim::HAS_ORIGINAL_TYPE, Literal::string(type_name))?;

        if source::is_proxy(type_name) {
            let category = self.rules.classify(present(entity.name()));
            self.emit(&iri, &bim::HAS_CATEGORY, Literal::string(category.as_str()))?;
            self.emit(&iri, &rdf::TYPE, vocab::bim_term(&category))?;
            self.declare_category(&category)?;
            *self.stats.categories.entry(category).or_default() += 1;
        }

        self.stats.entities_converted += 1;
        self.stats.physical_elements += 1;
        Ok(true)
    }

    fn declare_category(&mut self, category: &str) -> GraphResult<()> {
        self.stats.triples_emitted += schema::declare_category(&mut self.sink, category, &mut self.declared)?;
        Ok(())
    }

    /// `parent aggregates child` and `child decomposes parent`.
    pub(crate) fn aggregation<E: SourceEntity + ?Sized>(&mut self, parent: &E, child: &E) -> GraphResult<()> {
        let (Some(p), Some(c)) = (linkable_iri(parent), linkable_iri(child)) else {
            self.stats.links_skipped += 1;
            return Ok(());
        };
        self.emit(&p, &bim::AGGREGATES, &c)?;
        self.emit(&c, &bim::DECOMPOSES, &p)?;
        self.stats.aggregation_links += 1;
        Ok(())
    }

    /// `structure containsElement element` and `element isContainedIn structure`.
    pub(crate) fn containment<E: SourceEntity + ?Sized>(&mut self, structure: &E, element: &E) -> GraphResult<()> {
        let (Some(s), Some(e)) = (linkable_iri(structure), linkable_iri(element)) else {
            self.stats.links_skipped += 1;
            return Ok(());
        };
        self.emit(&s, &bim::CONTAINS_ELEMENT, &e)?;
        self.emit(&e, &bim::IS_CONTAINED_IN, &s)?;
        self.stats.containment_links += 1;
        Ok(())
    }

    /// A property set, its properties and the `hasPropertySet` edges from the
    /// objects it applies to. Sets without properties are ignored.
    pub(crate) fn property_set<E: SourceEntity>(&mut self, def: &PropertyDefinition<'_, E>) -> GraphResult<()> {
        if def.properties.is_empty() {
            return Ok(());
        }
        let key = match present(def.global_id) {
            Some(gid) => EntityKey::GlobalId(gid),
            None => EntityKey::Sequence(def.sequence),
        };
        let pset = vocab::mint_property_set(key);
        self.emit(&pset, &rdf::TYPE, &bim::PROPERTY_SET)?;
        if let Some(name) = present(def.name) {
            self.emit(&pset, &bim::HAS_NAME, Literal::string(name))?;
            self.emit(&pset, &rdfs::LABEL, Literal::string(name))?;
            if is_plant_property_set(name) {
                self.emit(&pset, &rdf::TYPE, &bim::PLANT_PROPERTY_SET)?;
            }
        }

        for prop in def.properties {
            let prop_iri = vocab::mint_property(key, &prop.name);
            self.emit(&pset, &bim::HAS_PROPERTY, &prop_iri)?;
            self.emit(&prop_iri, &rdf::TYPE, &bim::PROPERTY)?;
            self.emit(&prop_iri, &bim::HAS_NAME, Literal::string(prop.name.as_str()))?;
            if let Some(value) = &prop.value {
                self.emit(&prop_iri, &bim::HAS_PROPERTY_VALUE, value.to_literal())?;
            }
            self.stats.properties += 1;
        }

        for owner in &def.related {
            match linkable_iri(*owner) {
                Some(owner) => self.emit(&owner, &bim::HAS_PROPERTY_SET, &pset)?,
                None => self.stats.links_skipped += 1,
            }
        }
        self.stats.property_sets += 1;
        Ok(())
    }
}
