//! TBox vocabulary: classes and properties emitted before instance data.
//!
//! All builders are additive. Emitting the same declarations twice into a
//! [`TripleGraph`](crate::graph::TripleGraph) is a no-op because the graph has
//! set semantics; sinks that do not deduplicate (file writers) receive each
//! builder once per run.

use std::collections::HashSet;

use crate::error::GraphResult;
use crate::graph::{Iri, Literal, Triple, TripleSink};
use crate::vocab::{self, SchemaVersion, awp, bim, navis, owl, rdf, rdfs, sched, sp3d, xsd};

/// Small helper around a sink for declaration triples.
struct Declarer<'s, S: TripleSink + ?Sized> {
    sink: &'s mut S,
    emitted: usize,
}

impl<'s, S: TripleSink + ?Sized> Declarer<'s, S> {
    fn new(sink: &'s mut S) -> Self {
        Self { sink, emitted: 0 }
    }

    fn triple(&mut self, s: &Iri, p: &Iri, o: impl Into<crate::graph::Term>) -> GraphResult<()> {
        self.sink.emit(Triple::new(s.clone(), p.clone(), o))?;
        self.emitted += 1;
        Ok(())
    }

    fn class(&mut self, class: &Iri, label: &str, parent: Option<&Iri>) -> GraphResult<()> {
        self.triple(class, &rdf::TYPE, &owl::CLASS)?;
        self.triple(class, &rdfs::LABEL, Literal::string(label))?;
        if let Some(parent) = parent {
            self.triple(class, &rdfs::SUB_CLASS_OF, parent)?;
        }
        Ok(())
    }

    fn datatype_property(&mut self, prop: &Iri, domain: Option<&Iri>, range: &Iri) -> GraphResult<()> {
        self.triple(prop, &rdf::TYPE, &owl::DATATYPE_PROPERTY)?;
        if let Some(domain) = domain {
            self.triple(prop, &rdfs::DOMAIN, domain)?;
        }
        self.triple(prop, &rdfs::RANGE, range)
    }

    fn object_property(&mut self, prop: &Iri, domain: Option<&Iri>, range: Option<&Iri>) -> GraphResult<()> {
        self.triple(prop, &rdf::TYPE, &owl::OBJECT_PROPERTY)?;
        if let Some(domain) = domain {
            self.triple(prop, &rdfs::DOMAIN, domain)?;
        }
        if let Some(range) = range {
            self.triple(prop, &rdfs::RANGE, range)?;
        }
        Ok(())
    }

    /// Declare `inverse` as an object property and the inverse of `forward`.
    fn inverse(&mut self, inverse: &Iri, forward: &Iri) -> GraphResult<()> {
        self.triple(inverse, &rdf::TYPE, &owl::OBJECT_PROPERTY)?;
        self.triple(inverse, &owl::INVERSE_OF, forward)
    }
}

/// Spatial classes with their labels, in hierarchy order.
pub const SPATIAL_CLASSES: &[(Iri, &str)] = &[
    (bim::PROJECT, "Project"),
    (bim::SITE, "Site"),
    (bim::BUILDING, "Building"),
    (bim::BUILDING_STOREY, "BuildingStorey"),
    (bim::SPACE, "Space"),
];

/// Emit the core building TBox. Returns the number of triples emitted.
pub fn build_schema<S: TripleSink + ?Sized>(sink: &mut S, version: SchemaVersion) -> GraphResult<usize> {
    let mut d = Declarer::new(sink);

    let ontology = vocab::bim_ontology_iri();
    d.triple(&ontology, &rdf::TYPE, &owl::ONTOLOGY)?;
    d.triple(&ontology, &owl::IMPORTS, version.ontology_iri())?;

    d.class(&bim::BIM_ELEMENT, "BIM Element", None)?;
    d.class(&bim::SPATIAL_ELEMENT, "Spatial Element", Some(&bim::BIM_ELEMENT))?;
    d.class(&bim::PHYSICAL_ELEMENT, "Physical Element", Some(&bim::BIM_ELEMENT))?;
    for (class, label) in SPATIAL_CLASSES {
        d.class(class, label, Some(&bim::SPATIAL_ELEMENT))?;
    }

    for prop in [
        &bim::HAS_GLOBAL_ID,
        &bim::HAS_NAME,
        &bim::HAS_DESCRIPTION,
        &bim::HAS_OBJECT_TYPE,
        &bim::HAS_TAG,
    ] {
        d.datatype_property(prop, Some(&bim::BIM_ELEMENT), &xsd::STRING)?;
    }
    d.datatype_property(&bim::HAS_CATEGORY, Some(&bim::PHYSICAL_ELEMENT), &xsd::STRING)?;
    d.datatype_property(&bim::HAS_ORIGINAL_TYPE, Some(&bim::PHYSICAL_ELEMENT), &xsd::STRING)?;
    d.datatype_property(&bim::HAS_ELEVATION, Some(&bim::BUILDING_STOREY), &xsd::DOUBLE)?;

    d.object_property(&bim::CONTAINS_ELEMENT, Some(&bim::SPATIAL_ELEMENT), Some(&bim::BIM_ELEMENT))?;
    d.inverse(&bim::IS_CONTAINED_IN, &bim::CONTAINS_ELEMENT)?;
    d.object_property(&bim::AGGREGATES, None, None)?;
    d.inverse(&bim::DECOMPOSES, &bim::AGGREGATES)?;

    d.class(&bim::PROPERTY_SET, "Property Set", None)?;
    d.class(&bim::PLANT_PROPERTY_SET, "Plant Property Set", Some(&bim::PROPERTY_SET))?;
    d.class(&bim::PROPERTY, "Property", None)?;
    d.object_property(&bim::HAS_PROPERTY_SET, None, Some(&bim::PROPERTY_SET))?;
    d.object_property(&bim::HAS_PROPERTY, Some(&bim::PROPERTY_SET), Some(&bim::PROPERTY))?;
    d.triple(&bim::HAS_PROPERTY_VALUE, &rdf::TYPE, &owl::DATATYPE_PROPERTY)?;
    d.triple(&bim::HAS_PROPERTY_VALUE, &rdfs::DOMAIN, &bim::PROPERTY)?;

    Ok(d.emitted)
}

/// Declare a category class (subclass of PhysicalElement) unless `declared`
/// already holds it. Returns the number of triples emitted.
pub fn declare_category<S: TripleSink + ?Sized>(
    sink: &mut S,
    category: &str,
    declared: &mut HashSet<String>,
) -> GraphResult<usize> {
    if declared.contains(category) {
        return Ok(0);
    }
    let class = vocab::bim_term(category);
    let mut d = Declarer::new(sink);
    d.class(&class, category, Some(&bim::PHYSICAL_ELEMENT))?;
    declared.insert(category.to_string());
    Ok(d.emitted)
}

/// Emit the lean-construction TBox used by the tabular injectors.
pub fn build_lean_schema<S: TripleSink + ?Sized>(sink: &mut S) -> GraphResult<usize> {
    let mut d = Declarer::new(sink);

    d.class(&sched::CONSTRUCTION_TASK, "Construction Task", None)?;
    d.class(&awp::CONSTRUCTION_WORK_AREA, "Construction Work Area", None)?;
    d.class(&awp::CONSTRUCTION_WORK_PACKAGE, "Construction Work Package", None)?;
    d.class(&awp::INSTALLATION_WORK_PACKAGE, "Installation Work Package", None)?;
    d.class(&bim::ELEMENT_STATUS, "Element Status", None)?;
    d.class(&bim::CONSTRUCTION_EQUIPMENT, "Construction Equipment", None)?;

    let task_class = &sched::CONSTRUCTION_TASK;
    let task = Some(task_class);
    d.object_property(&sched::ASSIGNED_TO_TASK, Some(&bim::BIM_ELEMENT), task)?;
    d.inverse(&sched::HAS_ASSIGNED_ELEMENT, &sched::ASSIGNED_TO_TASK)?;
    for prop in [&sched::HAS_PLANNED_START, &sched::HAS_PLANNED_END, &sched::HAS_ACTUAL_START, &sched::HAS_ACTUAL_END] {
        d.datatype_property(prop, task, &xsd::DATE)?;
    }
    d.datatype_property(&sched::HAS_DURATION, task, &xsd::STRING)?;
    for prop in [&sched::HAS_PLANNED_DURATION, &sched::HAS_ACTUAL_DURATION, &sched::HAS_EFFECTIVE_DURATION] {
        d.datatype_property(prop, task, &xsd::INTEGER)?;
    }
    d.datatype_property(&sched::HAS_PLANNED_INSTALL_DATE, Some(&bim::BIM_ELEMENT), &xsd::DATE)?;

    let cwa_class = &awp::CONSTRUCTION_WORK_AREA;
    let cwa = Some(cwa_class);
    let cwp_class = &awp::CONSTRUCTION_WORK_PACKAGE;
    let cwp = Some(cwp_class);
    let iwp_class = &awp::INSTALLATION_WORK_PACKAGE;
    let iwp = Some(iwp_class);
    d.object_property(&awp::BELONGS_TO_CWA, cwp, cwa)?;
    d.object_property(&awp::BELONGS_TO_CWP, iwp, cwp)?;
    d.object_property(&awp::INCLUDES_ELEMENT, iwp, Some(&bim::BIM_ELEMENT))?;
    d.inverse(&awp::ASSIGNED_TO_IWP, &awp::INCLUDES_ELEMENT)?;
    d.datatype_property(&awp::BELONGS_TO_CWP_ID, Some(&bim::BIM_ELEMENT), &xsd::STRING)?;
    d.datatype_property(&awp::HAS_START_DATE, iwp, &xsd::DATE)?;
    d.datatype_property(&awp::HAS_END_DATE, iwp, &xsd::DATE)?;
    d.datatype_property(&awp::HAS_CONSTRAINT_STATUS, iwp, &xsd::STRING)?;

    let element_class = &bim::BIM_ELEMENT;
    let element = Some(element_class);
    let status_class = &bim::ELEMENT_STATUS;
    let status = Some(status_class);
    d.object_property(&bim::HAS_STATUS, element, status)?;
    d.datatype_property(&bim::HAS_STATUS_VALUE, status, &xsd::STRING)?;
    d.datatype_property(&bim::HAS_STATUS_DATE, status, &xsd::DATE_TIME)?;
    d.datatype_property(&bim::HAS_DELIVERY_STATUS, element, &xsd::STRING)?;
    d.datatype_property(&bim::IS_READY, element, &xsd::BOOLEAN)?;
    d.datatype_property(&bim::HAS_UNIT_COST, element, &xsd::DOUBLE)?;
    d.datatype_property(&bim::HAS_CONSUME_DURATION, element, &xsd::INTEGER)?;

    let equipment_class = &bim::CONSTRUCTION_EQUIPMENT;
    let equipment = Some(equipment_class);
    for prop in [
        &bim::HAS_EQUIPMENT_WIDTH,
        &bim::HAS_EQUIPMENT_HEIGHT,
        &bim::HAS_TURNING_RADIUS,
        &bim::HAS_BOOM_LENGTH,
        &bim::HAS_LOAD_CAPACITY,
    ] {
        d.datatype_property(prop, equipment, &xsd::DOUBLE)?;
    }
    d.object_property(&bim::CAN_ACCESS_ZONE, equipment, cwa)?;

    Ok(d.emitted)
}

/// Emit the hierarchy-export TBox used by the Navisworks converter.
pub fn build_navis_schema<S: TripleSink + ?Sized>(sink: &mut S) -> GraphResult<usize> {
    let mut d = Declarer::new(sink);

    d.class(&navis::NAVIS_ELEMENT, "Navisworks Element", Some(&bim::BIM_ELEMENT))?;
    d.class(&navis::NAVIS_GROUP, "Navisworks Group", Some(&navis::NAVIS_ELEMENT))?;
    d.class(&navis::SP3D_ENTITY, "SmartPlant 3D Entity", Some(&navis::NAVIS_ELEMENT))?;
    for (class, label) in [
        (&navis::PROJECT, "Project"),
        (&navis::AREA, "Area"),
        (&navis::UNIT, "Unit"),
        (&navis::SYSTEM, "System"),
    ] {
        d.class(class, label, Some(&navis::NAVIS_GROUP))?;
    }

    d.object_property(&navis::CONTAINS_ELEMENT, None, None)?;
    d.inverse(&navis::IS_CONTAINED_IN, &navis::CONTAINS_ELEMENT)?;
    d.object_property(&navis::HAS_SYSTEM_PATH_PARENT, None, None)?;
    d.object_property(&navis::HAS_PARENT, None, None)?;
    d.inverse(&navis::HAS_CHILD, &navis::HAS_PARENT)?;

    let element_class = &navis::NAVIS_ELEMENT;
    let element = Some(element_class);
    d.datatype_property(&navis::HAS_OBJECT_ID, element, &xsd::STRING)?;
    d.datatype_property(&navis::HAS_PARENT_ID, element, &xsd::STRING)?;
    d.datatype_property(&navis::HAS_LEVEL, element, &xsd::INTEGER)?;
    d.datatype_property(&navis::HAS_INTERNAL_TYPE, element, &xsd::STRING)?;
    for prop in SP3D_PROPERTIES.iter().map(|(_, prop)| prop) {
        d.datatype_property(prop, element, &xsd::STRING)?;
    }

    Ok(d.emitted)
}

/// SmartPlant 3D property names and the predicate each maps to.
pub const SP3D_PROPERTIES: &[(&str, Iri)] = &[
    ("Name", sp3d::HAS_NAME),
    ("System Path", sp3d::HAS_SYSTEM_PATH),
    ("BOM description", sp3d::HAS_BOM_DESCRIPTION),
    ("Support Assembly", sp3d::HAS_SUPPORT_ASSEMBLY),
    ("Support Dry Weight", sp3d::HAS_DRY_WEIGHT),
    ("Support Location", sp3d::HAS_LOCATION),
    ("Status", sp3d::HAS_STATUS),
    ("User Created", sp3d::HAS_CREATED_BY),
    ("Date Created", sp3d::HAS_CREATED_DATE),
    ("User Last Modified", sp3d::HAS_MODIFIED_BY),
    ("Date Last Modified", sp3d::HAS_MODIFIED_DATE),
    ("SP3d Moniker", sp3d::HAS_MONIKER),
    ("Reporting Type", sp3d::HAS_REPORTING_TYPE),
    ("Construction Type", sp3d::HAS_CONSTRUCTION_TYPE),
    ("Permission Group ID", sp3d::HAS_PERMISSION_GROUP_ID),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Term, TripleGraph};

    #[test]
    fn core_schema_declares_hierarchy_and_inverses() {
        let mut g = TripleGraph::new();
        let n = build_schema(&mut g, SchemaVersion::Ifc4).unwrap();
        assert_eq!(n, g.len());

        assert!(g.contains(&bim::BUILDING_STOREY, &rdfs::SUB_CLASS_OF, &Term::from(&bim::SPATIAL_ELEMENT)));
        assert!(g.contains(&bim::PHYSICAL_ELEMENT, &rdfs::SUB_CLASS_OF, &Term::from(&bim::BIM_ELEMENT)));
        assert!(g.contains(&bim::IS_CONTAINED_IN, &owl::INVERSE_OF, &Term::from(&bim::CONTAINS_ELEMENT)));
        assert!(g.contains(&bim::DECOMPOSES, &owl::INVERSE_OF, &Term::from(&bim::AGGREGATES)));
        assert!(g.contains(&bim::HAS_ELEVATION, &rdfs::RANGE, &Term::from(&xsd::DOUBLE)));
    }

    #[test]
    fn schema_is_idempotent_in_a_graph() {
        let mut g = TripleGraph::new();
        build_schema(&mut g, SchemaVersion::Ifc2x3).unwrap();
        let before = g.len();
        build_schema(&mut g, SchemaVersion::Ifc2x3).unwrap();
        assert_eq!(g.len(), before);
    }

    #[test]
    fn category_declared_once() {
        let mut out: Vec<Triple> = Vec::new();
        let mut declared = HashSet::new();
        assert_eq!(declare_category(&mut out, "Pipe", &mut declared).unwrap(), 3);
        let after_first = out.len();
        assert_eq!(declare_category(&mut out, "Pipe", &mut declared).unwrap(), 0);
        assert_eq!(out.len(), after_first);
        assert!(out.contains(&Triple::new(
            vocab::bim_term("Pipe"),
            rdfs::SUB_CLASS_OF,
            bim::PHYSICAL_ELEMENT,
        )));
    }

    #[test]
    fn lean_schema_declares_work_packaging() {
        let mut g = TripleGraph::new();
        build_lean_schema(&mut g).unwrap();
        assert!(g.has_type(&awp::CONSTRUCTION_WORK_PACKAGE, &owl::CLASS));
        assert!(g.contains(&awp::ASSIGNED_TO_IWP, &owl::INVERSE_OF, &Term::from(&awp::INCLUDES_ELEMENT)));
        assert!(g.contains(&bim::IS_READY, &rdfs::RANGE, &Term::from(&xsd::BOOLEAN)));
    }

    #[test]
    fn navis_schema_declares_path_levels() {
        let mut g = TripleGraph::new();
        build_navis_schema(&mut g).unwrap();
        assert!(g.contains(&navis::UNIT, &rdfs::SUB_CLASS_OF, &Term::from(&navis::NAVIS_GROUP)));
        assert!(g.has_type(&sp3d::HAS_MONIKER, &owl::DATATYPE_PROPERTY));
    }
}
