//! Navisworks hierarchy export → triple graph.
//!
//! The export is long-format: one CSV row per (object, property category,
//! property name, value). Rows are grouped by `ObjectId` in first-seen order,
//! then each object becomes one node keyed by that id. The id is the fallback
//! identity key the injectors resolve through `navis:hasObjectId`.
//!
//! Display names are classified with the rule set the converter is built
//! with, normally [`RuleSet::navis_default`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::classify::RuleSet;
use crate::error::GraphResult;
use crate::graph::{Iri, Literal, Term, Triple, TripleSink};
use crate::inject::csv::{CsvRow, CsvTable};
use crate::schema::{self, SP3D_PROPERTIES};
use crate::vocab::{self, bim, navis, rdf, rdfs, sp3d};

use super::{ConvertError, ConvertResult};

/// Navisworks writes this id on rows that belong to no object.
pub const NIL_OBJECT_ID: &str = "00000000-0000-0000-0000-000000000000";

const PLANT_CATEGORY: &str = "SmartPlant 3D";
const SYSTEM_PATH: &str = "System Path";
const PATH_SEPARATOR: char = '\\';

/// (category, property) pairs carrying the internal object type, per UI language.
const INTERNAL_TYPE_KEYS: &[(&str, &str)] = &[("항목", "내부 유형"), ("Item", "Internal Type")];

/// Counters for one hierarchy conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavisStats {
    pub rows_read: usize,
    pub objects: usize,
    pub sp3d_entities: usize,
    pub groups: usize,
    pub parent_links: usize,
    pub path_nodes: usize,
    pub categories: BTreeMap<String, usize>,
    pub triples_emitted: usize,
}

impl fmt::Display for NavisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows read:       {}", self.rows_read)?;
        writeln!(
            f,
            "objects:         {} ({} SP3D entities, {} groups)",
            self.objects, self.sp3d_entities, self.groups
        )?;
        writeln!(f, "parent links:    {}", self.parent_links)?;
        writeln!(f, "path nodes:      {}", self.path_nodes)?;
        for (category, count) in &self.categories {
            writeln!(f, "  {category:<16} {count}")?;
        }
        write!(f, "triples emitted: {}", self.triples_emitted)
    }
}

#[derive(Debug, Default)]
struct NavisObject<'t> {
    id: &'t str,
    parent_id: Option<&'t str>,
    level: Option<&'t str>,
    display_name: Option<&'t str>,
    internal_type: Option<&'t str>,
    plant: HashMap<&'t str, &'t str>,
}

impl<'t> NavisObject<'t> {
    fn new(id: &'t str, row: &CsvRow<'t>) -> Self {
        Self {
            id,
            parent_id: row.get("ParentId").filter(|p| *p != NIL_OBJECT_ID),
            level: row.get("Level"),
            display_name: row.get("DisplayName"),
            ..Self::default()
        }
    }

    fn absorb(&mut self, row: &CsvRow<'t>) {
        let (Some(category), Some(property)) = (row.get("Category"), row.get("PropertyName")) else {
            return;
        };
        let value = row.get("RawValue");
        if INTERNAL_TYPE_KEYS.contains(&(category, property)) {
            if let Some(value) = value {
                self.internal_type = Some(value);
            }
        } else if category == PLANT_CATEGORY {
            if let Some(value) = value {
                self.plant.insert(property, value);
            }
        }
    }

    fn kind(&self) -> ObjectKind {
        match self.internal_type {
            Some(t) if t.contains("SP3D") => ObjectKind::PlantEntity,
            Some(t) if t.contains("Group") || t.contains("그룹") => ObjectKind::Group,
            _ => ObjectKind::Element,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    PlantEntity,
    Group,
    Element,
}

/// Converts hierarchy exports. Declared categories and synthesized path nodes
/// persist across calls, so several exports can be merged into one sink.
#[derive(Debug)]
pub struct NavisConverter<'r> {
    rules: &'r RuleSet,
    declared: HashSet<String>,
    path_nodes: HashSet<String>,
    schema_emitted: bool,
}

impl<'r> NavisConverter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            declared: HashSet::new(),
            path_nodes: HashSet::new(),
            schema_emitted: false,
        }
    }

    /// Read and convert an export file.
    pub fn convert_file<S: TripleSink + ?Sized>(&mut self, path: &Path, sink: &mut S) -> ConvertResult<NavisStats> {
        let table = CsvTable::read(path)?;
        if !table.has_column("ObjectId") {
            return Err(ConvertError::HierarchyHeader {
                path: path.display().to_string(),
            });
        }
        tracing::info!(path = %path.display(), rows = table.len(), "converting hierarchy export");
        Ok(self.convert_table(&table, sink)?)
    }

    /// Convert an already-parsed export.
    pub fn convert_table<S: TripleSink + ?Sized>(&mut self, table: &CsvTable, sink: &mut S) -> GraphResult<NavisStats> {
        let mut stats = NavisStats {
            rows_read: table.len(),
            ..NavisStats::default()
        };
        if !self.schema_emitted {
            stats.triples_emitted += schema::build_navis_schema(sink)?;
            self.schema_emitted = true;
        }

        let mut order: Vec<NavisObject<'_>> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in table.rows() {
            let Some(id) = row.get("ObjectId").filter(|id| *id != NIL_OBJECT_ID) else {
                continue;
            };
            let slot = *index.entry(id).or_insert_with(|| {
                order.push(NavisObject::new(id, &row));
                order.len() - 1
            });
            order[slot].absorb(&row);
        }

        let paths_before = self.path_nodes.len();
        for object in &order {
            self.object(object, sink, &mut stats)?;
        }
        stats.objects = order.len();
        stats.path_nodes = self.path_nodes.len() - paths_before;

        tracing::info!(
            objects = stats.objects,
            path_nodes = stats.path_nodes,
            triples = stats.triples_emitted,
            "hierarchy conversion complete"
        );
        Ok(stats)
    }

    fn object<S: TripleSink + ?Sized>(
        &mut self,
        object: &NavisObject<'_>,
        sink: &mut S,
        stats: &mut NavisStats,
    ) -> GraphResult<()> {
        let iri = vocab::mint_navis_object(object.id);
        let mut out = Out { sink, stats };

        match object.kind() {
            ObjectKind::PlantEntity => {
                out.emit(&iri, &rdf::TYPE, &navis::SP3D_ENTITY)?;
                out.emit(&iri, &rdf::TYPE, &bim::PHYSICAL_ELEMENT)?;
                out.stats.sp3d_entities += 1;
            }
            ObjectKind::Group => {
                out.emit(&iri, &rdf::TYPE, &navis::NAVIS_GROUP)?;
                out.stats.groups += 1;
            }
            ObjectKind::Element => out.emit(&iri, &rdf::TYPE, &navis::NAVIS_ELEMENT)?,
        }

        out.emit(&iri, &navis::HAS_OBJECT_ID, Literal::string(object.id))?;
        if let Some(name) = object.display_name {
            out.emit(&iri, &bim::HAS_NAME, Literal::string(name))?;
            out.emit(&iri, &rdfs::LABEL, Literal::string(name))?;
        }
        if let Some(level) = object.level.and_then(|l| l.parse::<i64>().ok()) {
            out.emit(&iri, &navis::HAS_LEVEL, Literal::integer(level))?;
        }
        if let Some(internal) = object.internal_type {
            out.emit(&iri, &navis::HAS_INTERNAL_TYPE, Literal::string(internal))?;
        }

        let category = self.rules.classify(object.display_name);
        out.emit(&iri, &bim::HAS_CATEGORY, Literal::string(category.as_str()))?;
        out.emit(&iri, &rdf::TYPE, vocab::bim_term(&category))?;
        out.stats.triples_emitted += schema::declare_category(&mut *out.sink, &category, &mut self.declared)?;
        *out.stats.categories.entry(category).or_default() += 1;

        if let Some(parent_id) = object.parent_id {
            let parent = vocab::mint_navis_object(parent_id);
            out.emit(&iri, &navis::HAS_PARENT, &parent)?;
            out.emit(&parent, &navis::HAS_CHILD, &iri)?;
            out.emit(&iri, &navis::HAS_PARENT_ID, Literal::string(parent_id))?;
            out.stats.parent_links += 1;
        }

        for (property, predicate) in SP3D_PROPERTIES {
            if let Some(value) = object.plant.get(property) {
                out.emit(&iri, predicate, Literal::string(*value))?;
            }
        }

        if let Some(path) = object.plant.get(SYSTEM_PATH) {
            if let Some(leaf) = self.path_node(path, &mut out)? {
                out.emit(&iri, &navis::IS_CONTAINED_IN, &leaf)?;
                out.emit(&leaf, &navis::CONTAINS_ELEMENT, &iri)?;
            }
        }
        Ok(())
    }

    /// Node for a `System Path`, creating every missing prefix node on the way.
    /// Depth 0 is a Project, 1 an Area, 2 a Unit, deeper nodes Systems.
    fn path_node<S: TripleSink + ?Sized>(&mut self, path: &str, out: &mut Out<'_, S>) -> GraphResult<Option<Iri>> {
        let mut prefix = String::new();
        let mut parent: Option<Iri> = None;
        let parts = path.split(PATH_SEPARATOR).map(str::trim).filter(|p| !p.is_empty());
        for (depth, part) in parts.enumerate() {
            if !prefix.is_empty() {
                prefix.push(PATH_SEPARATOR);
            }
            prefix.push_str(part);
            let node = vocab::mint_path_node(&prefix);

            if self.path_nodes.insert(prefix.clone()) {
                let class = match depth {
                    0 => &navis::PROJECT,
                    1 => &navis::AREA,
                    2 => &navis::UNIT,
                    _ => &navis::SYSTEM,
                };
                out.emit(&node, &rdf::TYPE, class)?;
                out.emit(&node, &rdf::TYPE, &navis::NAVIS_GROUP)?;
                out.emit(&node, &rdfs::LABEL, Literal::string(part))?;
                out.emit(&node, &bim::HAS_NAME, Literal::string(part))?;
                out.emit(&node, &sp3d::HAS_SYSTEM_PATH, Literal::string(prefix.as_str()))?;
                out.emit(&node, &navis::HAS_LEVEL, Literal::integer(depth as i64))?;
                if let Some(parent) = &parent {
                    out.emit(&node, &navis::HAS_SYSTEM_PATH_PARENT, parent)?;
                    out.emit(parent, &navis::CONTAINS_ELEMENT, &node)?;
                    out.emit(&node, &navis::IS_CONTAINED_IN, parent)?;
                }
            }
            parent = Some(node);
        }
        Ok(parent)
    }
}

struct Out<'a, S: TripleSink + ?Sized> {
    sink: &'a mut S,
    stats: &'a mut NavisStats,
}

impl<S: TripleSink + ?Sized> Out<'_, S> {
    fn emit(&mut self, s: &Iri, p: &Iri, o: impl Into<Term>) -> GraphResult<()> {
        self.sink.emit(Triple::new(s.clone(), p.clone(), o))?;
        self.stats.triples_emitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TripleGraph;

    const EXPORT: &str = "\
ObjectId,ParentId,Level,DisplayName,Category,PropertyName,RawValue
a1,00000000-0000-0000-0000-000000000000,0,Site Model,항목,내부 유형,LcOaGroup
p1,a1,2,Pipe-100-A,항목,내부 유형,SP3D Pipe
p1,a1,2,Pipe-100-A,SmartPlant 3D,System Path,TRAINING\\Refining Area\\U01
p1,a1,2,Pipe-100-A,SmartPlant 3D,Status,Working
p1,a1,2,Pipe-100-A,SmartPlant 3D,Unmapped,ignored
v1,a1,x,Gate Valve,SmartPlant 3D,System Path,TRAINING\\Refining Area\\U02
00000000-0000-0000-0000-000000000000,,0,root,항목,내부 유형,File
";

    fn run() -> (TripleGraph, NavisStats) {
        let rules = RuleSet::navis_default();
        let mut graph = TripleGraph::new();
        let stats = NavisConverter::new(&rules)
            .convert_table(&CsvTable::parse(EXPORT), &mut graph)
            .unwrap();
        (graph, stats)
    }

    #[test]
    fn groups_rows_into_typed_objects() {
        let (g, stats) = run();
        assert_eq!(stats.rows_read, 7);
        assert_eq!(stats.objects, 3);
        assert_eq!(stats.sp3d_entities, 1);
        assert_eq!(stats.groups, 1);

        let pipe = vocab::mint_navis_object("p1");
        assert!(g.has_type(&pipe, &navis::SP3D_ENTITY));
        assert!(g.has_type(&pipe, &bim::PHYSICAL_ELEMENT));
        assert!(g.has_type(&pipe, &vocab::bim_term("Pipe")));
        assert_eq!(g.object(&pipe, &navis::HAS_LEVEL), Some(Term::Literal(Literal::integer(2))));
        assert_eq!(
            g.object(&pipe, &sp3d::HAS_STATUS),
            Some(Term::Literal(Literal::string("Working")))
        );
        assert!(g.has_type(&vocab::mint_navis_object("a1"), &navis::NAVIS_GROUP));

        let valve = vocab::mint_navis_object("v1");
        assert!(g.has_type(&valve, &navis::NAVIS_ELEMENT));
        assert!(g.object(&valve, &navis::HAS_LEVEL).is_none());
        assert!(g.objects(&vocab::mint_navis_object(NIL_OBJECT_ID), &rdf::TYPE).is_empty());
    }

    #[test]
    fn plant_codes_get_categories() {
        let export = "\
ObjectId,ParentId,Level,DisplayName,Category,PropertyName,RawValue
h1,,3,Hgr-3001,Item,Internal Type,SP3D Support
v1,,3,VG3-101,Item,Internal Type,SP3D Valve
e1,,3,41P-101A,Item,Internal Type,SP3D Equipment
l1,,3,Ladder-1,Item,Internal Type,SP3D Member
";
        let rules = RuleSet::navis_default();
        let mut graph = TripleGraph::new();
        let stats = NavisConverter::new(&rules)
            .convert_table(&CsvTable::parse(export), &mut graph)
            .unwrap();
        for (id, category) in [("h1", "Hanger"), ("v1", "Valve"), ("e1", "Equipment"), ("l1", "Ladder")] {
            let node = vocab::mint_navis_object(id);
            assert!(graph.has_type(&node, &vocab::bim_term(category)), "{id} should be a {category}");
            assert_eq!(
                graph.object(&node, &bim::HAS_CATEGORY),
                Some(Term::Literal(Literal::string(category)))
            );
        }
        assert!(!stats.categories.contains_key("Other"));
        assert!(graph.contains(
            &vocab::bim_term("Ladder"),
            &rdfs::SUB_CLASS_OF,
            &Term::from(&bim::PHYSICAL_ELEMENT)
        ));
    }

    #[test]
    fn parent_links_come_in_pairs() {
        let (g, stats) = run();
        let site = vocab::mint_navis_object("a1");
        let pipe = vocab::mint_navis_object("p1");
        assert_eq!(stats.parent_links, 2);
        assert!(g.contains(&pipe, &navis::HAS_PARENT, &Term::from(&site)));
        assert!(g.contains(&site, &navis::HAS_CHILD, &Term::from(&pipe)));
        assert!(g.objects(&site, &navis::HAS_PARENT).is_empty());
    }

    #[test]
    fn system_paths_share_prefix_nodes() {
        let (g, stats) = run();
        assert_eq!(stats.path_nodes, 4);

        let project = vocab::mint_path_node("TRAINING");
        let area = vocab::mint_path_node("TRAINING\\Refining Area");
        let u01 = vocab::mint_path_node("TRAINING\\Refining Area\\U01");
        assert!(g.has_type(&project, &navis::PROJECT));
        assert!(g.has_type(&area, &navis::AREA));
        assert!(g.has_type(&u01, &navis::UNIT));
        assert!(g.contains(&area, &navis::HAS_SYSTEM_PATH_PARENT, &Term::from(&project)));
        assert!(g.contains(&project, &navis::CONTAINS_ELEMENT, &Term::from(&area)));
        assert_eq!(g.subjects(&navis::HAS_SYSTEM_PATH_PARENT, &Term::from(&area)).len(), 2);

        let pipe = vocab::mint_navis_object("p1");
        assert!(g.contains(&pipe, &navis::IS_CONTAINED_IN, &Term::from(&u01)));
        assert!(g.contains(&u01, &navis::CONTAINS_ELEMENT, &Term::from(&pipe)));
    }

    #[test]
    fn missing_object_id_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.csv");
        std::fs::write(&path, "Id,Name\n1,x\n").unwrap();
        let rules = RuleSet::navis_default();
        let mut graph = TripleGraph::new();
        let err = NavisConverter::new(&rules).convert_file(&path, &mut graph).unwrap_err();
        assert!(matches!(err, ConvertError::HierarchyHeader { .. }));
    }
}
