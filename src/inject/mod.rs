//! Tabular enrichment: schedule, work-package, status and equipment data
//! layered onto a converted graph.
//!
//! Every injector follows the same row shape:
//!
//! 1. read the element keys (`GlobalId`, else `ObjectId`, else `SyncID`);
//! 2. skip and record rows without any key;
//! 3. resolve the element through the [`IdentityCache`], recording misses;
//! 4. add nodes and edges, counting what was created.
//!
//! Row-local problems never abort a run; they are counted in the
//! [`InjectionReport`] so data quality can be audited afterwards.

pub mod awp;
pub mod csv;
pub mod equipment;
pub mod error;
pub mod schedule;
pub mod stats;
pub mod status;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::{Iri, Literal, Term, TripleGraph};
use crate::identity::IdentityCache;
use crate::schema;
use crate::vocab::{self, NodeKind, bim, rdf, rdfs};

use self::csv::CsvRow;

pub use error::{InjectError, InjectResult};
pub use stats::LeanStats;
pub use status::StatusUpdate;

/// Columns holding the primary key.
const PRIMARY_KEY_COLUMNS: &[&str] = &["GlobalId"];
/// Columns holding the fallback key, in order of preference.
const FALLBACK_KEY_COLUMNS: &[&str] = &["ObjectId", "SyncID"];

/// Outcome of one injector run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InjectionReport {
    pub injector: &'static str,
    pub rows_read: usize,
    pub rows_matched: usize,
    /// Record numbers of rows carrying no element key.
    pub rows_without_id: Vec<usize>,
    /// Keys that resolved to no element.
    pub not_found: Vec<String>,
    pub triples_added: usize,
    /// Values dropped because they did not parse (numbers, dates).
    pub malformed_values: usize,
    pub nodes_created: BTreeMap<NodeKind, usize>,
}

impl InjectionReport {
    fn new(injector: &'static str, rows_read: usize) -> Self {
        Self {
            injector,
            rows_read,
            ..Self::default()
        }
    }

    pub fn created(&self, kind: NodeKind) -> usize {
        self.nodes_created.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for InjectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.injector)?;
        writeln!(f, "  rows read:        {}", self.rows_read)?;
        writeln!(f, "  rows matched:     {}", self.rows_matched)?;
        writeln!(f, "  rows without id:  {}", self.rows_without_id.len())?;
        writeln!(f, "  keys not found:   {}", self.not_found.len())?;
        for key in self.not_found.iter().take(10) {
            writeln!(f, "    {key}")?;
        }
        if self.not_found.len() > 10 {
            writeln!(f, "    … and {} more", self.not_found.len() - 10)?;
        }
        for (kind, n) in &self.nodes_created {
            writeln!(f, "  {kind} created: {n}")?;
        }
        if self.malformed_values > 0 {
            writeln!(f, "  malformed values: {}", self.malformed_values)?;
        }
        write!(f, "  triples added:    {}", self.triples_added)
    }
}

/// Enrichment session over one graph.
///
/// Owns the identity cache, so every injector run through the same session
/// shares resolved keys.
pub struct LeanLayerInjector<'g> {
    graph: &'g mut TripleGraph,
    identity: IdentityCache,
}

impl<'g> LeanLayerInjector<'g> {
    /// Start a session, adding the lean-layer vocabulary to `graph`.
    pub fn new(graph: &'g mut TripleGraph) -> GraphResult<Self> {
        let n = schema::build_lean_schema(&mut *graph)?;
        tracing::debug!(triples = n, "lean schema loaded");
        Ok(Self {
            graph,
            identity: IdentityCache::new(),
        })
    }

    pub fn graph(&self) -> &TripleGraph {
        self.graph
    }

    pub fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    /// Resolve the element a row refers to. Returns the element and the key
    /// text used, or records the row in `report` and returns `None`.
    fn resolve_row(&mut self, row: &CsvRow<'_>, report: &mut InjectionReport) -> Option<(Iri, String)> {
        let primary = row.first_of(PRIMARY_KEY_COLUMNS);
        let fallback = row.first_of(FALLBACK_KEY_COLUMNS);
        let Some(key) = primary.or(fallback) else {
            report.rows_without_id.push(row.number());
            return None;
        };
        match self.identity.resolve(&*self.graph, primary, fallback) {
            Some(element) => {
                report.rows_matched += 1;
                Some((element, key.to_string()))
            }
            None => {
                tracing::debug!(injector = report.injector, key, row = row.number(), "element not found");
                report.not_found.push(key.to_string());
                None
            }
        }
    }

    fn add(&mut self, s: &Iri, p: &Iri, o: impl Into<Term>, report: &mut InjectionReport) {
        if self.graph.add(s, p, o) {
            report.triples_added += 1;
        }
    }

    /// Set the single value of a functional property.
    fn set(&mut self, s: &Iri, p: &Iri, o: impl Into<Term>, report: &mut InjectionReport) {
        if self.graph.replace(s, p, o) {
            report.triples_added += 1;
        }
    }

    /// A date cell as an `xsd:date` literal; unparsable dates are counted and dropped.
    fn date_cell(&self, row: &CsvRow<'_>, column: &str, report: &mut InjectionReport) -> Option<Literal> {
        let value = row.get(column)?;
        match parse_date(value) {
            Some(date) => Some(Literal::date(date.format("%Y-%m-%d").to_string())),
            None => {
                tracing::warn!(injector = report.injector, row = row.number(), column, value, "invalid date ignored");
                report.malformed_values += 1;
                None
            }
        }
    }

    /// The node for `(kind, id)`, typed `class` and labelled with `label`.
    /// Returns the node and whether this call created it.
    fn ensure_node(
        &mut self,
        kind: NodeKind,
        id: &str,
        class: &Iri,
        label: &str,
        report: &mut InjectionReport,
    ) -> (Iri, bool) {
        let node = vocab::mint_node(kind, id);
        if self.graph.has_type(&node, class) {
            return (node, false);
        }
        self.add(&node, &rdf::TYPE, class, report);
        self.add(&node, &rdfs::LABEL, Literal::string(label), report);
        self.add(&node, &bim::HAS_NAME, Literal::string(label), report);
        *report.nodes_created.entry(kind).or_default() += 1;
        (node, true)
    }
}

impl fmt::Debug for LeanLayerInjector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeanLayerInjector")
            .field("graph", &self.graph)
            .field("identity", &self.identity)
            .finish()
    }
}

/// `YYYY-MM-DD`, also accepting a date-time whose date part is taken.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date_time(text).map(|(dt, _)| dt.date()))
}

/// An ISO-8601 timestamp, returned with its normalized `xsd:dateTime` form.
/// A bare date is taken as midnight.
pub(crate) fn parse_date_time(text: &str) -> Option<(NaiveDateTime, String)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some((dt.naive_local(), dt.to_rfc3339()));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some((naive, naive.format("%Y-%m-%dT%H:%M:%S").to_string()))
}

/// A finite number, or `None` for text that does not parse.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::csv::CsvTable;
    use crate::vocab::{EntityKey, awp};

    #[test]
    fn dates_and_timestamps() {
        assert_eq!(parse_date("2025-03-01"), NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(parse_date("2025-03-01T08:00:00"), NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(parse_date("03/01/2025"), None);

        assert_eq!(parse_date_time("2025-03-01").map(|t| t.1).as_deref(), Some("2025-03-01T00:00:00"));
        assert_eq!(
            parse_date_time("2025-03-01 14:30:00").map(|t| t.1).as_deref(),
            Some("2025-03-01T14:30:00")
        );
        assert_eq!(
            parse_date_time("2025-03-01T14:30:00+09:00").map(|t| t.1).as_deref(),
            Some("2025-03-01T14:30:00+09:00")
        );
        assert!(parse_date_time("yesterday").is_none());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("12 t"), None);
    }

    #[test]
    fn session_adds_lean_vocabulary_once() {
        let mut graph = TripleGraph::new();
        LeanLayerInjector::new(&mut graph).unwrap();
        let n = graph.len();
        assert!(graph.contains(
            &awp::ASSIGNED_TO_IWP,
            &crate::vocab::owl::INVERSE_OF,
            &Term::from(&awp::INCLUDES_ELEMENT)
        ));
        LeanLayerInjector::new(&mut graph).unwrap();
        assert_eq!(graph.len(), n);
    }

    #[test]
    fn rows_are_resolved_or_recorded() {
        let mut graph = TripleGraph::new();
        let wall = vocab::mint_entity("IfcWall", EntityKey::GlobalId("w1"));
        graph.add(&wall, &bim::HAS_GLOBAL_ID, Literal::string("w1"));

        let table = CsvTable::parse("GlobalId,SyncID,Note\nw1,,\n,,orphan\nzz,,\n,s-9,\n");
        let mut injector = LeanLayerInjector::new(&mut graph).unwrap();
        let mut report = InjectionReport::new("test", table.len());
        let resolved: Vec<_> = table
            .rows()
            .filter_map(|row| injector.resolve_row(&row, &mut report))
            .collect();

        assert_eq!(resolved, vec![(wall, "w1".to_string())]);
        assert_eq!(report.rows_matched, 1);
        assert_eq!(report.not_found, vec!["zz".to_string(), "s-9".to_string()]);
        assert_eq!(report.rows_without_id, vec![2]);
    }

    #[test]
    fn nodes_are_created_once_per_id() {
        let mut graph = TripleGraph::new();
        let mut injector = LeanLayerInjector::new(&mut graph).unwrap();
        let mut report = InjectionReport::new("test", 0);
        let class = awp::CONSTRUCTION_WORK_AREA;
        let (a, created) = injector.ensure_node(NodeKind::WorkArea, "A01", &class, "A01", &mut report);
        assert!(created);
        let (b, created) = injector.ensure_node(NodeKind::WorkArea, "A01", &class, "A01", &mut report);
        assert!(!created);
        assert_eq!(a, b);
        assert_eq!(report.created(NodeKind::WorkArea), 1);
        assert_eq!(report.triples_added, 3);
    }
}
