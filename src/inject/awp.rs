//! Advanced Work Packaging: work area → work package → installation package.
//!
//! Columns: element key, `CWA_ID`, `CWP_ID`, `IWP_ID`, `IWP_StartDate`,
//! `IWP_EndDate`, `ConstraintStatus`.

use std::path::Path;

use crate::graph::{Iri, Literal};
use crate::vocab::{NodeKind, awp};

use super::csv::{CsvRow, CsvTable};
use super::{InjectResult, InjectionReport, LeanLayerInjector};

impl LeanLayerInjector<'_> {
    /// Read and inject a work-packaging CSV.
    pub fn inject_awp_file(&mut self, path: &Path) -> InjectResult<InjectionReport> {
        let table = CsvTable::read(path)?;
        Ok(self.inject_awp(&table))
    }

    /// Inject work-packaging rows.
    ///
    /// Each CWA, CWP and IWP id yields one node no matter how many rows cite
    /// it. A package is chained to its parent whenever a row names both.
    pub fn inject_awp(&mut self, table: &CsvTable) -> InjectionReport {
        let mut report = InjectionReport::new("awp", table.len());
        for row in table.rows() {
            let Some((element, _)) = self.resolve_row(&row, &mut report) else {
                continue;
            };
            self.awp_row(&row, &element, &mut report);
        }
        tracing::info!(
            rows = report.rows_read,
            matched = report.rows_matched,
            cwa = report.created(NodeKind::WorkArea),
            cwp = report.created(NodeKind::WorkPackage),
            iwp = report.created(NodeKind::InstallationPackage),
            triples = report.triples_added,
            "work packages injected"
        );
        report
    }

    fn awp_row(&mut self, row: &CsvRow<'_>, element: &Iri, report: &mut InjectionReport) {
        let cwa = row.get("CWA_ID").map(|id| self.work_area(id, report));

        let cwp = row.get("CWP_ID").map(|id| {
            let class = awp::CONSTRUCTION_WORK_PACKAGE;
            let (cwp, _) = self.ensure_node(NodeKind::WorkPackage, id, &class, id, report);
            if let Some(cwa) = &cwa {
                self.add(&cwp, &awp::BELONGS_TO_CWA, cwa, report);
            }
            cwp
        });

        let Some(iwp_id) = row.get("IWP_ID") else {
            return;
        };
        let class = awp::INSTALLATION_WORK_PACKAGE;
        let (iwp, created) = self.ensure_node(NodeKind::InstallationPackage, iwp_id, &class, iwp_id, report);
        if created {
            for (column, predicate) in [("IWP_StartDate", awp::HAS_START_DATE), ("IWP_EndDate", awp::HAS_END_DATE)] {
                if let Some(date) = self.date_cell(row, column, report) {
                    self.add(&iwp, &predicate, date, report);
                }
            }
            if let Some(constraint) = row.get("ConstraintStatus") {
                self.add(&iwp, &awp::HAS_CONSTRAINT_STATUS, Literal::string(constraint), report);
            }
        }
        if let Some(cwp) = &cwp {
            self.add(&iwp, &awp::BELONGS_TO_CWP, cwp, report);
        }
        self.add(&iwp, &awp::INCLUDES_ELEMENT, element, report);
        self.add(element, &awp::ASSIGNED_TO_IWP, &iwp, report);
    }

    /// The work-area node for `id`, created on first reference.
    pub(crate) fn work_area(&mut self, id: &str, report: &mut InjectionReport) -> Iri {
        let class = awp::CONSTRUCTION_WORK_AREA;
        self.ensure_node(NodeKind::WorkArea, id, &class, id, report).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Term, TripleGraph};
    use crate::vocab::{self, EntityKey, bim, navis};

    const CSV: &str = "\
GlobalId,ObjectId,CWA_ID,CWP_ID,IWP_ID,IWP_StartDate,ConstraintStatus
g1,,A01,CWP-A01-001,IWP-1,2025-06-01,Ready
g2,,A01,CWP-A01-001,IWP-2,,
,n-3,A01,CWP-A01-001,IWP-1,2030-01-01,Blocked
g4,,A02,,IWP-9,,
";

    fn graph() -> (TripleGraph, Vec<Iri>) {
        let mut g = TripleGraph::new();
        let mut els = Vec::new();
        for gid in ["g1", "g2"] {
            let iri = vocab::mint_entity("IfcValve", EntityKey::GlobalId(gid));
            g.add(&iri, &bim::HAS_GLOBAL_ID, Literal::string(gid));
            els.push(iri);
        }
        let navis_el = vocab::mint_navis_object("n-3");
        g.add(&navis_el, &navis::HAS_OBJECT_ID, Literal::string("n-3"));
        els.push(navis_el);
        (g, els)
    }

    #[test]
    fn one_node_per_package_id() {
        let (mut g, els) = graph();
        let report = LeanLayerInjector::new(&mut g).unwrap().inject_awp(&CsvTable::parse(CSV));
        assert_eq!(report.rows_matched, 3);
        assert_eq!(report.not_found, vec!["g4".to_string()]);
        assert_eq!(report.created(NodeKind::WorkArea), 1);
        assert_eq!(report.created(NodeKind::WorkPackage), 1);
        assert_eq!(report.created(NodeKind::InstallationPackage), 2);

        assert_eq!(g.instances_of(&awp::CONSTRUCTION_WORK_PACKAGE).len(), 1);
        let cwp = vocab::mint_node(NodeKind::WorkPackage, "CWP-A01-001");
        let cwa = vocab::mint_node(NodeKind::WorkArea, "A01");
        assert!(g.contains(&cwp, &awp::BELONGS_TO_CWA, &Term::from(&cwa)));
        assert_eq!(g.subjects(&awp::BELONGS_TO_CWP, &Term::from(&cwp)).len(), 2);

        let iwp1 = vocab::mint_node(NodeKind::InstallationPackage, "IWP-1");
        assert_eq!(g.objects(&iwp1, &awp::INCLUDES_ELEMENT).len(), 2);
        assert!(g.contains(&els[2], &awp::ASSIGNED_TO_IWP, &Term::from(&iwp1)));
        assert!(g.contains(&els[0], &awp::ASSIGNED_TO_IWP, &Term::from(&iwp1)));
    }

    #[test]
    fn first_row_sets_package_attributes() {
        let (mut g, _) = graph();
        LeanLayerInjector::new(&mut g).unwrap().inject_awp(&CsvTable::parse(CSV));
        let iwp1 = vocab::mint_node(NodeKind::InstallationPackage, "IWP-1");
        assert_eq!(
            g.objects(&iwp1, &awp::HAS_START_DATE),
            vec![Term::Literal(Literal::date("2025-06-01"))]
        );
        assert_eq!(
            g.objects(&iwp1, &awp::HAS_CONSTRAINT_STATUS),
            vec![Term::Literal(Literal::string("Ready"))]
        );
    }

    #[test]
    fn rerun_adds_nothing() {
        let (mut g, _) = graph();
        let mut inj = LeanLayerInjector::new(&mut g).unwrap();
        inj.inject_awp(&CsvTable::parse(CSV));
        let again = inj.inject_awp(&CsvTable::parse(CSV));
        assert_eq!(again.triples_added, 0);
        assert!(again.nodes_created.is_empty());
    }
}
