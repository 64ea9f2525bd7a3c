//! Construction equipment specifications.
//!
//! Columns: `EquipmentID`, `Name`, `Width`, `Height`, `TurningRadius`,
//! `BoomLength`, `LoadCapacity`, `AccessZone_CWA_ID`. Rows describe
//! equipment, not model elements, so no element key is resolved.

use std::path::Path;

use crate::graph::{Iri, Literal};
use crate::vocab::{NodeKind, bim, rdfs};

use super::csv::CsvTable;
use super::{InjectResult, InjectionReport, LeanLayerInjector, parse_number};

const DIMENSIONS: &[(&str, Iri)] = &[
    ("Width", bim::HAS_EQUIPMENT_WIDTH),
    ("Height", bim::HAS_EQUIPMENT_HEIGHT),
    ("TurningRadius", bim::HAS_TURNING_RADIUS),
    ("BoomLength", bim::HAS_BOOM_LENGTH),
    ("LoadCapacity", bim::HAS_LOAD_CAPACITY),
];

impl LeanLayerInjector<'_> {
    /// Read and inject an equipment CSV.
    pub fn inject_equipment_file(&mut self, path: &Path) -> InjectResult<InjectionReport> {
        let table = CsvTable::read(path)?;
        Ok(self.inject_equipment(&table))
    }

    /// Inject equipment rows: one node per `EquipmentID`, numeric fields as
    /// doubles, and an access-zone link to a work-area node that is created
    /// if no earlier injection made it.
    pub fn inject_equipment(&mut self, table: &CsvTable) -> InjectionReport {
        let mut report = InjectionReport::new("equipment", table.len());
        for row in table.rows() {
            let Some(id) = row.get("EquipmentID") else {
                report.rows_without_id.push(row.number());
                continue;
            };
            report.rows_matched += 1;
            let name = row.get("Name");
            let class = bim::CONSTRUCTION_EQUIPMENT;
            let (equipment, created) =
                self.ensure_node(NodeKind::Equipment, id, &class, name.unwrap_or(id), &mut report);
            if let Some(name) = name.filter(|_| !created) {
                self.set(&equipment, &rdfs::LABEL, Literal::string(name), &mut report);
                self.set(&equipment, &bim::HAS_NAME, Literal::string(name), &mut report);
            }

            for (column, predicate) in DIMENSIONS {
                let Some(value) = row.get(column) else {
                    continue;
                };
                match parse_number(value) {
                    Some(v) => self.set(&equipment, predicate, Literal::double(v), &mut report),
                    None => {
                        tracing::warn!(row = row.number(), column, value, "non-numeric equipment value ignored");
                        report.malformed_values += 1;
                    }
                }
            }

            if let Some(zone) = row.get("AccessZone_CWA_ID") {
                let cwa = self.work_area(zone, &mut report);
                self.add(&equipment, &bim::CAN_ACCESS_ZONE, &cwa, &mut report);
            }
        }
        tracing::info!(
            rows = report.rows_read,
            equipment = report.created(NodeKind::Equipment),
            triples = report.triples_added,
            "equipment injected"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Term, TripleGraph};
    use crate::vocab::{self, awp};

    #[test]
    fn equipment_nodes_and_zones() {
        let mut g = TripleGraph::new();
        let csv = "EquipmentID,Name,Width,Height,BoomLength,AccessZone_CWA_ID,Owner\n\
                   CR-01,Crawler crane,4.5,n/a,60,A01,Acme\n\
                   FL-02,,1.2,2.1,,,\n\
                   ,Orphan,1,1,1,,\n";
        let report = LeanLayerInjector::new(&mut g).unwrap().inject_equipment(&CsvTable::parse(csv));
        assert_eq!(report.created(NodeKind::Equipment), 2);
        assert_eq!(report.created(NodeKind::WorkArea), 1);
        assert_eq!(report.rows_without_id, vec![3]);
        assert_eq!(report.malformed_values, 1);

        let crane = vocab::mint_node(NodeKind::Equipment, "CR-01");
        assert!(g.has_type(&crane, &bim::CONSTRUCTION_EQUIPMENT));
        assert_eq!(g.object(&crane, &rdfs::LABEL), Some(Term::Literal(Literal::string("Crawler crane"))));
        assert_eq!(g.object(&crane, &bim::HAS_EQUIPMENT_WIDTH), Some(Term::Literal(Literal::double(4.5))));
        assert!(g.object(&crane, &bim::HAS_EQUIPMENT_HEIGHT).is_none());
        let zone = vocab::mint_node(NodeKind::WorkArea, "A01");
        assert!(g.contains(&crane, &bim::CAN_ACCESS_ZONE, &Term::from(&zone)));
        assert!(g.has_type(&zone, &awp::CONSTRUCTION_WORK_AREA));

        let lift = vocab::mint_node(NodeKind::Equipment, "FL-02");
        assert_eq!(g.object(&lift, &bim::HAS_NAME), Some(Term::Literal(Literal::string("FL-02"))));
    }

    #[test]
    fn later_name_replaces_id_label() {
        let mut g = TripleGraph::new();
        let csv = "EquipmentID,Name,Width
FL-02,,1.2
FL-02,Forklift,
";
        let report = LeanLayerInjector::new(&mut g).unwrap().inject_equipment(&CsvTable::parse(csv));
        assert_eq!(report.created(NodeKind::Equipment), 1);

        let lift = vocab::mint_node(NodeKind::Equipment, "FL-02");
        let name = Term::Literal(Literal::string("Forklift"));
        assert_eq!(g.objects(&lift, &rdfs::LABEL), vec![name.clone()]);
        assert_eq!(g.objects(&lift, &bim::HAS_NAME), vec![name]);
        assert_eq!(g.object(&lift, &bim::HAS_EQUIPMENT_WIDTH), Some(Term::Literal(Literal::double(1.2))));
    }

    #[test]
    fn existing_work_area_is_reused() {
        let mut g = TripleGraph::new();
        let zone = vocab::mint_node(NodeKind::WorkArea, "A01");
        let mut inj = LeanLayerInjector::new(&mut g).unwrap();
        let mut report = InjectionReport::new("seed", 0);
        assert_eq!(inj.work_area("A01", &mut report), zone);

        let report = inj.inject_equipment(&CsvTable::parse("EquipmentID,AccessZone_CWA_ID\nCR-01,A01\n"));
        assert_eq!(report.created(NodeKind::WorkArea), 0);
        assert_eq!(inj.graph().instances_of(&awp::CONSTRUCTION_WORK_AREA), vec![zone]);
    }
}
