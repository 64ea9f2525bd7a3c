//! End-to-end tests: model snapshot → graph → enrichment → query and output.
//!
//! Fixtures are written into a temporary directory and read back through the
//! same file entry points the CLI uses.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bim_graph::classify::RuleSet;
use bim_graph::config::BimConfig;
use bim_graph::convert::{ConvertError, NavisConverter, StreamingConverter, convert};
use bim_graph::error::SourceError;
use bim_graph::graph::serialize::{OutputFormat, RdfWriterSink, write_graph_to_path};
use bim_graph::graph::{Literal, SparqlStore, Term, Triple, TripleGraph};
use bim_graph::inject::{InjectError, LeanLayerInjector, LeanStats};
use bim_graph::source::model::ModelDocument;
use bim_graph::vocab::{self, EntityKey, NodeKind, awp, bim, navis, sched};

const MODEL: &str = r#"{
  "schema": "IFC4",
  "entities": [
    { "id": 1, "type": "IfcProject", "global_id": "prj", "name": "Refinery" },
    { "id": 2, "type": "IfcBuilding", "global_id": "bld", "name": "Pipe Rack" },
    { "id": 3, "type": "IfcBuildingStorey", "global_id": "st1", "name": "Level 1", "elevation": 4.5 },
    { "id": 4, "type": "IfcWall", "global_id": "w1", "name": "Wall A" },
    { "id": 5, "type": "IfcBuildingElementProxy", "global_id": "p1", "name": "Pipe Run 100" },
    { "id": 6, "type": "IfcBuildingElementProxy", "global_id": "s1", "name": "Pump skid" },
    { "id": 7, "type": "IfcOwnerHistory" }
  ],
  "aggregations": [
    { "parent": 1, "child": 2 },
    { "parent": 2, "child": 3 }
  ],
  "containments": [
    { "structure": 3, "element": 4 },
    { "structure": 3, "element": 5 },
    { "structure": 3, "element": 6 }
  ],
  "property_sets": [
    {
      "id": 10,
      "global_id": "ps1",
      "name": "Pset_WallCommon",
      "properties": [
        { "name": "FireRating", "value": { "type": "IfcLabel", "value": "2HR" } },
        { "name": "Width", "value": { "type": "IfcLengthMeasure", "value": 0.3 } }
      ],
      "related": [4]
    }
  ]
}"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn element(type_name: &str, gid: &str) -> bim_graph::graph::Iri {
    vocab::mint_entity(type_name, EntityKey::GlobalId(gid))
}

#[test]
fn convert_then_enrich_full_pipeline() {
    let dir = tempfile::TempDir::new().unwrap();
    let model_path = write(dir.path(), "model.json", MODEL);
    let schedule = write(
        dir.path(),
        "schedule.csv",
        "GlobalId,TaskName,PlannedStart,PlannedEnd,PlannedDuration,UnitCost\n\
         w1,Install level 1,2025-04-01,2025-04-05,5,100\n\
         p1,Install level 1,2025-04-01,2025-04-05,5,40\n\
         ghost,Install level 1,,,,\n",
    );
    let awp_csv = write(
        dir.path(),
        "awp.csv",
        "GlobalId,CWA_ID,CWP_ID,IWP_ID,IWP_StartDate\n\
         w1,A01,CWP-A01-001,IWP-1,2025-04-01\n\
         p1,A01,CWP-A01-001,IWP-2,2025-04-03\n",
    );
    let status = write(
        dir.path(),
        "status.csv",
        "GlobalId,StatusValue,StatusDate,DeliveryStatus\np1,Installed,2025-04-06,OnSite\n",
    );

    let model = ModelDocument::open(&model_path).unwrap();
    let mut conversion = convert(&model, &RuleSet::default()).unwrap();
    assert_eq!(conversion.stats.spatial_elements, 3);
    assert_eq!(conversion.stats.physical_elements, 3);
    assert_eq!(conversion.stats.containment_links, 3);
    assert_eq!(conversion.stats.property_sets, 1);

    let storey = element("IfcBuildingStorey", "st1");
    let wall = element("IfcWall", "w1");
    let pipe = element("IfcBuildingElementProxy", "p1");
    {
        let g = &conversion.graph;
        assert!(g.contains(&storey, &bim::CONTAINS_ELEMENT, &Term::from(&wall)));
        assert!(g.contains(&pipe, &bim::IS_CONTAINED_IN, &Term::from(&storey)));
        assert!(g.has_type(&pipe, &vocab::bim_term("Pipe")));
        assert_eq!(
            g.object(&pipe, &bim::HAS_CATEGORY),
            Some(Term::Literal(Literal::string("Pipe")))
        );
    }

    let (schedule_report, awp_report, status_report) = {
        let mut injector = LeanLayerInjector::new(&mut conversion.graph).unwrap();
        (
            injector.inject_schedule_file(&schedule).unwrap(),
            injector.inject_awp_file(&awp_csv).unwrap(),
            injector.inject_status_file(&status).unwrap(),
        )
    };
    assert_eq!(schedule_report.rows_matched, 2);
    assert_eq!(schedule_report.not_found, vec!["ghost".to_string()]);
    assert_eq!(schedule_report.created(NodeKind::Task), 1);
    assert_eq!(awp_report.created(NodeKind::WorkPackage), 1);
    assert_eq!(awp_report.created(NodeKind::InstallationPackage), 2);
    assert_eq!(status_report.created(NodeKind::Status), 1);

    let g = &conversion.graph;
    let task = vocab::mint_node(NodeKind::Task, "Install level 1");
    assert_eq!(g.instances_of(&sched::CONSTRUCTION_TASK), vec![task.clone()]);
    assert!(g.contains(&wall, &sched::ASSIGNED_TO_TASK, &Term::from(&task)));
    assert!(g.contains(&task, &sched::HAS_ASSIGNED_ELEMENT, &Term::from(&pipe)));
    let cwp = vocab::mint_node(NodeKind::WorkPackage, "CWP-A01-001");
    assert_eq!(g.subjects(&awp::BELONGS_TO_CWP, &Term::from(&cwp)).len(), 2);
    assert_eq!(
        g.objects(&pipe, &bim::HAS_DELIVERY_STATUS),
        vec![Term::Literal(Literal::string("OnSite"))]
    );

    let stats = LeanStats::collect(g);
    assert_eq!(stats.tasks, 1);
    assert_eq!(stats.work_areas, 1);
    assert_eq!(stats.work_packages, 1);
    assert_eq!(stats.installation_packages, 2);
    assert_eq!(stats.status_records, 1);
    assert_eq!(stats.elements_with_iwp, 2);
    assert_eq!(stats.total_unit_cost, 140.0);
    assert_eq!(stats.avg_unit_cost, 70.0);
    assert_eq!(stats.avg_consume_duration, 5.0);
    assert_eq!(stats.avg_task_duration, 5.0);

    let store = SparqlStore::from_graph(g).unwrap();
    let tasks = store
        .query_number(
            "PREFIX sched: <http://example.org/bim-ontology/schedule#> \
             SELECT (COUNT(?t) AS ?n) WHERE { ?t a sched:ConstructionTask }",
        )
        .unwrap();
    assert_eq!(tasks, Some(1.0));
    assert!(store
        .query_ask(
            "PREFIX bim: <http://example.org/bim-ontology/schema#> \
             ASK { ?e bim:hasStatus ?s . ?s bim:hasStatusValue \"Installed\" }"
        )
        .unwrap());
}

#[test]
fn streaming_and_whole_graph_agree() {
    let model = ModelDocument::from_json(MODEL).unwrap();
    let rules = RuleSet::default();
    let whole = convert(&model, &rules).unwrap();

    let mut streamed: Vec<Triple> = Vec::new();
    let mut reported = Vec::new();
    let stats = StreamingConverter::new(7)
        .unwrap()
        .convert_with_progress(&model, &rules, &mut streamed, |done, total, message| {
            reported.push((done, total, message.to_string()));
        })
        .unwrap();

    let a: BTreeSet<Triple> = whole.graph.triples().collect();
    let b: BTreeSet<Triple> = streamed.into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(stats.structural_counts(), whole.stats.structural_counts());
    assert_eq!(stats.batches_flushed, stats.triples_emitted.div_ceil(7));

    assert_eq!(reported.len(), stats.types_processed);
    assert!(reported.iter().all(|(_, total, _)| *total == stats.types_processed));
    assert_eq!(reported.last().map(|(done, _, _)| *done), Some(stats.types_processed));
    assert_eq!(reported[0].2, "IfcProject: 1 entities");
}

#[test]
fn streaming_writes_through_to_a_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("model.nt");
    let model = ModelDocument::from_json(MODEL).unwrap();

    let file = std::io::BufWriter::new(std::fs::File::create(&out).unwrap());
    let mut sink = RdfWriterSink::new(file, OutputFormat::NTriples).unwrap();
    let stats = StreamingConverter::default()
        .convert(&model, &RuleSet::default(), &mut sink)
        .unwrap();
    assert_eq!(sink.written(), stats.triples_emitted);
    drop(sink.finish().unwrap());

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().filter(|l| !l.trim().is_empty()).count(), stats.triples_emitted);
    assert!(text.contains("instance#ifcwall_w1"));
}

#[test]
fn navis_objects_resolve_through_sync_id() {
    let dir = tempfile::TempDir::new().unwrap();
    let export = write(
        dir.path(),
        "hierarchy.csv",
        "ObjectId,ParentId,Level,DisplayName,Category,PropertyName,RawValue\n\
         grp,,1,Unit 01,Item,Internal Type,LcOaGroup\n\
         pp-7,grp,2,Pipe-7,Item,Internal Type,SP3D Pipe\n\
         pp-7,grp,2,Pipe-7,SmartPlant 3D,System Path,PLANT\\Area 1\\U01\n",
    );
    let schedule = write(
        dir.path(),
        "schedule.csv",
        "SyncID,TaskName,ActualDuration\npp-7,Hydrotest,3\n",
    );

    let rules = RuleSet::navis_default();
    let mut graph = TripleGraph::new();
    let stats = NavisConverter::new(&rules).convert_file(&export, &mut graph).unwrap();
    assert_eq!(stats.objects, 2);
    assert_eq!(stats.path_nodes, 3);

    let report = LeanLayerInjector::new(&mut graph)
        .unwrap()
        .inject_schedule_file(&schedule)
        .unwrap();
    assert_eq!(report.rows_matched, 1);

    let pipe = vocab::mint_navis_object("pp-7");
    let task = vocab::mint_node(NodeKind::Task, "Hydrotest");
    assert!(graph.has_type(&pipe, &navis::SP3D_ENTITY));
    assert!(graph.contains(&pipe, &sched::ASSIGNED_TO_TASK, &Term::from(&task)));
    assert_eq!(
        graph.object(&pipe, &bim::HAS_CONSUME_DURATION),
        Some(Term::Literal(Literal::integer(3)))
    );
}

#[test]
fn configured_rules_drive_classification() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = write(
        dir.path(),
        "bim-graph.toml",
        "[[classification.rules]]\ncategory = \"Skid\"\npatterns = [\"skid\"]\n",
    );
    let rules = BimConfig::load(&config_path).unwrap().rule_set().unwrap();
    let conversion = convert(&ModelDocument::from_json(MODEL).unwrap(), &rules).unwrap();

    let skid = element("IfcBuildingElementProxy", "s1");
    let pipe = element("IfcBuildingElementProxy", "p1");
    assert!(conversion.graph.has_type(&skid, &vocab::bim_term("Skid")));
    assert!(conversion.graph.has_type(&pipe, &vocab::bim_term("Other")));
    assert_eq!(conversion.stats.categories.get("Skid"), Some(&1));
}

#[test]
fn model_without_schema_takes_the_configured_default() {
    let json = r#"{ "entities": [{ "id": 1, "type": "IfcWall", "global_id": "w" }] }"#;
    let mut model = ModelDocument::from_json(json).unwrap();
    model.set_default_schema("IFC2X3");
    let conversion = convert(&model, &RuleSet::default()).unwrap();
    assert_eq!(conversion.stats.schema, "IFC2X3");
}

#[test]
fn fatal_inputs_are_reported_before_any_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = ModelDocument::open(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, SourceError::NotFound { .. }));

    let model = ModelDocument::from_json(r#"{ "schema": "IFC4X3", "entities": [] }"#).unwrap();
    let mut out: Vec<Triple> = Vec::new();
    let err = StreamingConverter::default()
        .convert(&model, &RuleSet::default(), &mut out)
        .unwrap_err();
    assert!(matches!(err, ConvertError::Source(SourceError::UnsupportedSchema { .. })));
    assert!(out.is_empty());

    let mut graph = TripleGraph::new();
    let err = LeanLayerInjector::new(&mut graph)
        .unwrap()
        .inject_awp_file(&dir.path().join("awp.csv"))
        .unwrap_err();
    assert!(matches!(err, InjectError::NotFound { .. }));
}

#[test]
fn enriched_graph_serializes_to_turtle() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut conversion = convert(&ModelDocument::from_json(MODEL).unwrap(), &RuleSet::default()).unwrap();
    LeanLayerInjector::new(&mut conversion.graph)
        .unwrap()
        .inject_equipment(&bim_graph::inject::csv::CsvTable::parse(
            "EquipmentID,Name,BoomLength,AccessZone_CWA_ID\nCR-1,Crawler crane,60,A01\n",
        ));

    let out = dir.path().join("enriched.ttl");
    let written = write_graph_to_path(&conversion.graph, &out, OutputFormat::Turtle).unwrap();
    assert_eq!(written, conversion.graph.len());
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("@prefix bim:"));
    assert!(text.contains("ConstructionEquipment"));
}
