// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # bim-graph
//!
//! Converts a parsed building model (IFC entity graph) into an RDF triple graph
//! and enriches it with lean-construction data from CSV tables.
//!
//! ## Architecture
//!
//! - **Vocabulary** (`vocab`): namespaces, deterministic instance IRIs, schema gate
//! - **Classification** (`classify`): ordered regex rules for proxy elements
//! - **TBox** (`schema`): class and property declarations
//! - **Triple graph** (`graph`): petgraph-backed triple set, sink seam, oxigraph bridge
//! - **Conversion** (`convert`): whole-graph, streaming and Navisworks converters
//! - **Enrichment** (`inject`, `identity`): schedule, work-package, status and
//!   equipment injectors over a shared identity cache
//!
//! ## Library usage
//!
//! ```no_run
//! use bim_graph::classify::RuleSet;
//! use bim_graph::convert::convert;
//! use bim_graph::inject::LeanLayerInjector;
//! use bim_graph::source::model::ModelDocument;
//!
//! let model = ModelDocument::open("model.json".as_ref()).unwrap();
//! let mut conversion = convert(&model, &RuleSet::default()).unwrap();
//! let mut injector = LeanLayerInjector::new(&mut conversion.graph).unwrap();
//! let report = injector.inject_schedule_file("schedule.csv".as_ref()).unwrap();
//! println!("{report}");
//! ```

pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod graph;
pub mod identity;
pub mod inject;
pub mod schema;
pub mod source;
pub mod vocab;
