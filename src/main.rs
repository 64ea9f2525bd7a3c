//! bim-graph CLI: building model → RDF triple graph.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use bim_graph::classify::RuleSet;
use bim_graph::config::BimConfig;
use bim_graph::convert::{NavisConverter, StreamingConverter, convert};
use bim_graph::graph::serialize::{OutputFormat, RdfWriterSink, write_graph_to_path};
use bim_graph::graph::{SparqlStore, TripleGraph};
use bim_graph::inject::{LeanLayerInjector, LeanStats};
use bim_graph::source::model::ModelDocument;

#[derive(Parser)]
#[command(name = "bim-graph", version, about = "Building-model to RDF triple graph converter")]
struct Cli {
    /// TOML config file (schema default, batch size, output format, classification rules).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a model snapshot to RDF.
    Convert {
        /// Model snapshot (JSON).
        #[arg(long)]
        model: PathBuf,

        /// Output file.
        #[arg(long)]
        out: PathBuf,

        /// Stream triples to the output in batches instead of building the graph in memory.
        #[arg(long)]
        streaming: bool,

        /// Triples per streaming batch (overrides config).
        #[arg(long)]
        batch_size: Option<usize>,

        /// turtle, ntriples or rdfxml (overrides config).
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Convert a model, then enrich it with lean-construction CSVs.
    Build {
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        enrich: EnrichArgs,

        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Convert a Navisworks hierarchy export, optionally enriching it.
    Navis {
        /// Long-format hierarchy CSV.
        #[arg(long)]
        hierarchy: PathBuf,

        #[command(flatten)]
        enrich: EnrichArgs,

        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print the category assigned to each name.
    Classify {
        /// Display names to classify.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Run a SPARQL query over a converted (and optionally enriched) model.
    Query {
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        enrich: EnrichArgs,

        /// SELECT or ASK query text.
        #[arg(long)]
        sparql: String,
    },

    /// Print a starter config with the built-in classification table.
    InitConfig,
}

#[derive(Args, Debug, Default)]
struct EnrichArgs {
    /// Schedule CSV (tasks, dates, durations, unit cost).
    #[arg(long)]
    schedule: Option<PathBuf>,

    /// Work-packaging CSV (CWA / CWP / IWP).
    #[arg(long)]
    awp: Option<PathBuf>,

    /// Status CSV (status records, delivery status).
    #[arg(long)]
    status: Option<PathBuf>,

    /// Equipment CSV.
    #[arg(long)]
    equipment: Option<PathBuf>,
}

impl EnrichArgs {
    fn is_empty(&self) -> bool {
        self.schedule.is_none() && self.awp.is_none() && self.status.is_none() && self.equipment.is_none()
    }

    /// Run every given injector over `graph`, schedule first so later tables
    /// can reuse resolved keys. Prints each report and the lean statistics.
    fn apply(&self, graph: &mut TripleGraph, quiet: bool) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let mut injector = LeanLayerInjector::new(graph)?;
        let mut reports = Vec::new();
        if let Some(path) = &self.schedule {
            reports.push(injector.inject_schedule_file(path)?);
        }
        if let Some(path) = &self.awp {
            reports.push(injector.inject_awp_file(path)?);
        }
        if let Some(path) = &self.status {
            reports.push(injector.inject_status_file(path)?);
        }
        if let Some(path) = &self.equipment {
            reports.push(injector.inject_equipment_file(path)?);
        }
        if !quiet {
            for report in &reports {
                println!("{report}");
            }
            println!("{}", LeanStats::collect(injector.graph()));
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BimConfig::load(path)?,
        None => BimConfig::default(),
    };
    let rules = config.rule_set()?;

    match cli.command {
        Commands::Convert {
            model,
            out,
            streaming,
            batch_size,
            format,
        } => {
            let format = format.unwrap_or(config.output_format);
            let model = open_model(&model, &config)?;

            if streaming {
                let converter = StreamingConverter::new(batch_size.unwrap_or(config.batch_size))?;
                let file = File::create(&out).into_diagnostic()?;
                let mut sink = RdfWriterSink::new(BufWriter::new(file), format)?;
                let stats = converter.convert_with_progress(&model, &rules, &mut sink, |done, total, message| {
                    tracing::info!(done, total, "{message}");
                })?;
                let written = sink.written();
                sink.finish()?.flush().into_diagnostic()?;
                println!("{stats}");
                println!("Wrote {written} triples to {}", out.display());
            } else {
                let conversion = convert(&model, &rules)?;
                let written = write_graph_to_path(&conversion.graph, &out, format)?;
                println!("{}", conversion.stats);
                println!("Wrote {written} triples to {}", out.display());
            }
        }

        Commands::Build {
            model,
            enrich,
            out,
            format,
        } => {
            let model = open_model(&model, &config)?;
            let mut conversion = convert(&model, &rules)?;
            println!("{}", conversion.stats);
            enrich.apply(&mut conversion.graph, false)?;
            let written = write_graph_to_path(&conversion.graph, &out, format.unwrap_or(config.output_format))?;
            println!("Wrote {written} triples to {}", out.display());
        }

        Commands::Navis {
            hierarchy,
            enrich,
            out,
            format,
        } => {
            let navis_rules = config.navis_rule_set()?;
            let mut graph = TripleGraph::new();
            let stats = NavisConverter::new(&navis_rules).convert_file(&hierarchy, &mut graph)?;
            println!("{stats}");
            enrich.apply(&mut graph, false)?;
            let written = write_graph_to_path(&graph, &out, format.unwrap_or(config.output_format))?;
            println!("Wrote {written} triples to {}", out.display());
        }

        Commands::Classify { names } => {
            print_categories(&rules, &names);
        }

        Commands::Query { model, enrich, sparql } => {
            let model = open_model(&model, &config)?;
            let mut conversion = convert(&model, &rules)?;
            enrich.apply(&mut conversion.graph, true)?;
            let store = SparqlStore::from_graph(&conversion.graph)?;
            let rows = store.query_select(&sparql)?;
            if rows.is_empty() {
                println!("No results.");
            }
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|(var, value)| format!("?{var} = {value}")).collect();
                println!("{}", cells.join("  "));
            }
        }

        Commands::InitConfig => {
            print!("{}", config.to_toml_with_rules()?);
        }
    }

    Ok(())
}

fn open_model(path: &Path, config: &BimConfig) -> Result<ModelDocument> {
    let mut model = ModelDocument::open(path)?;
    model.set_default_schema(&config.schema);
    Ok(model)
}

fn print_categories(rules: &RuleSet, names: &[String]) {
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
    for name in names {
        println!("{name:<width$}  {}", rules.classify_str(Some(name)));
    }
}
