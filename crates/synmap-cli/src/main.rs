//! Synonym-map clustering CLI.
//!
//! Provides the `synmap` binary. `synmap cluster` reads the merged match
//! node and edge tables from an input directory, assigns major branches,
//! drops cross-branch edges, clusters the rest, and writes the annotated
//! tables and the member map to an output directory.
//!
//! Every flag can also be set through the `SYNMAP_*` environment variable
//! named next to it in `--help`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use synmap_core::ReferenceMode;
use synmap_propagate::{run_pipeline, PipelineConfig, PropagationConfig, TieBreak};
use synmap_storage::{
    load_match_tables, write_match_tables, BranchSource, HttpBranchSource, HttpBranchSourceConfig,
    JsonFileBranchSource, StorageError, DEFAULT_BRANCH_URL, DEFAULT_MODEL_VERSION,
};

/// Synonym-map clustering tools.
#[derive(Debug, Parser)]
#[command(name = "synmap", about = "Synonym-map match-graph clustering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Assign major branches and cluster a match graph.
    Cluster(ClusterArgs),
}

#[derive(Debug, clap::Args)]
struct ClusterArgs {
    /// Directory holding the merged match node and edge tables.
    #[arg(short, long, env = "SYNMAP_INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory to write results into (default: the input directory).
    #[arg(short, long, env = "SYNMAP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Drop edges whose endpoints are missing from the node table instead
    /// of failing. For sampled test runs.
    #[arg(long, env = "SYNMAP_VALIDATE_ONLY")]
    validate_only: bool,

    /// Seed for the propagation visiting order (default: random).
    #[arg(long, env = "SYNMAP_SEED")]
    seed: Option<u64>,

    /// Maximum propagation passes.
    #[arg(long, env = "SYNMAP_MAX_ITERATIONS", default_value_t = synmap_propagate::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// How to choose between equally supported labels.
    #[arg(long, env = "SYNMAP_TIE_BREAK", value_enum, default_value_t = TieBreakArg::LowestLabel)]
    tie_break: TieBreakArg,

    /// Biolink model version to fetch the category to branch table for.
    #[arg(long, env = "SYNMAP_MODEL_VERSION", default_value = DEFAULT_MODEL_VERSION)]
    model_version: String,

    /// Lookup service endpoint; the model version is appended.
    #[arg(long, env = "SYNMAP_BRANCH_URL", default_value = DEFAULT_BRANCH_URL)]
    branch_url: String,

    /// Read the category to branch table from this JSON file instead of
    /// the lookup service.
    #[arg(long, env = "SYNMAP_BRANCH_FILE", conflicts_with = "branch_url")]
    branch_file: Option<PathBuf>,

    /// Timeout for the lookup service request, in seconds.
    #[arg(long, env = "SYNMAP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Also write the run summary as JSON to this path.
    #[arg(long, env = "SYNMAP_REPORT_JSON")]
    report_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TieBreakArg {
    LowestLabel,
    Random,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::LowestLabel => TieBreak::LowestLabel,
            TieBreakArg::Random => TieBreak::Random,
        }
    }
}

impl ClusterArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            propagation: PropagationConfig {
                max_iterations: self.max_iterations,
                seed: self.seed,
                tie_break: self.tie_break.into(),
            },
        }
    }

    fn reference_mode(&self) -> ReferenceMode {
        if self.validate_only {
            ReferenceMode::ValidateOnly
        } else {
            ReferenceMode::Strict
        }
    }

    fn branch_source(&self) -> Result<Box<dyn BranchSource>, StorageError> {
        match &self.branch_file {
            Some(path) => Ok(Box::new(JsonFileBranchSource::new(path.clone()))),
            None => Ok(Box::new(HttpBranchSource::new(HttpBranchSourceConfig {
                base_url: self.branch_url.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            })?)),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster(args) => {
            let exit_code = run_cluster(&args);
            process::exit(exit_code);
        }
    }
}

/// Execute the cluster subcommand.
///
/// Returns exit code: 0 = success, 1 = data error, 2 = category to branch
/// table unavailable, 3 = I/O error.
fn run_cluster(args: &ClusterArgs) -> i32 {
    // Fetch the branch table first: without it nothing downstream is valid.
    let branch_map = match args
        .branch_source()
        .and_then(|source| source.category_to_branch(&args.model_version))
    {
        Ok(map) => map,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };

    let mut tables = match load_match_tables(&args.input_dir, args.reference_mode()) {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("Error: failed to load match graph from '{}': {}", args.input_dir.display(), e);
            return exit_code_for(&e);
        }
    };

    let report = match run_pipeline(&mut tables.graph, &branch_map, &args.pipeline_config()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if !report.converged() {
        tracing::warn!("propagation stopped at the iteration cap; labels are best effort");
    }

    let output_dir = args.output_dir.as_deref().unwrap_or(&args.input_dir);
    let paths = match write_match_tables(output_dir, &tables) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: failed to write results to '{}': {}", output_dir.display(), e);
            return exit_code_for(&e);
        }
    };

    if let Some(path) = &args.report_json {
        if let Err(e) = write_report(path, &report) {
            eprintln!("Error: failed to write report to '{}': {}", path.display(), e);
            return 3;
        }
    }

    println!(
        "Clustered {} nodes into {} clusters ({} singletons); kept {} of {} edges",
        tables.graph.node_count(),
        report.clusters.clusters,
        report.clusters.singletons,
        report.filter.after,
        report.filter.before,
    );
    println!("  Nodes: {}", paths.nodes.display());
    println!("  Edges: {}", paths.edges.display());
    println!("  Member map: {}", paths.member_map.display());

    0
}

fn write_report(path: &Path, report: &synmap_propagate::PipelineReport) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
}

fn exit_code_for(err: &StorageError) -> i32 {
    match err {
        StorageError::MissingCategoryMapping { .. } => 2,
        e if e.is_io() => 3,
        _ => 1,
    }
}
