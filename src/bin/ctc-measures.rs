//! ctc-measures CLI: score a tracking result against Cell Tracking Challenge
//! ground truth.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};

use ctc_measures::io::{DatasetLayout, DirectoryReader};
use ctc_measures::lineage::ConsistencyMode;
use ctc_measures::metrics::{Evaluator, SegConfig, SegResult, TraConfig, TraMode, TraResult};
use ctc_measures::TracingReporter;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ctc-measures")]
#[command(about = "Cell Tracking Challenge SEG, TRA and AOGM measures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segmentation accuracy (mean Jaccard index of GT objects).
    Seg(DatasetArgs),

    /// Tracking accuracy normalized to [0, 1].
    Tra(TrackingArgs),

    /// Raw AOGM graph edit cost.
    Aogm(TrackingArgs),

    /// SEG and TRA, evaluated independently.
    All(TrackingArgs),
}

#[derive(Debug, Clone, Args)]
struct DatasetArgs {
    /// Ground-truth folder (containing SEG and TRA).
    #[arg(long)]
    gt: PathBuf,

    /// Result folder (containing maskT.tif and res_track.txt).
    #[arg(long)]
    res: PathBuf,

    /// Number of digits in time and slice numbers of file names.
    #[arg(long, default_value = "3")]
    digits: usize,

    /// Report every Jaccard value or edit operation.
    #[arg(long)]
    verbose: bool,

    /// Path to write the results (JSON).
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct TrackingArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// TRA configuration file (JSON); flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weight of a splitting operation.
    #[arg(long)]
    penalty_split: Option<f64>,

    /// Weight of a false-negative vertex.
    #[arg(long)]
    penalty_fn: Option<f64>,

    /// Weight of a false-positive vertex.
    #[arg(long)]
    penalty_fp: Option<f64>,

    /// Weight of a redundant edge.
    #[arg(long)]
    penalty_ed: Option<f64>,

    /// Weight of a missing edge.
    #[arg(long)]
    penalty_ea: Option<f64>,

    /// Weight of an edge with wrong semantics.
    #[arg(long)]
    penalty_ec: Option<f64>,

    /// Lineage consistency checking.
    #[arg(long, value_enum)]
    consistency: Option<ConsistencyArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConsistencyArg {
    Off,
    Lenient,
    Strict,
}

impl From<ConsistencyArg> for ConsistencyMode {
    fn from(arg: ConsistencyArg) -> Self {
        match arg {
            ConsistencyArg::Off => ConsistencyMode::Off,
            ConsistencyArg::Lenient => ConsistencyMode::Lenient,
            ConsistencyArg::Strict => ConsistencyMode::Strict,
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seg(args) => run_seg(&args),
        Commands::Tra(args) => run_tra(&args, TraMode::Tra),
        Commands::Aogm(args) => run_tra(&args, TraMode::Aogm),
        Commands::All(args) => run_all(&args),
    }
}

fn evaluator(args: &DatasetArgs) -> Evaluator {
    let layout = DatasetLayout::new(&args.gt, &args.res).with_digits(args.digits);
    tracing::info!(" GT path: {}", layout.gt.display());
    tracing::info!("RES path: {}", layout.res.display());
    Evaluator::new(
        Arc::new(DirectoryReader::new(layout)),
        Arc::new(TracingReporter::new()),
    )
}

fn tra_config(args: &TrackingArgs, mode: TraMode) -> CliResult<TraConfig> {
    let mut config = match &args.config {
        Some(path) => TraConfig::from_json_file(path)?,
        None => TraConfig::default(),
    };
    config.mode = mode;
    config.verbose |= args.dataset.verbose;

    let p = &mut config.penalty;
    let overrides = [
        (&mut p.split, args.penalty_split),
        (&mut p.false_negative, args.penalty_fn),
        (&mut p.false_positive, args.penalty_fp),
        (&mut p.redundant_edge, args.penalty_ed),
        (&mut p.missing_edge, args.penalty_ea),
        (&mut p.wrong_semantics, args.penalty_ec),
    ];
    for (weight, value) in overrides {
        if let Some(v) = value {
            *weight = v;
        }
    }
    config.penalty.validate()?;

    if let Some(c) = args.consistency {
        config.consistency = c.into();
    }
    Ok(config)
}

fn seg_json(result: &SegResult) -> CliResult<Value> {
    println!("SEG: {:.6}", result.seg);
    Ok(serde_json::to_value(result)?)
}

fn tra_json(result: &TraResult) -> CliResult<Value> {
    let value = result.value()?;
    match result.mode {
        TraMode::Tra => println!("TRA: {:.6}", value),
        TraMode::Aogm => println!("AOGM: {}", value),
    }
    let c = &result.aogm.counts;
    println!(
        "  NS={} FN={} FP={} ED={} EA={} EC={}",
        c.splits, c.false_negatives, c.false_positives, c.redundant_edges, c.missing_edges, c.wrong_semantics
    );
    Ok(serde_json::to_value(result)?)
}

fn write_json(path: Option<&PathBuf>, value: &Value) -> CliResult<()> {
    if let Some(path) = path {
        std::fs::write(path, serde_json::to_string_pretty(value)?)?;
        tracing::info!("Results written to {}", path.display());
    }
    Ok(())
}

fn run_seg(args: &DatasetArgs) -> CliResult<()> {
    let config = SegConfig {
        verbose: args.verbose,
    };
    let result = evaluator(args).seg(&config)?;
    let value = json!({ "SEG": seg_json(&result)? });
    write_json(args.json.as_ref(), &value)
}

fn run_tra(args: &TrackingArgs, mode: TraMode) -> CliResult<()> {
    let config = tra_config(args, mode)?;
    let result = evaluator(&args.dataset).tra(&config)?;
    let key = match mode {
        TraMode::Tra => "TRA",
        TraMode::Aogm => "AOGM",
    };
    let mut out = Map::new();
    out.insert(key.to_string(), tra_json(&result)?);
    write_json(args.dataset.json.as_ref(), &Value::Object(out))
}

fn run_all(args: &TrackingArgs) -> CliResult<()> {
    let seg_config = SegConfig {
        verbose: args.dataset.verbose,
    };
    let tra_config = tra_config(args, TraMode::Tra)?;
    let report = evaluator(&args.dataset).evaluate(Some(&seg_config), Some(&tra_config));

    let mut out = Map::new();
    let mut failures = 0;

    if let Some(seg) = report.seg {
        let entry = seg.map_err(CliError::from).and_then(|r| seg_json(&r));
        out.insert("SEG".to_string(), entry_or_error("SEG", entry, &mut failures));
    }
    if let Some(tra) = report.tra {
        let entry = tra.map_err(CliError::from).and_then(|r| tra_json(&r));
        out.insert("TRA".to_string(), entry_or_error("TRA", entry, &mut failures));
    }

    write_json(args.dataset.json.as_ref(), &Value::Object(out))?;
    if failures > 0 {
        return Err(format!("{} measure(s) could not be computed", failures).into());
    }
    Ok(())
}

fn entry_or_error(name: &str, entry: CliResult<Value>, failures: &mut usize) -> Value {
    match entry {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("{}: {}", name, e);
            *failures += 1;
            json!({ "error": e.to_string() })
        }
    }
}
