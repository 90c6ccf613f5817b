//! `guardrail-corpus`: build the finance guardrail training corpora
//!
//! With no flags, writes `finance_pass_normal.jsonl`, `finance_edge_cases.jsonl`
//! and `finance_multi_step.jsonl` (seed 42) to the current directory and
//! prints a composition summary.

use anyhow::{Context, Result};
use clap::Parser;
use guardrail_corpus_core_rs::corpus::{CorpusAssembler, CorpusConfig, CorpusReport, JsonlFileWriter};
use guardrail_corpus_core_rs::scenarios::CorpusKind;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Guardrail training corpus generator
#[derive(Parser, Debug)]
#[command(name = "guardrail-corpus")]
#[command(about = "Generate labeled tool-call guardrail training corpora")]
struct Args {
    /// Directory the JSONL files are written to
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// RNG seed (overrides the config file's seed)
    #[arg(long, short = 's')]
    seed: Option<u64>,

    /// JSON corpus configuration (default: finance plan)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CorpusConfig> {
    let json = match &args.config {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?,
        ),
        None => None,
    };
    CorpusConfig::resolve(json.as_deref(), args.seed).with_context(|| match &args.config {
        Some(path) => format!("parsing config {}", path.display()),
        None => "building default config".to_string(),
    })
}

fn print_summary(reports: &[CorpusReport], config_hash: &str) {
    println!("\n=== SUMMARY ===");
    for report in reports {
        let stats = &report.stats;
        let composition = match report.kind {
            CorpusKind::NormalPass => "all PASS".to_string(),
            CorpusKind::EdgeCases => "all PASS edge cases".to_string(),
            CorpusKind::MultiStep => format!("{} BLOCK, {} PASS", stats.block, stats.pass),
        };
        println!(
            "{}: {} examples ({})",
            report.kind.file_name(),
            report.written.records,
            composition
        );
        println!("  sha256: {}", report.written.sha256);
    }

    let total: usize = reports.iter().map(|r| r.written.records).sum();
    println!("\nTotal: {} examples", total);
    println!("Config: {}", config_hash);
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let config_hash = config.config_hash().context("hashing config")?;
    info!(seed = config.seed, config_hash = %config_hash, "building corpora");

    let assembler = CorpusAssembler::new(config).context("invalid corpus configuration")?;
    let mut writer = JsonlFileWriter::new(&args.output_dir);
    let reports = assembler
        .run(&mut writer)
        .with_context(|| format!("building corpora into {}", args.output_dir.display()))?;

    print_summary(&reports, &config_hash);
    Ok(())
}
