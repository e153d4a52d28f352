//! `ecfptrace`: explain circular fingerprints from the command line.
//!
//! Reads SMILES from arguments (or one per line on stdin) and prints the
//! reasoning trace for each molecule.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ecfptrace::{EcfpConfig, TraceConfig, TraceError, TraceSession};

#[derive(Parser)]
#[command(name = "ecfptrace")]
#[command(about = "Explain which substructure environments set circular-fingerprint bits")]
#[command(version)]
struct Cli {
    /// SMILES strings to explain; read from stdin when omitted
    smiles: Vec<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum environment radius
    #[arg(short, long)]
    radius: Option<u32>,

    /// Fingerprint length in bits
    #[arg(long)]
    fingerprint_size: Option<usize>,

    /// Kekulize aromatic systems before extracting environments
    #[arg(long)]
    kekulize: bool,

    /// Ignore isotopes and stereo markers
    #[arg(long)]
    non_isomeric: bool,

    /// Omit the per-center chain section
    #[arg(long)]
    no_chains: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    smiles: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    trace: String,
    set_bits: usize,
    fingerprint: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => EcfpConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EcfpConfig::default(),
    };
    init_logging(&file_config, cli.log_json);

    let cfg = apply_overrides(file_config.trace_config(), &cli);
    cfg.validate().context("invalid trace configuration")?;

    let inputs = if cli.smiles.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("reading SMILES from stdin")?
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    } else {
        cli.smiles.clone()
    };

    let session = TraceSession::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, smiles) in inputs.iter().enumerate() {
        let result = session.explain(smiles, &cfg);
        match cli.output {
            OutputFormat::Text => write_text(&mut out, i, smiles, result)?,
            OutputFormat::Json => write_json(&mut out, smiles, result, cfg.fingerprint_size)?,
        }
    }
    Ok(())
}

fn init_logging(config: &EcfpConfig, force_json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if force_json || config.logging.is_json() {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn apply_overrides(mut cfg: TraceConfig, cli: &Cli) -> TraceConfig {
    if let Some(radius) = cli.radius {
        cfg = cfg.with_radius(radius);
    }
    if let Some(size) = cli.fingerprint_size {
        cfg = cfg.with_fingerprint_size(size);
    }
    if cli.kekulize {
        cfg = cfg.with_kekulize(true);
    }
    if cli.non_isomeric {
        cfg = cfg.with_isomeric(false);
    }
    if cli.no_chains {
        cfg = cfg.with_per_center(false);
    }
    cfg
}

fn write_text(
    out: &mut impl Write,
    index: usize,
    smiles: &str,
    result: Result<ecfptrace::TraceReport, TraceError>,
) -> Result<()> {
    if index > 0 {
        writeln!(out)?;
    }
    writeln!(out, "## {smiles}")?;
    match result {
        Ok(report) => {
            if !report.trace.is_empty() {
                writeln!(out, "{}", report.trace)?;
            }
            writeln!(
                out,
                "# {} of {} bits set, {} environments skipped",
                report.set_bits(),
                report.fingerprint.len(),
                report.skipped
            )?;
        }
        Err(err) => writeln!(out, "# error: {err}")?,
    }
    Ok(())
}

fn write_json(
    out: &mut impl Write,
    smiles: &str,
    result: Result<ecfptrace::TraceReport, TraceError>,
    fingerprint_size: usize,
) -> Result<()> {
    let line = match result {
        Ok(report) => JsonLine {
            smiles,
            error: None,
            set_bits: report.set_bits(),
            fingerprint: bit_string(&report.fingerprint),
            trace: report.trace,
        },
        Err(err) => JsonLine {
            smiles,
            error: Some(err.to_string()),
            trace: String::new(),
            set_bits: 0,
            fingerprint: "0".repeat(fingerprint_size),
        },
    };
    serde_json::to_writer(&mut *out, &line)?;
    writeln!(out)?;
    Ok(())
}

fn bit_string(fingerprint: &[u8]) -> String {
    fingerprint
        .iter()
        .map(|&b| if b == 0 { '0' } else { '1' })
        .collect()
}
