use anyhow::{Context, Result};
use clap::Parser;
use hbmtrace_bin::init_logging_with_progress;
use hbmtrace_core::{AccessType, TraceConfig, TraceGenerator};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// CLI arguments for the `hbmtrace` binary.
///
/// Field value sets default to the built-in sweep, may be replaced
/// wholesale by a JSON config file, and are overridden individually by
/// the per-field flags.
#[derive(Debug, Parser, Clone)]
struct CliArgs {
    /// JSON configuration file with field value sets.
    #[clap(long = "config")]
    config: Option<String>,
    /// Output trace file path.
    #[clap(long = "output", default_value = "hbm.trace")]
    output: String,
    /// Number of full sweeps over the field sets.
    #[clap(long = "repeat")]
    repeat: Option<u64>,
    /// Channel values to sweep (comma separated).
    #[clap(long = "channels", value_delimiter = ',')]
    channels: Option<Vec<u32>>,
    /// Pseudo-channel values to sweep (comma separated).
    #[clap(long = "pseudo-channels", value_delimiter = ',')]
    pseudo_channels: Option<Vec<u32>>,
    /// Bank group values to sweep (comma separated).
    #[clap(long = "bank-groups", value_delimiter = ',')]
    bank_groups: Option<Vec<u32>>,
    /// Bank values to sweep (comma separated).
    #[clap(long = "banks", value_delimiter = ',')]
    banks: Option<Vec<u32>>,
    /// Row values to sweep (comma separated).
    #[clap(long = "rows", value_delimiter = ',')]
    rows: Option<Vec<u32>>,
    /// Column values to sweep (comma separated).
    #[clap(long = "columns", value_delimiter = ',')]
    columns: Option<Vec<u32>>,
    /// Transaction id values to sweep (comma separated).
    #[clap(long = "txs", value_delimiter = ',')]
    txs: Option<Vec<u32>>,
    /// Access types emitted per combination (comma separated R/W codes).
    #[clap(long = "access", value_delimiter = ',')]
    access: Option<Vec<AccessType>>,
}

fn build_config(args: CliArgs) -> Result<TraceConfig> {
    let mut config = match &args.config {
        Some(path) => TraceConfig::from_jsonfile(path)
            .with_context(|| format!("failed to load config file {}", path))?,
        None => TraceConfig::default(),
    };
    if let Some(repeat) = args.repeat {
        config.repeat_count = repeat;
    }
    if let Some(channels) = args.channels {
        config.channels = channels;
    }
    if let Some(pseudo_channels) = args.pseudo_channels {
        config.pseudo_channels = pseudo_channels;
    }
    if let Some(bank_groups) = args.bank_groups {
        config.bank_groups = bank_groups;
    }
    if let Some(banks) = args.banks {
        config.banks = banks;
    }
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    if let Some(txs) = args.txs {
        config.txs = txs;
    }
    if let Some(access) = args.access {
        config.access_types = access;
    }
    Ok(config)
}

fn trace_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{wide_bar:40.cyan/blue} {pos:>8}/{len:<8} [{elapsed_precise} ({eta} remaining)]")
        .unwrap_or(ProgressStyle::default_bar())
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;

    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let output = args.output.clone();
    let config = build_config(args)?;

    let generator = TraceGenerator::new(config)?;
    info!(
        "generating {} trace entries to {}",
        generator.total_entries(),
        output
    );

    let bar = progress.add(ProgressBar::new(generator.total_entries()));
    bar.set_style(trace_bar_style());
    let generator = generator.with_progress(bar.clone());

    let written = generator.write_to(&output)?;
    bar.finish();
    info!("wrote {} lines to {}", written, output);

    Ok(())
}
