//! # hbmtrace
//!
//! `hbmtrace` generates HBM memory-trace files for memory-system
//! simulators. It sweeps the Cartesian product of configured address
//! field value sets (row, bank, bank group, pseudo-channel, column,
//! channel, transaction id) and writes each combination as a packed
//! hexadecimal address plus a read/write tag, one line per access.
//!
//! Run `hbmtrace --help` to see the available options. Without any
//! options the binary reproduces the default sweep (all channels,
//! pseudo-channels, bank groups, and columns of row 0, bank 0) and
//! writes it to `hbm.trace`. Field value sets can be supplied through a
//! JSON config file (`--config`) or overridden per field on the command
//! line.
//!
//! The heavy lifting lives in the `hbmtrace-core` crate; this crate only
//! adds argument parsing, logging, and progress reporting.

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Initializes `env_logger` bridged with an indicatif [`MultiProgress`]
/// so log lines and progress bars do not clobber each other.
pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    Ok(progress)
}
