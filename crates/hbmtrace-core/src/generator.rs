use crate::addr::{HbmAddr, TraceEntry};
use crate::config::{ConfigError, TraceConfig};
use indicatif::ProgressBar;
use itertools::iproduct;
use log::{debug, info};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while generating a trace file.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The output file could not be created or written.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Generation was canceled through the cancel handle.
    #[error("trace generation was canceled")]
    Canceled,
}

/// Deterministic trace generator.
///
/// Sweeps the Cartesian product of the configured field value sets and
/// emits one trace line per combination. The nesting order, outer to
/// inner, is: repeat, column, bank, bank group, pseudo-channel, channel,
/// row, transaction id, access type. The same configuration always
/// produces a byte-identical file.
pub struct TraceGenerator {
    config: TraceConfig,
    progress: Option<ProgressBar>,
    canceled: Arc<AtomicBool>,
}

impl TraceGenerator {
    /// Creates a generator for the given configuration.
    ///
    /// # Errors
    ///
    /// Fails fast with a [`ConfigError`] before any output can be
    /// produced if the configuration is invalid.
    pub fn new(config: TraceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(TraceGenerator {
            config,
            progress: None,
            canceled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Attaches a progress bar advanced once per emitted entry.
    pub fn with_progress(self, progress: ProgressBar) -> Self {
        progress.set_length(self.total_entries());
        TraceGenerator {
            progress: Some(progress),
            ..self
        }
    }

    /// Returns the configuration this generator was built with.
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Returns a handle that cancels the running generation when set.
    ///
    /// The flag is checked at sweep boundaries; a canceled run reports
    /// [`GenerateError::Canceled`] and leaves no output file behind.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.canceled)
    }

    /// Returns the exact number of lines a full run emits: the product
    /// of all field-set cardinalities, the access-type count, and the
    /// repeat count.
    pub fn total_entries(&self) -> u64 {
        let c = &self.config;
        c.repeat_count
            * c.columns.len() as u64
            * c.banks.len() as u64
            * c.bank_groups.len() as u64
            * c.pseudo_channels.len() as u64
            * c.channels.len() as u64
            * c.rows.len() as u64
            * c.txs.len() as u64
            * c.access_types.len() as u64
    }

    /// Iterates one full sweep over the field sets in nesting order.
    pub fn sweep_entries(&self) -> impl Iterator<Item = TraceEntry> + '_ {
        let c = &self.config;
        iproduct!(
            &c.columns,
            &c.banks,
            &c.bank_groups,
            &c.pseudo_channels,
            &c.channels,
            &c.rows,
            &c.txs,
            &c.access_types
        )
        .map(
            |(&column, &bank, &bank_group, &pseudo_channel, &channel, &row, &tx, &access)| {
                TraceEntry {
                    addr: HbmAddr {
                        row,
                        bank,
                        bank_group,
                        pseudo_channel,
                        column,
                        channel,
                        tx,
                    },
                    access,
                }
            },
        )
    }

    /// Writes all repeat sweeps as trace lines to `writer`.
    ///
    /// Returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the writer and reports cancellation.
    pub fn emit<W: Write>(&self, writer: &mut W) -> Result<u64, GenerateError> {
        let mut written = 0u64;
        for sweep in 0..self.config.repeat_count {
            if self.canceled.load(Ordering::Relaxed) {
                debug!("cancel requested after {} of {} sweeps", sweep, self.config.repeat_count);
                return Err(GenerateError::Canceled);
            }
            for entry in self.sweep_entries() {
                writeln!(writer, "{}", entry)?;
                written += 1;
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
            }
        }
        Ok(written)
    }

    /// Generates the trace file at `path`.
    ///
    /// The trace is written to a temporary file in the destination
    /// directory and only renamed onto `path` once complete, so a failed
    /// or canceled run never leaves a partial file. An existing file at
    /// `path` is replaced.
    ///
    /// Returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be created or written,
    /// or if the run is canceled.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<u64, GenerateError> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(tmp);
        let written = self.emit(&mut writer)?;
        let tmp = writer
            .into_inner()
            .map_err(|e| GenerateError::Io(e.into_error()))?;
        tmp.persist(path).map_err(|e| GenerateError::Io(e.error))?;
        info!("wrote {} trace entries to {}", written, path.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::AccessType;

    fn singleton_config() -> TraceConfig {
        TraceConfig {
            repeat_count: 1,
            channels: vec![0],
            pseudo_channels: vec![0],
            bank_groups: vec![0],
            banks: vec![0],
            rows: vec![0],
            columns: vec![0],
            txs: vec![0],
            access_types: vec![AccessType::Read],
        }
    }

    fn emit_lines(generator: &TraceGenerator) -> Vec<String> {
        let mut out = Vec::new();
        let written = generator.emit(&mut out).expect("emit");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        assert_eq!(written, lines.len() as u64);
        lines
    }

    #[test]
    fn minimum_config_emits_one_line() {
        let generator = TraceGenerator::new(singleton_config()).expect("valid config");
        assert_eq!(generator.total_entries(), 1);
        assert_eq!(emit_lines(&generator), vec!["0x000000000 R"]);
    }

    #[test]
    fn line_count_matches_cardinality_product() {
        let config = TraceConfig {
            repeat_count: 2,
            channels: vec![0, 3],
            pseudo_channels: vec![0, 1],
            columns: vec![0, 1, 2],
            access_types: vec![AccessType::Read, AccessType::Write],
            ..singleton_config()
        };
        let generator = TraceGenerator::new(config).expect("valid config");
        assert_eq!(generator.total_entries(), 2 * 2 * 2 * 3 * 2);
        assert_eq!(
            emit_lines(&generator).len() as u64,
            generator.total_entries()
        );
    }

    #[test]
    fn nesting_order_is_column_outermost() {
        let config = TraceConfig {
            channels: vec![0, 1],
            columns: vec![0, 1],
            ..singleton_config()
        };
        let generator = TraceGenerator::new(config).expect("valid config");
        // column sits above channel in the packed word, so the column
        // loop being outermost gives monotonically increasing addresses
        assert_eq!(
            emit_lines(&generator),
            vec![
                "0x000000000 R",
                "0x000000020 R",
                "0x000000100 R",
                "0x000000120 R",
            ]
        );
    }

    #[test]
    fn access_types_are_innermost() {
        let config = TraceConfig {
            txs: vec![0, 1],
            access_types: vec![AccessType::Read, AccessType::Write],
            ..singleton_config()
        };
        let generator = TraceGenerator::new(config).expect("valid config");
        assert_eq!(
            emit_lines(&generator),
            vec![
                "0x000000000 R",
                "0x000000000 W",
                "0x000000001 R",
                "0x000000001 W",
            ]
        );
    }

    #[test]
    fn repeat_count_duplicates_the_sweep() {
        let config = TraceConfig {
            repeat_count: 3,
            ..singleton_config()
        };
        let generator = TraceGenerator::new(config).expect("valid config");
        assert_eq!(
            emit_lines(&generator),
            vec!["0x000000000 R"; 3]
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = TraceConfig {
            txs: vec![32],
            ..singleton_config()
        };
        assert!(matches!(
            TraceGenerator::new(config),
            Err(ConfigError::ValueOutOfRange { field: "txs", .. })
        ));
    }

    #[test]
    fn cancel_aborts_at_sweep_boundary() {
        let generator = TraceGenerator::new(singleton_config()).expect("valid config");
        generator.cancel_handle().store(true, Ordering::Relaxed);
        let mut out = Vec::new();
        assert!(matches!(
            generator.emit(&mut out),
            Err(GenerateError::Canceled)
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn round_trip_reproduces_every_tuple() {
        let config = TraceConfig {
            channels: vec![2, 5],
            pseudo_channels: vec![1],
            bank_groups: vec![0, 3],
            banks: vec![1],
            rows: vec![0, 9000],
            columns: vec![7],
            txs: vec![0, 31],
            ..singleton_config()
        };
        let generator = TraceGenerator::new(config).expect("valid config");
        for entry in generator.sweep_entries() {
            assert_eq!(HbmAddr::from_packed(entry.addr.pack()), entry.addr);
        }
    }
}
