use crate::addr::{
    AccessType, BANK_BITS, BANK_GROUP_BITS, CHANNEL_BITS, COLUMN_BITS, PSEUDO_CHANNEL_BITS,
    ROW_BITS, TX_BITS, field_mask,
};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a trace configuration file.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors reported by [`TraceConfig::validate`].
///
/// A value wider than its field would silently overflow into the adjacent
/// field during packing, so validation rejects it before any output is
/// written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field value does not fit the declared bit width.
    #[error("{field} value {value} exceeds the {width}-bit field width")]
    ValueOutOfRange {
        /// Name of the offending configuration field
        field: &'static str,
        /// The rejected value
        value: u32,
        /// Declared bit width of the field
        width: u32,
    },
    /// A value set or the access-type list is empty.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending configuration field
        field: &'static str,
    },
    /// The repeat count is zero.
    #[error("repeat_count must be positive")]
    ZeroRepeat,
}

/// Trace generator configuration: the value sets to sweep for each HBM
/// address field, the access types to emit, and the sweep repeat count.
///
/// All seven address fields are explicit value sets. The `Default`
/// configuration sweeps every channel, pseudo-channel, bank group, and
/// column of a single row/bank/transaction with read accesses only.
///
/// Loaded from JSON files; absent fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Number of full sweeps over the field sets
    pub repeat_count: u64,
    /// Channel values, each in `[0, 7]`
    pub channels: Vec<u32>,
    /// Pseudo-channel values, each in `[0, 1]`
    pub pseudo_channels: Vec<u32>,
    /// Bank group values, each in `[0, 3]`
    pub bank_groups: Vec<u32>,
    /// Bank values, each in `[0, 3]`
    pub banks: Vec<u32>,
    /// Row values, each in `[0, 2^14 - 1]`
    pub rows: Vec<u32>,
    /// Column values, each in `[0, 31]`
    pub columns: Vec<u32>,
    /// Transaction id values, each in `[0, 31]`
    pub txs: Vec<u32>,
    /// Access types emitted for every field combination, in order
    pub access_types: Vec<AccessType>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            repeat_count: 1,
            channels: (0..8).collect(),
            pseudo_channels: vec![0, 1],
            bank_groups: (0..4).collect(),
            banks: vec![0],
            rows: vec![0],
            columns: (0..32).collect(),
            txs: vec![0],
            access_types: vec![AccessType::Read],
        }
    }
}

impl TraceConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Fields missing from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_jsonfile(filepath: impl AsRef<Path>) -> Result<TraceConfig, ConfigFileError> {
        let mut file = File::open(filepath.as_ref())?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config: TraceConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Checks every value set against its field's declared bit width.
    ///
    /// # Errors
    ///
    /// Returns the first offending field and value, an empty value set,
    /// or a zero repeat count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repeat_count == 0 {
            return Err(ConfigError::ZeroRepeat);
        }
        check_field("channels", &self.channels, CHANNEL_BITS)?;
        check_field("pseudo_channels", &self.pseudo_channels, PSEUDO_CHANNEL_BITS)?;
        check_field("bank_groups", &self.bank_groups, BANK_GROUP_BITS)?;
        check_field("banks", &self.banks, BANK_BITS)?;
        check_field("rows", &self.rows, ROW_BITS)?;
        check_field("columns", &self.columns, COLUMN_BITS)?;
        check_field("txs", &self.txs, TX_BITS)?;
        if self.access_types.is_empty() {
            return Err(ConfigError::EmptyField {
                field: "access_types",
            });
        }
        Ok(())
    }
}

fn check_field(field: &'static str, values: &[u32], width: u32) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::EmptyField { field });
    }
    match values.iter().find(|&&value| value > field_mask(width)) {
        Some(&value) => Err(ConfigError::ValueOutOfRange {
            field,
            value,
            width,
        }),
        None => Ok(()),
    }
}
