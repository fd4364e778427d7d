//! # hbmtrace Core
//!
//! `hbmtrace-core` is the library behind the `hbmtrace` memory-trace
//! generator. It enumerates every combination of HBM address field values
//! across configured value sets and writes each combination, packed into a
//! 32-bit physical address word, as one line of a trace file consumed by
//! memory-system simulators.
//!
//! ## Main Components
//!
//! - [`addr`] module - The HBM address model: field widths and positions,
//!   [`HbmAddr`] packing and decoding, and the [`TraceEntry`] line format.
//!
//! - [`config`] module - [`TraceConfig`], the immutable value describing a
//!   generation run, loadable from JSON with per-field defaults, and its
//!   fail-fast validation.
//!
//! - [`generator`] module - [`TraceGenerator`], which sweeps the Cartesian
//!   product of the configured value sets in a fixed nesting order and
//!   writes the trace file atomically.
//!
//! Generation is single-threaded and fully deterministic: the same
//! configuration always produces a byte-identical file.

#![warn(missing_docs)]

pub mod addr;
pub mod config;
pub mod generator;

pub use crate::addr::{AccessType, HbmAddr, TraceEntry};
pub use crate::config::{ConfigError, ConfigFileError, TraceConfig};
pub use crate::generator::{GenerateError, TraceGenerator};
