//! Installs a Python wheel into a set of destination directories, producing the
//! resulting `RECORD` manifest.
//!
//! This crate implements the mechanical half of PEP 427/PEP 376 wheel installation:
//! reading a wheel's `.dist-info` metadata, copying its members into the right
//! filesystem locations for their scheme, rewriting entry-point scripts into runnable
//! launchers, and writing the installed-file manifest back out. It does not resolve
//! dependencies, fetch anything over the network, manage virtual environments, verify
//! signatures, or uninstall — callers that need those build them on top.
//!
//! The pieces:
//!
//! - [`record`] — the `RECORD` codec (PEP 376).
//! - [`hash`] — named hash algorithms and streaming hash-and-copy.
//! - [`filename`] — distribution name/version from a `.whl` filename.
//! - [`wheel_metadata`] — the `WHEEL` file (format version, purelib/platlib).
//! - [`entry_points`] — `entry_points.txt` parsing into console/GUI scripts.
//! - [`launcher`] — POSIX shebang rewriting and Windows launcher EXE construction.
//! - [`source`] — the [`source::WheelSource`] trait and its ZIP-backed implementation.
//! - [`destination`] — the [`destination::Destination`] trait and a scheme-dict
//!   implementation.
//! - [`interpreter`] — the target interpreter/platform contract installation runs against.
//! - [`engine`] — orchestrates the above into a single [`engine::install`] call.

pub mod destination;
pub mod engine;
pub mod entry_points;
pub mod filename;
pub mod hash;
pub mod interpreter;
pub mod launcher;
pub mod record;
pub mod source;
pub mod wheel_metadata;

use std::io;
use std::path::PathBuf;

pub use engine::install;

/// Everything that can go wrong while installing a wheel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid wheel filename `{0}`: expected `{{name}}-{{version}}(-{{build}})?-{{tag}}.whl`")]
    WheelFilename(String),

    #[error("`{0}` is not a valid wheel source: {1}")]
    InvalidWheelSource(PathBuf, String),

    #[error("wheel declares format version {found}, only major version 1 is supported")]
    UnsupportedWheelVersion { found: String },

    #[error("malformed RECORD entry on line {line}: `{content}`")]
    InvalidRecordEntry { line: usize, content: String },

    #[error("RECORD entry `{path}` does not match the installed file: {reason}")]
    RecordMismatch { path: String, reason: String },

    #[error("invalid entry point script `{name}`: {reason}")]
    InvalidScript { name: String, reason: String },

    #[error("destination could not write `{path}`: {source}")]
    Destination {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("RECORD CSV error on line {line}: {source}")]
    RecordCsv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("malformed WHEEL metadata: {0}")]
    WheelMetadata(String),

    #[error("malformed entry_points.txt: {0}")]
    EntryPoints(String),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
