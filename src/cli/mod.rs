//! CLI subcommand implementations for the `ibread` binary.
//!
//! Argument parsing uses clap derive macros. The top-level [`app::Cli`]
//! struct and [`app::Commands`] enum live in [`app`] and are shared between
//! `main.rs` and `build.rs` (for man page generation) via `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options` struct holding
//! the parsed arguments and a `pub fn execute(opts, writer) -> Result<(), IdbError>`
//! entry point. The `writer: &mut dyn Write` parameter allows output to be
//! captured in tests or redirected to a file via the global `--output` flag.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `ibread page` | [`page`] | FIL header, checksum and type-specific structures of one page |
//! | `ibread system-spaces` | [`system_spaces`] | System space summary and catalog table list |
//! | `ibread records` | [`records`] | Decoded records of one index |
//!
//! Logging goes to stderr through `tracing`; raise it with `-v` or `RUST_LOG`.
//! The `wprintln!` macro wraps `writeln!` to convert `io::Error` into
//! `IdbError`.

pub mod app;
pub mod page;
pub mod records;
pub mod system_spaces;

/// Write a line to the given writer, converting io::Error to IdbError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::IdbError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::IdbError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use std::io::Write;

use crate::innodb::space::Space;
use crate::IdbError;
use indicatif::{ProgressBar, ProgressStyle};

/// Open the data files of a space, selecting mmap or buffered I/O.
pub(crate) fn open_space(files: &[String], use_mmap: bool) -> Result<Space, IdbError> {
    if files.is_empty() {
        return Err(IdbError::Argument(
            "At least one data file is required".to_string(),
        ));
    }
    if use_mmap {
        Space::open_mmap(files)
    } else {
        Space::open(files)
    }
}

/// Serialize `value` as pretty JSON and write it out.
pub(crate) fn write_json<T: serde::Serialize>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), IdbError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| IdbError::Parse(format!("JSON serialization error: {}", e)))?;
    wprintln!(writer, "{}", json)
}

/// Create a spinner counting processed items of unknown total.
pub(crate) fn create_spinner(unit: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template(&format!("{{spinner:.green}} {{pos}} {} ({{elapsed}})", unit))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb
}
