//! Forensic reader for InnoDB tablespaces.
//!
//! The `innodb-reader` crate (library name `ibr`) reads raw InnoDB data
//! files (`ibdata*`, `.ibd`) without a running server. It parses pages,
//! walks B+Tree indexes, bootstraps the InnoDB data dictionary from its
//! hardcoded catalog layout, and decodes rows into typed values.
//!
//! # CLI Reference
//!
//! The `ibread` binary exposes the library from the command line.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`ibread page`](cli::app::Commands::Page) | Dump one page: FIL header, checksum and type-specific body |
//! | [`ibread system-spaces`](cli::app::Commands::SystemSpaces) | Summarize the system space and list tables from the catalog |
//! | [`ibread records`](cli::app::Commands::Records) | Decode the records of a table's index |
//! | [`ibread completions`](cli::app::Commands::Completions) | Generate shell completions |
//!
//! All subcommands accept `--color <auto|always|never>`, `--output <file>`,
//! `-v` (repeatable, raises log verbosity) and `--mmap`. Each subcommand
//! takes `--json` for machine-readable output.
//!
//! # Library API
//!
//! ```toml
//! [dependencies]
//! ibr = { package = "innodb-reader", version = "0.3", default-features = false }
//! ```
//!
//! ## Quick example
//!
//! ```no_run
//! use ibr::innodb::dictionary::DataDictionary;
//! use ibr::innodb::space::Space;
//!
//! let space = Space::open(&["ibdata1"]).unwrap();
//! let dict = DataDictionary::new(&space).unwrap();
//! for name in dict.each_table_name().unwrap() {
//!     println!("{}", name);
//! }
//!
//! let index = dict.index_tree_for("test/t", "PRIMARY").unwrap();
//! for record in index.each_record().unwrap() {
//!     println!("{:?}", record.to_map());
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`innodb::space`] | `PageStore` trait and the multi-file `Space` |
//! | [`innodb::page`] | FIL header/trailer, FSP header, `Page` |
//! | [`innodb::page_types`] | Page type codes |
//! | [`innodb::checksum`] | CRC-32C checksum inspection |
//! | [`innodb::record`] | Compact and redundant record headers |
//! | [`innodb::field_decode`] | Column value decoding |
//! | [`innodb::schema`] | Data types and record describers |
//! | [`innodb::index`] | INDEX page header and record decoding |
//! | [`innodb::cursor`] | Record chain iteration |
//! | [`innodb::btree`] | B+Tree descent and leaf scans |
//! | [`innodb::dictionary`] | Data dictionary bootstrap and schema resolution |
//! | [`innodb::constants`] | On-disk constants |
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | on | The `ibread` binary, memory-mapped I/O and terminal output. |

#[cfg(feature = "cli")]
pub mod cli;
pub mod innodb;
pub mod util;

use thiserror::Error;

/// Errors returned by `ibr` operations.
#[derive(Error, Debug)]
pub enum IdbError {
    /// An I/O error occurred (file open, read or seek failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed binary data or a read outside a page.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (out-of-range page number, bad option, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// A column type this reader cannot interpret.
    #[error("Unknown data type: {type_name}")]
    UnknownDataType { type_name: String },

    /// A node pointer has no child page number because no schema gives its key widths.
    #[error("Schema required to decode record at offset {offset} on page {page}")]
    SchemaRequired { page: u64, offset: usize },

    /// No catalog entry describes this index.
    #[error("No known schema for index id {index_id}")]
    UnresolvedSchema { index_id: u64 },

    /// A child or sibling link is out of range, loops, or crosses levels.
    #[error("Corrupt index at page {page}: {reason}")]
    MalformedLink { page: u64, reason: String },
}
