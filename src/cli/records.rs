use std::collections::BTreeMap;
use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{create_spinner, open_space, wprintln, write_json};
use crate::innodb::btree::{BTreeIndex, ScanMode};
use crate::innodb::dictionary::DataDictionary;
use crate::innodb::field_decode::FieldValue;
use crate::innodb::index::Record;
use crate::innodb::space::{PageStore, Space};
use crate::IdbError;

/// Options for the `ibread records` subcommand.
pub struct RecordsOptions {
    /// Data files of the system space, in order.
    pub files: Vec<String>,
    pub table: Option<String>,
    pub index: String,
    /// Root page override; records are then decoded without a schema.
    pub root: Option<u64>,
    /// File-per-table tablespace holding the index.
    pub tablespace: Option<String>,
    pub skip_errors: bool,
    pub json: bool,
    pub mmap: bool,
}

#[derive(Serialize)]
struct RecordsJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<String>,
    index: String,
    root_page: u64,
    index_id: u64,
    records: Vec<RecordJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct RecordJson {
    offset: usize,
    heap_number: u16,
    deleted: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, FieldValue>,
}

impl From<&Record> for RecordJson {
    fn from(record: &Record) -> Self {
        RecordJson {
            offset: record.offset,
            heap_number: record.header.heap_number,
            deleted: record.header.is_deleted(),
            fields: record.to_map(),
        }
    }
}

pub fn execute(opts: &RecordsOptions, writer: &mut dyn Write) -> Result<(), IdbError> {
    let system = open_space(&opts.files, opts.mmap)?;
    let tablespace = match &opts.tablespace {
        Some(path) => Some(open_space(std::slice::from_ref(path), opts.mmap)?),
        None => None,
    };
    let store: &dyn PageStore = match &tablespace {
        Some(ts) => ts,
        None => &system,
    };

    let tree = open_tree(opts, &system, tablespace.as_ref(), store)?;
    let mode = if opts.skip_errors {
        ScanMode::SkipErrors
    } else {
        ScanMode::Abort
    };

    let outcome = if opts.json {
        tree.scan(mode)?
    } else {
        let pb = create_spinner("leaf pages");
        let outcome = tree.scan_with(mode, |_| pb.inc(1));
        pb.finish_and_clear();
        outcome?
    };
    info!(
        root = tree.root(),
        records = outcome.records.len(),
        errors = outcome.errors.len(),
        "index scanned"
    );

    if opts.json {
        let json = RecordsJson {
            table: opts.table.clone(),
            index: opts.index.clone(),
            root_page: tree.root(),
            index_id: tree.index_id()?,
            records: outcome.records.iter().map(RecordJson::from).collect(),
            errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
        };
        return write_json(writer, &json);
    }

    for record in &outcome.records {
        print_record(writer, record)?;
    }
    wprintln!(writer)?;
    wprintln!(
        writer,
        "{} record(s) from root page {}",
        outcome.records.len(),
        tree.root()
    )?;
    if !outcome.errors.is_empty() {
        wprintln!(
            writer,
            "{}",
            format!("{} error(s) skipped", outcome.errors.len()).yellow()
        )?;
        for e in &outcome.errors {
            wprintln!(writer, "  {}", e.to_string().red())?;
        }
    }
    Ok(())
}

fn open_tree<'s>(
    opts: &RecordsOptions,
    system: &'s Space,
    tablespace: Option<&'s Space>,
    store: &'s dyn PageStore,
) -> Result<BTreeIndex<'s>, IdbError> {
    if let Some(root) = opts.root {
        warn!(root, "no schema for a bare root page, records are decoded header-only");
        return BTreeIndex::open(store, root, None);
    }

    let table = opts.table.as_deref().ok_or_else(|| {
        IdbError::Argument("Either --table or --root is required".to_string())
    })?;
    let dict = DataDictionary::new(system)?;
    match tablespace {
        Some(ts) => dict.user_index_tree(ts, table, &opts.index),
        None => dict.index_tree_for(table, &opts.index),
    }
}

fn print_record(writer: &mut dyn Write, record: &Record) -> Result<(), IdbError> {
    let marker = if record.header.is_deleted() {
        " (deleted)".yellow().to_string()
    } else {
        String::new()
    };
    if record.is_header_only() {
        return wprintln!(
            writer,
            "offset {} heap {}{}",
            record.offset,
            record.header.heap_number,
            marker
        );
    }
    let fields: Vec<String> = record
        .fields()
        .map(|f| format!("{}={}", f.name.bold(), f.value))
        .collect();
    wprintln!(writer, "{}{}", fields.join(" "), marker)
}
