use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::dictionary::DataDictionary;
use crate::innodb::space::{PageStore, Space};
use crate::IdbError;

/// Options for the `ibread system-spaces` subcommand.
pub struct SystemSpacesOptions {
    pub files: Vec<String>,
    pub json: bool,
    pub mmap: bool,
}

/// Summary of a system space and its catalog.
#[derive(Debug, Serialize)]
pub struct SystemSpaceSummary {
    pub name: String,
    pub pages: u64,
    pub page_size: u32,
    pub files: usize,
    /// Index trees rooted in the space according to SYS_INDEXES.
    pub btreeindexes: usize,
    pub max_table_id: u64,
    pub max_index_id: u64,
    pub tables: Vec<String>,
}

/// Collect the summary for an opened system space.
pub fn summarize(space: &Space) -> Result<SystemSpaceSummary, IdbError> {
    let dict = DataDictionary::new(space)?;
    let btreeindexes = dict.each_index_root_page_number(space.space_id())?.len();
    Ok(SystemSpaceSummary {
        name: space.name().to_string(),
        pages: space.page_count(),
        page_size: space.page_size(),
        files: space.file_count(),
        btreeindexes,
        max_table_id: dict.header().max_table_id,
        max_index_id: dict.header().max_index_id,
        tables: dict.each_table_name()?,
    })
}

pub fn execute(opts: &SystemSpacesOptions, writer: &mut dyn Write) -> Result<(), IdbError> {
    let space = open_space(&opts.files, opts.mmap)?;
    let summary = summarize(&space)?;

    if opts.json {
        return write_json(writer, &summary);
    }

    wprintln!(
        writer,
        "{:<32} {:>10} {:>14}",
        "name".bold(),
        "pages".bold(),
        "btreeindexes".bold()
    )?;
    wprintln!(
        writer,
        "{:<32} {:>10} {:>14}",
        summary.name,
        summary.pages,
        summary.btreeindexes
    )?;
    wprintln!(writer)?;
    wprintln!(
        writer,
        "Page size {} across {} file(s); max table id {}, max index id {}",
        summary.page_size,
        summary.files,
        summary.max_table_id,
        summary.max_index_id
    )?;
    wprintln!(writer)?;
    wprintln!(writer, "{}", format!("Tables ({})", summary.tables.len()).bold())?;
    for table in &summary.tables {
        wprintln!(writer, "  {}", table)?;
    }
    Ok(())
}
