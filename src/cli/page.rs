use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::cli::{open_space, wprintln, write_json};
use crate::innodb::checksum::{self, ChecksumStatus};
use crate::innodb::constants::DICT_HDR_PAGE_NO;
use crate::innodb::dictionary::{DataDictionary, DictionaryHeader};
use crate::innodb::index::{FsegHeader, IndexHeader, IndexPage, Record, SpaceUsage};
use crate::innodb::page::{FilHeader, FilTrailer, FspHeader, Page};
use crate::innodb::page_types::PageType;
use crate::innodb::record::RecordHeader;
use crate::innodb::schema::RecordDescriber;
use crate::innodb::space::{PageStore, Space};
use crate::util::hex::{format_hex32, format_offset, hex_dump};
use crate::IdbError;

/// Options for the `ibread page` subcommand.
pub struct PageOptions {
    /// Data files of the space, in order.
    pub files: Vec<String>,
    pub page: u64,
    /// Append a hex dump of the page.
    pub hex: bool,
    pub json: bool,
    pub mmap: bool,
}

#[derive(Serialize)]
struct PageJson {
    page_number: u64,
    header: FilHeader,
    page_type_name: &'static str,
    page_type_description: &'static str,
    byte_start: u64,
    checksum: ChecksumStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    trailer: Option<FilTrailer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fsp_header: Option<FspHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dictionary_header: Option<DictionaryHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexJson>,
}

#[derive(Serialize)]
struct IndexJson {
    header: IndexHeader,
    row_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    leaf_segment: Option<FsegHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    internal_segment: Option<FsegHeader>,
    infimum: RecordHeader,
    supremum: RecordHeader,
    space_usage: SpaceUsage,
    records: Vec<PageRecord>,
}

/// A record listed on a page: fully decoded, header-only, or failed.
#[derive(Serialize)]
#[serde(untagged)]
enum PageRecord {
    Decoded(Record),
    Header { header: RecordHeader },
    Failed { error: String },
}

/// Dump one page of a space.
///
/// INDEX pages of the system space are decoded with the column layout the
/// catalog records for their index id; anything the catalog cannot describe
/// is listed header-only.
pub fn execute(opts: &PageOptions, writer: &mut dyn Write) -> Result<(), IdbError> {
    let space = open_space(&opts.files, opts.mmap)?;
    let page = space.read_page(opts.page)?;
    let describer = lookup_describer(&space, &page);

    if opts.json {
        let json = page_json(&space, &page, describer.as_ref())?;
        return write_json(writer, &json);
    }

    print_fil(writer, &space, &page)?;

    if page.page_type() == PageType::FspHdr {
        if let Some(fsp) = FspHeader::parse(page.data()) {
            print_fsp(writer, &fsp)?;
        }
    }
    if let Some(dict) = dictionary_header(&space, &page) {
        print_dictionary_header(writer, &dict)?;
    }
    if page.page_type() == PageType::Index {
        let mut index = IndexPage::open(page.clone())?;
        if let Some(d) = describer.as_ref() {
            index = index.with_describer(d);
        }
        print_index(writer, &index)?;
    }

    print_trailer(writer, &page)?;

    if opts.hex {
        wprintln!(writer)?;
        wprintln!(writer, "{}", hex_dump(page.data(), page.number() * space.page_size() as u64))?;
    }
    Ok(())
}

fn lookup_describer(space: &Space, page: &Page) -> Option<RecordDescriber> {
    if page.page_type() != PageType::Index || !space.is_system_space() {
        return None;
    }
    let index_id = IndexHeader::parse(page.data())?.index_id;
    let dict = match DataDictionary::new(space) {
        Ok(dict) => dict,
        Err(e) => {
            debug!(error = %e, "no data dictionary, listing record headers only");
            return None;
        }
    };
    match dict.record_describer_by_index_id(index_id) {
        Ok(describer) => describer,
        Err(e) => {
            debug!(index_id, error = %e, "could not resolve index layout");
            None
        }
    }
}

fn dictionary_header(space: &Space, page: &Page) -> Option<DictionaryHeader> {
    if !space.is_system_space()
        || page.number() != DICT_HDR_PAGE_NO
        || page.page_type() != PageType::Sys
    {
        return None;
    }
    DictionaryHeader::parse(page).ok()
}

fn list_records(index: &IndexPage<'_>) -> Vec<PageRecord> {
    index
        .cursor()
        .map(|record| match record {
            Ok(record) if record.is_header_only() => PageRecord::Header {
                header: record.header,
            },
            Ok(record) => PageRecord::Decoded(record),
            Err(e) => PageRecord::Failed {
                error: e.to_string(),
            },
        })
        .collect()
}

fn page_json(
    space: &Space,
    page: &Page,
    describer: Option<&RecordDescriber>,
) -> Result<PageJson, IdbError> {
    let index = if page.page_type() == PageType::Index {
        let mut index = IndexPage::open(page.clone())?;
        if let Some(d) = describer {
            index = index.with_describer(d);
        }
        Some(IndexJson {
            header: index.header().clone(),
            row_format: index.row_format().name(),
            leaf_segment: index.leaf_segment(),
            internal_segment: index.internal_segment(),
            infimum: index.infimum()?,
            supremum: index.supremum()?,
            space_usage: index.space_usage(),
            records: list_records(&index),
        })
    } else {
        None
    };

    Ok(PageJson {
        page_number: page.number(),
        header: page.header().clone(),
        page_type_name: page.page_type().name(),
        page_type_description: page.page_type().description(),
        byte_start: page.number() * space.page_size() as u64,
        checksum: checksum::inspect(page.data()),
        trailer: page.trailer(),
        fsp_header: if page.page_type() == PageType::FspHdr {
            FspHeader::parse(page.data())
        } else {
            None
        },
        dictionary_header: dictionary_header(space, page),
        index,
    })
}

fn print_fil(writer: &mut dyn Write, space: &Space, page: &Page) -> Result<(), IdbError> {
    let header = page.header();
    wprintln!(writer, "{}", format!("=== HEADER: Page {}", page.number()).bold())?;
    wprintln!(writer, "Byte Start: {}", format_offset(page.number() * space.page_size() as u64))?;
    wprintln!(
        writer,
        "Page Type: {} ({}) - {}",
        page.page_type().name(),
        page.page_type().as_u16(),
        page.page_type().description()
    )?;
    wprintln!(writer, "Space ID: {}", header.space_id)?;
    wprintln!(writer, "Page Number: {}", header.page_number)?;
    wprintln!(
        writer,
        "Prev Page: {}",
        if header.has_prev() { header.prev_page.to_string() } else { "none".to_string() }
    )?;
    wprintln!(
        writer,
        "Next Page: {}",
        if header.has_next() { header.next_page.to_string() } else { "none".to_string() }
    )?;
    wprintln!(writer, "LSN: {}", header.lsn)?;

    let status = checksum::inspect(page.data());
    let label = match status {
        ChecksumStatus::Crc32c { .. } => "OK (crc32c)".green().to_string(),
        ChecksumStatus::Empty => "EMPTY".green().to_string(),
        ChecksumStatus::Disabled => "DISABLED".yellow().to_string(),
        ChecksumStatus::Truncated => "TRUNCATED".red().to_string(),
        ChecksumStatus::Mismatch { crc32c, .. } => {
            format!("MISMATCH (crc32c {})", format_hex32(crc32c)).red().to_string()
        }
    };
    wprintln!(writer, "Checksum: {} {}", format_hex32(header.checksum), label)?;
    Ok(())
}

fn print_fsp(writer: &mut dyn Write, fsp: &FspHeader) -> Result<(), IdbError> {
    wprintln!(writer)?;
    wprintln!(writer, "{}", "=== FSP_HDR - Filespace Header".bold())?;
    wprintln!(writer, "Space ID: {}", fsp.space_id)?;
    wprintln!(writer, "Size (pages): {}", fsp.size)?;
    wprintln!(writer, "Page Free Limit: {}", fsp.free_limit)?;
    wprintln!(writer, "Flags: {}", format_hex32(fsp.flags))?;
    wprintln!(writer, "Fragment Pages Used: {}", fsp.frag_n_used)?;
    Ok(())
}

fn print_dictionary_header(
    writer: &mut dyn Write,
    dict: &DictionaryHeader,
) -> Result<(), IdbError> {
    wprintln!(writer)?;
    wprintln!(writer, "{}", "=== Data Dictionary Header".bold())?;
    wprintln!(writer, "Max Row ID: {}", dict.max_row_id)?;
    wprintln!(writer, "Max Table ID: {}", dict.max_table_id)?;
    wprintln!(writer, "Max Index ID: {}", dict.max_index_id)?;
    wprintln!(writer, "Max Space ID: {}", dict.max_space_id)?;
    wprintln!(writer, "SYS_TABLES root: {}", dict.roots.sys_tables)?;
    wprintln!(writer, "SYS_TABLE_IDS root: {}", dict.roots.sys_table_ids)?;
    wprintln!(writer, "SYS_COLUMNS root: {}", dict.roots.sys_columns)?;
    wprintln!(writer, "SYS_INDEXES root: {}", dict.roots.sys_indexes)?;
    wprintln!(writer, "SYS_FIELDS root: {}", dict.roots.sys_fields)?;
    Ok(())
}

fn print_fseg(writer: &mut dyn Write, label: &str, fseg: &FsegHeader) -> Result<(), IdbError> {
    wprintln!(
        writer,
        "{}: space {} page {} offset {}",
        label,
        fseg.space_id,
        fseg.page_no,
        fseg.offset
    )
}

fn print_index(writer: &mut dyn Write, index: &IndexPage<'_>) -> Result<(), IdbError> {
    let idx = index.header();
    wprintln!(writer)?;
    wprintln!(writer, "{}", format!("=== INDEX Header: Page {}", index.number()).bold())?;
    wprintln!(writer, "Index ID: {}", idx.index_id)?;
    wprintln!(writer, "Node Level: {}", idx.level)?;
    wprintln!(writer, "Row Format: {}", index.row_format().name())?;
    if idx.max_trx_id > 0 {
        wprintln!(writer, "Max Transaction ID: {}", idx.max_trx_id)?;
    }
    wprintln!(writer, "Directory Slots: {}", idx.n_dir_slots)?;
    wprintln!(writer, "Heap Top: {}", idx.heap_top)?;
    wprintln!(writer, "Records in Page: {}", idx.n_recs)?;
    wprintln!(writer, "Records in Heap: {}", idx.n_heap())?;
    wprintln!(writer, "Start of Free Record List: {}", idx.free)?;
    wprintln!(writer, "Garbage Bytes: {}", idx.garbage)?;
    wprintln!(writer, "Last Insert: {}", idx.last_insert)?;
    wprintln!(
        writer,
        "Last Insert Direction: {} - {}",
        idx.direction,
        idx.direction_name()
    )?;
    wprintln!(writer, "Inserts in this direction: {}", idx.n_direction)?;

    if index.is_root() {
        wprintln!(writer)?;
        wprintln!(writer, "{}", "=== FSEG_HDR - File Segment Headers".bold())?;
        if let Some(leaf) = index.leaf_segment() {
            print_fseg(writer, "Leaf segment", &leaf)?;
        }
        if let Some(internal) = index.internal_segment() {
            print_fseg(writer, "Non-leaf segment", &internal)?;
        }
    }

    let infimum = index.infimum()?;
    let supremum = index.supremum()?;
    wprintln!(writer)?;
    wprintln!(writer, "{}", "=== System Records".bold())?;
    wprintln!(
        writer,
        "Infimum: offset {} next {} owned {}",
        infimum.offset,
        infimum.next,
        infimum.n_owned
    )?;
    wprintln!(
        writer,
        "Supremum: offset {} owned {}",
        supremum.offset,
        supremum.n_owned
    )?;

    let usage = index.space_usage();
    wprintln!(writer)?;
    wprintln!(writer, "{}", "=== Space Usage".bold())?;
    wprintln!(writer, "Header: {}", usage.header)?;
    wprintln!(writer, "Records: {} ({} garbage)", usage.records, usage.garbage)?;
    wprintln!(writer, "Directory: {}", usage.directory)?;
    wprintln!(writer, "Trailer: {}", usage.trailer)?;
    wprintln!(writer, "Free: {}", usage.free)?;

    wprintln!(writer)?;
    wprintln!(writer, "{}", "=== Records".bold())?;
    for entry in list_records(index) {
        match entry {
            PageRecord::Decoded(record) => print_record(writer, &record)?,
            PageRecord::Header { header } => {
                wprintln!(
                    writer,
                    "{:>6} {:<12} heap {} next {}{}",
                    header.offset,
                    header.record_type.name(),
                    header.heap_number,
                    header.next,
                    if header.is_deleted() { " (deleted)" } else { "" }
                )?;
            }
            PageRecord::Failed { error } => {
                wprintln!(writer, "{:>6} {}", "?", error.red())?;
            }
        }
    }
    Ok(())
}

fn print_record(writer: &mut dyn Write, record: &Record) -> Result<(), IdbError> {
    let fields: Vec<String> = record
        .fields()
        .map(|f| format!("{}={}", f.name, f.value))
        .collect();
    let child = match record.child_page_number {
        Some(child) => format!(" -> page {}", child),
        None => String::new(),
    };
    wprintln!(
        writer,
        "{:>6} {:<12} {}{}{}",
        record.offset,
        record.record_type().name(),
        fields.join(" "),
        child,
        if record.header.is_deleted() { " (deleted)".yellow().to_string() } else { String::new() }
    )
}

fn print_trailer(writer: &mut dyn Write, page: &Page) -> Result<(), IdbError> {
    if let Some(trailer) = page.trailer() {
        wprintln!(writer)?;
        wprintln!(writer, "{}", format!("=== TRAILER: Page {}", page.number()).bold())?;
        wprintln!(writer, "Old-style Checksum: {}", format_hex32(trailer.checksum))?;
        wprintln!(writer, "Low 32 bits of LSN: {}", trailer.lsn_low32)?;
        let lsn_ok = trailer.lsn_low32 == (page.header().lsn & 0xFFFF_FFFF) as u32;
        wprintln!(
            writer,
            "LSN Consistency: {}",
            if lsn_ok { "OK".green() } else { "MISMATCH".red() }
        )?;
    }
    Ok(())
}
