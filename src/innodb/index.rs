//! INDEX page internal structure parsing.
//!
//! INDEX pages (page type 17855 / `FIL_PAGE_INDEX`) are the B+Tree nodes that
//! store table data and secondary index entries. Each INDEX page contains a
//! 36-byte [`IndexHeader`] at `FIL_PAGE_DATA` (byte 38), followed by two
//! 10-byte FSEG inode pointers ([`FsegHeader`]) for the leaf and non-leaf
//! segments, and the infimum/supremum system records.
//!
//! [`IndexPage`] ties a page to an optional [`RecordDescriber`] and decodes
//! whole records: header first, then each column in describer order.

use std::collections::BTreeMap;

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::cursor::{CursorDirection, RecordCursor};
use crate::innodb::field_decode::{decode_field, extern_reference, ExternReference, FieldValue};
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::innodb::record::{decode_header, RecordHeader, RecordType, RowFormat};
use crate::innodb::schema::{ColumnDescriptor, ColumnRole, RecordDescriber};
use crate::IdbError;

/// Parsed INDEX page header (36 bytes, at FIL_PAGE_DATA offset within an INDEX page).
#[derive(Debug, Clone, Serialize)]
pub struct IndexHeader {
    /// Number of directory slots in the page directory.
    pub n_dir_slots: u16,
    /// Pointer to record heap top.
    pub heap_top: u16,
    /// Number of records in the heap. Bit 15 is the compact format flag.
    pub n_heap_raw: u16,
    /// Pointer to start of free record list (0 if none).
    pub free: u16,
    /// Number of bytes in deleted records.
    pub garbage: u16,
    pub last_insert: u16,
    pub direction: u16,
    pub n_direction: u16,
    /// Number of user records on the page.
    pub n_recs: u16,
    pub max_trx_id: u64,
    /// Level in the B+Tree (0 = leaf).
    pub level: u16,
    pub index_id: u64,
}

impl IndexHeader {
    /// Parse an INDEX page header from a full page buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::index::IndexHeader;
    /// use ibr::innodb::record::RowFormat;
    /// use ibr::innodb::constants::*;
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// let mut page = vec![0u8; 256];
    /// let base = FIL_PAGE_DATA;
    /// BigEndian::write_u16(&mut page[base + PAGE_N_DIR_SLOTS..], 4);
    /// BigEndian::write_u16(&mut page[base + PAGE_N_HEAP..], 0x8003);
    /// BigEndian::write_u16(&mut page[base + PAGE_N_RECS..], 1);
    /// BigEndian::write_u64(&mut page[base + PAGE_INDEX_ID..], 100);
    /// BigEndian::write_u16(&mut page[base + PAGE_DIRECTION..], PAGE_RIGHT);
    ///
    /// let hdr = IndexHeader::parse(&page).unwrap();
    /// assert_eq!(hdr.n_dir_slots, 4);
    /// assert_eq!(hdr.row_format(), RowFormat::Compact);
    /// assert_eq!(hdr.n_heap(), 3);
    /// assert!(hdr.is_leaf());
    /// assert_eq!(hdr.index_id, 100);
    /// assert_eq!(hdr.direction_name(), "Right");
    /// ```
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA;
        if page_data.len() < base + INDEX_HEADER_SIZE {
            return None;
        }
        let d = &page_data[base..];

        Some(IndexHeader {
            n_dir_slots: BigEndian::read_u16(&d[PAGE_N_DIR_SLOTS..]),
            heap_top: BigEndian::read_u16(&d[PAGE_HEAP_TOP..]),
            n_heap_raw: BigEndian::read_u16(&d[PAGE_N_HEAP..]),
            free: BigEndian::read_u16(&d[PAGE_FREE..]),
            garbage: BigEndian::read_u16(&d[PAGE_GARBAGE..]),
            last_insert: BigEndian::read_u16(&d[PAGE_LAST_INSERT..]),
            direction: BigEndian::read_u16(&d[PAGE_DIRECTION..]),
            n_direction: BigEndian::read_u16(&d[PAGE_N_DIRECTION..]),
            n_recs: BigEndian::read_u16(&d[PAGE_N_RECS..]),
            max_trx_id: BigEndian::read_u64(&d[PAGE_MAX_TRX_ID..]),
            level: BigEndian::read_u16(&d[PAGE_LEVEL..]),
            index_id: BigEndian::read_u64(&d[PAGE_INDEX_ID..]),
        })
    }

    /// Number of heap records, without the compact flag.
    pub fn n_heap(&self) -> u16 {
        self.n_heap_raw & !PAGE_N_HEAP_COMPACT_FLAG
    }

    pub fn row_format(&self) -> RowFormat {
        RowFormat::from_n_heap(self.n_heap_raw)
    }

    pub fn direction_name(&self) -> &'static str {
        match self.direction {
            PAGE_LEFT => "Left",
            PAGE_RIGHT => "Right",
            PAGE_SAME_REC => "Same Record",
            PAGE_SAME_PAGE => "Same Page",
            PAGE_NO_DIRECTION => "No Direction",
            _ => "Unknown",
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }
}

/// FSEG (file segment) header pointer, 10 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FsegHeader {
    pub space_id: u32,
    pub page_no: u32,
    pub offset: u16,
}

impl FsegHeader {
    /// Parse an FSEG header from a byte slice (must be at least 10 bytes).
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::index::FsegHeader;
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// let mut data = vec![0u8; 10];
    /// BigEndian::write_u32(&mut data[0..], 3);
    /// BigEndian::write_u32(&mut data[4..], 7);
    /// BigEndian::write_u16(&mut data[8..], 50);
    ///
    /// let fseg = FsegHeader::parse(&data).unwrap();
    /// assert_eq!((fseg.space_id, fseg.page_no, fseg.offset), (3, 7, 50));
    /// ```
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FSEG_HEADER_SIZE {
            return None;
        }
        Some(FsegHeader {
            space_id: BigEndian::read_u32(&data[0..]),
            page_no: BigEndian::read_u32(&data[4..]),
            offset: BigEndian::read_u16(&data[8..]),
        })
    }

    /// Leaf segment header, right after the INDEX header.
    pub fn parse_leaf(page_data: &[u8]) -> Option<Self> {
        page_data
            .get(FIL_PAGE_DATA + INDEX_HEADER_SIZE..)
            .and_then(Self::parse)
    }

    /// Non-leaf segment header, after the leaf one.
    pub fn parse_internal(page_data: &[u8]) -> Option<Self> {
        page_data
            .get(FIL_PAGE_DATA + INDEX_HEADER_SIZE + FSEG_HEADER_SIZE..)
            .and_then(Self::parse)
    }
}

/// Byte accounting of one INDEX page.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpaceUsage {
    /// FIL header, index header, FSEG headers and system records.
    pub header: usize,
    /// Record heap, including garbage.
    pub records: usize,
    pub garbage: usize,
    /// Page directory slots.
    pub directory: usize,
    pub trailer: usize,
    /// Unallocated bytes between heap top and the directory.
    pub free: usize,
}

impl SpaceUsage {
    /// Bytes holding live records.
    pub fn used(&self) -> usize {
        self.records.saturating_sub(self.garbage)
    }
}

/// One decoded column of a record.
#[derive(Debug, Clone, Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub position: usize,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternReference>,
}

/// A fully decoded record.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub offset: usize,
    pub header: RecordHeader,
    pub keys: Vec<FieldEntry>,
    /// `DB_TRX_ID` and `DB_ROLL_PTR` on clustered leaf records.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<FieldEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<FieldEntry>,
    /// Child page of a node pointer record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_page_number: Option<u32>,
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        self.header.record_type
    }

    /// All decoded columns in physical order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        let mut all: Vec<&FieldEntry> = self
            .keys
            .iter()
            .chain(self.system.iter())
            .chain(self.rows.iter())
            .collect();
        all.sort_by_key(|f| f.position);
        all.into_iter()
    }

    /// Value of the named column.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.keys
            .iter()
            .chain(self.system.iter())
            .chain(self.rows.iter())
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Column name to value.
    pub fn to_map(&self) -> BTreeMap<String, FieldValue> {
        self.fields()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// True when only the header could be decoded.
    pub fn is_header_only(&self) -> bool {
        self.keys.is_empty() && self.system.is_empty() && self.rows.is_empty()
    }
}

/// One B+Tree node with its decoded header.
#[derive(Debug, Clone)]
pub struct IndexPage<'d> {
    page: Page,
    header: IndexHeader,
    describer: Option<&'d RecordDescriber>,
}

impl<'d> IndexPage<'d> {
    /// Decode the index header of an INDEX page.
    pub fn open(page: Page) -> Result<Self, IdbError> {
        if page.page_type() != PageType::Index {
            return Err(IdbError::Parse(format!(
                "Page {} is not an INDEX page (type {})",
                page.number(),
                page.page_type()
            )));
        }
        let header = IndexHeader::parse(page.data()).ok_or_else(|| {
            IdbError::Parse(format!("Page {} is too short for an index header", page.number()))
        })?;
        Ok(IndexPage {
            page,
            header,
            describer: None,
        })
    }

    /// Attach the column layout used for full record decoding.
    pub fn with_describer(mut self, describer: &'d RecordDescriber) -> Self {
        self.describer = Some(describer);
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn number(&self) -> u64 {
        self.page.number()
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn describer(&self) -> Option<&'d RecordDescriber> {
        self.describer
    }

    pub fn row_format(&self) -> RowFormat {
        self.header.row_format()
    }

    pub fn level(&self) -> u16 {
        self.header.level
    }

    pub fn index_id(&self) -> u64 {
        self.header.index_id
    }

    pub fn is_leaf(&self) -> bool {
        self.header.is_leaf()
    }

    /// A page with neither sibling is the only page on its level.
    pub fn is_root(&self) -> bool {
        !self.page.header().has_prev() && !self.page.header().has_next()
    }

    /// Next page on the same level.
    pub fn next(&self) -> Option<u64> {
        let fil = self.page.header();
        fil.has_next().then_some(fil.next_page as u64)
    }

    /// Previous page on the same level.
    pub fn prev(&self) -> Option<u64> {
        let fil = self.page.header();
        fil.has_prev().then_some(fil.prev_page as u64)
    }

    pub fn leaf_segment(&self) -> Option<FsegHeader> {
        FsegHeader::parse_leaf(self.page.data())
    }

    pub fn internal_segment(&self) -> Option<FsegHeader> {
        FsegHeader::parse_internal(self.page.data())
    }

    /// Column layout for records at this page's level.
    pub fn columns(&self) -> Option<Vec<ColumnDescriptor>> {
        self.describer.map(|d| d.columns(self.is_leaf()))
    }

    /// Fixed header of the record at `offset`, without column facts.
    pub fn header_at(&self, offset: usize) -> Result<RecordHeader, IdbError> {
        Ok(decode_header(&self.page, self.row_format(), None, offset)?.0)
    }

    pub fn infimum(&self) -> Result<RecordHeader, IdbError> {
        self.header_at(self.row_format().infimum_offset())
    }

    pub fn supremum(&self) -> Result<RecordHeader, IdbError> {
        self.header_at(self.row_format().supremum_offset())
    }

    /// First user record, `None` on an empty page.
    pub fn min_record(&self) -> Result<Option<Record>, IdbError> {
        let next = self.infimum()?.next;
        if next == self.row_format().supremum_offset() {
            return Ok(None);
        }
        self.record_at(next).map(Some)
    }

    /// Decode the record at `offset`.
    ///
    /// Without a describer the record comes back header-only: the chain
    /// links, record type and (for redundant records) the field count are
    /// still there, but no column is decoded and no child page is read.
    pub fn record_at(&self, offset: usize) -> Result<Record, IdbError> {
        let format = self.row_format();
        let columns = self.columns();

        let (header, _) = decode_header(&self.page, format, columns.as_deref(), offset)?;
        let mut record = Record {
            offset,
            header,
            keys: Vec::new(),
            system: Vec::new(),
            rows: Vec::new(),
            child_page_number: None,
        };
        if record.header.record_type.is_system() {
            return Ok(record);
        }

        let Some(columns) = columns else {
            return Ok(record);
        };

        let mut pos = offset;
        for column in &columns {
            let (value, consumed) = decode_field(column, pos, &record.header, &self.page)?;
            let entry = FieldEntry {
                name: column.name.clone(),
                position: column.position,
                type_name: column.data_type.to_string(),
                value,
                external: extern_reference(column, pos, &record.header, &self.page)?,
            };
            match column.role {
                ColumnRole::Key => record.keys.push(entry),
                ColumnRole::System => record.system.push(entry),
                ColumnRole::Row => record.rows.push(entry),
            }
            pos += consumed;
        }

        if record.header.record_type == RecordType::NodePointer {
            record.child_page_number = Some(self.page.read_u32(pos)?);
        }
        Ok(record)
    }

    /// Iterate records starting after the infimum.
    pub fn cursor(&self) -> RecordCursor<'_, 'd> {
        RecordCursor::new(self, self.row_format().infimum_offset(), CursorDirection::Forward)
    }

    /// All user records of the page in key order.
    pub fn records(&self) -> Result<Vec<Record>, IdbError> {
        self.cursor().collect()
    }

    /// Byte accounting for the page.
    pub fn space_usage(&self) -> SpaceUsage {
        let page_len = self.page.len();
        let header = match self.row_format() {
            RowFormat::Compact => PAGE_NEW_SUPREMUM + SYSTEM_RECORD_DATA_SIZE,
            RowFormat::Redundant => PAGE_OLD_SUPREMUM + SYSTEM_RECORD_DATA_SIZE + 1,
        };
        let heap_top = (self.header.heap_top as usize).clamp(header, page_len);
        let directory = self.header.n_dir_slots as usize * PAGE_DIR_SLOT_SIZE;
        SpaceUsage {
            header,
            records: heap_top - header,
            garbage: self.header.garbage as usize,
            directory,
            trailer: SIZE_FIL_TRAILER,
            free: page_len.saturating_sub(heap_top + directory + SIZE_FIL_TRAILER),
        }
    }
}
