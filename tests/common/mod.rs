//! Synthetic InnoDB pages and spaces shared by the integration tests.
//!
//! Pages are assembled byte by byte with `byteorder`, the same way InnoDB
//! lays them out: FIL header, index header, system records, a record heap
//! growing upward and a two-slot page directory before the trailer.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{BigEndian, ByteOrder};
use tempfile::NamedTempFile;

use ibr::innodb::constants::*;
use ibr::innodb::field_decode::encode_signed;
use ibr::innodb::space::Space;

pub const PAGE_SIZE: u32 = 16384;
pub const PS: usize = PAGE_SIZE as usize;

pub const PAGE_TYPE_ALLOCATED: u16 = 0;
pub const PAGE_TYPE_SYS: u16 = 6;
pub const PAGE_TYPE_FSP_HDR: u16 = 8;
pub const PAGE_TYPE_INDEX: u16 = 17855;

// ---------- raw pages ----------

/// Write a CRC-32C checksum into bytes 0-3 of a page.
pub fn write_crc32c_checksum(page: &mut [u8]) {
    let end = page.len() - SIZE_FIL_TRAILER;
    let crc = crc32c::crc32c(&page[FIL_PAGE_OFFSET..FIL_PAGE_FILE_FLUSH_LSN]);
    let crc = crc32c::crc32c_append(crc, &page[FIL_PAGE_DATA..end]);
    BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_OR_CHKSUM..], crc);
}

/// Page with a FIL header and trailer, no siblings and no body.
pub fn blank_page(page_no: u32, space_id: u32, page_type: u16) -> Vec<u8> {
    let mut page = vec![0u8; PS];
    let lsn = 1000 + page_no as u64;
    BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], page_no);
    BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], FIL_NULL);
    BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], FIL_NULL);
    BigEndian::write_u64(&mut page[FIL_PAGE_LSN..], lsn);
    BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], page_type);
    BigEndian::write_u32(&mut page[FIL_PAGE_SPACE_ID..], space_id);
    BigEndian::write_u32(&mut page[PS - 4..], lsn as u32);
    page
}

/// Page 0 of a space.
pub fn fsp_page(space_id: u32, total_pages: u32) -> Vec<u8> {
    let mut page = blank_page(0, space_id, PAGE_TYPE_FSP_HDR);
    let fsp = FIL_PAGE_DATA;
    BigEndian::write_u32(&mut page[fsp + FSP_SPACE_ID..], space_id);
    BigEndian::write_u32(&mut page[fsp + FSP_SIZE..], total_pages);
    BigEndian::write_u32(&mut page[fsp + FSP_FREE_LIMIT..], total_pages);
    write_crc32c_checksum(&mut page);
    page
}

/// Root pages of the five catalog indexes.
#[derive(Debug, Clone, Copy)]
pub struct CatalogRootPages {
    pub sys_tables: u32,
    pub sys_table_ids: u32,
    pub sys_columns: u32,
    pub sys_indexes: u32,
    pub sys_fields: u32,
}

/// Page 7 of the system space.
pub fn dictionary_header_page(roots: CatalogRootPages, max_table_id: u64, max_index_id: u64) -> Vec<u8> {
    let mut page = blank_page(DICT_HDR_PAGE_NO as u32, 0, PAGE_TYPE_SYS);
    let base = FIL_PAGE_DATA;
    BigEndian::write_u64(&mut page[base + DICT_HDR_ROW_ID..], 0x300);
    BigEndian::write_u64(&mut page[base + DICT_HDR_TABLE_ID..], max_table_id);
    BigEndian::write_u64(&mut page[base + DICT_HDR_INDEX_ID..], max_index_id);
    BigEndian::write_u32(&mut page[base + DICT_HDR_MAX_SPACE_ID..], 5);
    BigEndian::write_u32(&mut page[base + DICT_HDR_TABLES..], roots.sys_tables);
    BigEndian::write_u32(&mut page[base + DICT_HDR_TABLE_IDS..], roots.sys_table_ids);
    BigEndian::write_u32(&mut page[base + DICT_HDR_COLUMNS..], roots.sys_columns);
    BigEndian::write_u32(&mut page[base + DICT_HDR_INDEXES..], roots.sys_indexes);
    BigEndian::write_u32(&mut page[base + DICT_HDR_FIELDS..], roots.sys_fields);
    write_crc32c_checksum(&mut page);
    page
}

// ---------- field values ----------

/// One stored column.
#[derive(Debug, Clone)]
pub enum Field {
    Bytes(Vec<u8>),
    /// SQL NULL occupying `n` bytes (redundant rows keep fixed widths).
    Null(usize),
}

impl Field {
    fn len(&self) -> usize {
        match self {
            Field::Bytes(b) => b.len(),
            Field::Null(n) => *n,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Field::Bytes(b) => out.extend_from_slice(b),
            Field::Null(n) => out.resize(out.len() + n, 0),
        }
    }
}

/// Unsigned big-endian integer of `width` bytes.
pub fn uint(value: u64, width: usize) -> Field {
    let mut buf = vec![0u8; width];
    BigEndian::write_uint(&mut buf, value, width);
    Field::Bytes(buf)
}

/// Signed integer with InnoDB's flipped sign bit.
pub fn int(value: i64, width: usize) -> Field {
    uint(encode_signed(value, width), width)
}

pub fn text(s: &str) -> Field {
    Field::Bytes(s.as_bytes().to_vec())
}

/// Roll pointer: insert flag, rollback segment, undo page and offset.
pub fn roll_ptr(insert: bool, rseg: u8, page: u32, offset: u16) -> Field {
    let value = ((insert as u64) << 55) | ((rseg as u64) << 48) | ((page as u64) << 16) | offset as u64;
    uint(value, DATA_ROLL_PTR_LEN)
}

// ---------- records ----------

/// A record before placement: the bytes below its fixed header, the header
/// facts and its data.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Bytes preceding the fixed header, in ascending address order.
    prefix: Vec<u8>,
    info: u8,
    /// Compact status bits (0 conventional, 1 node pointer).
    status: u8,
    /// Redundant n_fields and 1-byte-offsets flag.
    n_fields: u16,
    one_byte_offsets: bool,
    data: Vec<u8>,
}

impl RawRecord {
    pub fn deleted(mut self) -> Self {
        self.info |= REC_INFO_DELETED_FLAG;
        self
    }

    pub fn node_pointer(mut self) -> Self {
        self.status = 1;
        self
    }
}

/// Redundant record; offsets are 1 byte when the data fits in 127 bytes.
pub fn redundant_record(fields: &[Field]) -> RawRecord {
    let total: usize = fields.iter().map(Field::len).sum();
    let one_byte = total <= REC_1BYTE_OFFS_MASK as usize;

    let mut ends = Vec::with_capacity(fields.len());
    let mut end = 0usize;
    for field in fields {
        end += field.len();
        let null = matches!(field, Field::Null(_));
        ends.push((end, null));
    }

    // Field 0's end offset sits right below the fixed header.
    let mut prefix = Vec::new();
    for &(end, null) in ends.iter().rev() {
        if one_byte {
            prefix.push(end as u8 | if null { REC_1BYTE_SQL_NULL_MASK as u8 } else { 0 });
        } else {
            let raw = end as u16 | if null { REC_2BYTE_SQL_NULL_MASK } else { 0 };
            prefix.extend_from_slice(&raw.to_be_bytes());
        }
    }

    let mut data = Vec::with_capacity(total);
    for field in fields {
        field.write_to(&mut data);
    }
    RawRecord {
        prefix,
        info: 0,
        status: 0,
        n_fields: fields.len() as u16,
        one_byte_offsets: one_byte,
        data,
    }
}

/// 20-byte field reference of an off-page column.
pub fn field_ref(space_id: u32, page: u32, offset: u32, length: u64) -> Field {
    let mut buf = vec![0u8; FIELD_REF_SIZE];
    BigEndian::write_u32(&mut buf[0..], space_id);
    BigEndian::write_u32(&mut buf[4..], page);
    BigEndian::write_u32(&mut buf[8..], offset);
    BigEndian::write_u64(&mut buf[12..], length);
    Field::Bytes(buf)
}

/// Compact record. `nulls` has one flag per nullable column, `varlens` one
/// length per non-null variable-length column, both in column order. Lengths
/// above 127 use the two-byte form.
pub fn compact_record(nulls: &[bool], varlens: &[usize], fields: &[Field]) -> RawRecord {
    let varlens: Vec<(usize, bool)> = varlens.iter().map(|&len| (len, false)).collect();
    compact_record_with_externs(nulls, &varlens, fields)
}

/// Like [`compact_record`], with an extern flag per variable-length column.
/// Extern lengths always use the two-byte form.
pub fn compact_record_with_externs(
    nulls: &[bool],
    varlens: &[(usize, bool)],
    fields: &[Field],
) -> RawRecord {
    let mut downward = Vec::new();
    for chunk in nulls.chunks(8) {
        let mut byte = 0u8;
        for (bit, &null) in chunk.iter().enumerate() {
            if null {
                byte |= 1 << bit;
            }
        }
        downward.push(byte);
    }
    for &(len, external) in varlens {
        if len > 127 || external {
            let flag = if external { REC_VARLEN_EXTERN_FLAG } else { 0 };
            downward.push(REC_VARLEN_TWO_BYTE_FLAG | flag | (len >> 8) as u8);
            downward.push(len as u8);
        } else {
            downward.push(len as u8);
        }
    }
    downward.reverse();

    let mut data = Vec::new();
    for field in fields {
        field.write_to(&mut data);
    }
    RawRecord {
        prefix: downward,
        info: 0,
        status: 0,
        n_fields: fields.len() as u16,
        one_byte_offsets: false,
        data,
    }
}

// ---------- index pages ----------

/// Builds one INDEX page holding the given records in chain order.
pub struct IndexPageBuilder {
    page_no: u32,
    space_id: u32,
    index_id: u64,
    level: u16,
    compact: bool,
    prev: u32,
    next: u32,
    records: Vec<RawRecord>,
}

impl IndexPageBuilder {
    pub fn new(page_no: u32, index_id: u64, compact: bool) -> Self {
        IndexPageBuilder {
            page_no,
            space_id: 0,
            index_id,
            level: 0,
            compact,
            prev: FIL_NULL,
            next: FIL_NULL,
            records: Vec::new(),
        }
    }

    pub fn space(mut self, space_id: u32) -> Self {
        self.space_id = space_id;
        self
    }

    pub fn level(mut self, level: u16) -> Self {
        self.level = level;
        self
    }

    pub fn prev(mut self, prev: u32) -> Self {
        self.prev = prev;
        self
    }

    pub fn next(mut self, next: u32) -> Self {
        self.next = next;
        self
    }

    pub fn record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut page = blank_page(self.page_no, self.space_id, PAGE_TYPE_INDEX);
        BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], self.prev);
        BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], self.next);

        let (infimum, supremum, extra, heap_start) = if self.compact {
            (
                PAGE_NEW_INFIMUM,
                PAGE_NEW_SUPREMUM,
                REC_N_NEW_EXTRA_BYTES,
                PAGE_NEW_SUPREMUM + SYSTEM_RECORD_DATA_SIZE,
            )
        } else {
            (
                PAGE_OLD_INFIMUM,
                PAGE_OLD_SUPREMUM,
                REC_N_OLD_EXTRA_BYTES,
                PAGE_OLD_SUPREMUM + SYSTEM_RECORD_DATA_SIZE + 1,
            )
        };

        let mut pos = heap_start;
        let mut origins = Vec::with_capacity(self.records.len());
        for record in &self.records {
            page[pos..pos + record.prefix.len()].copy_from_slice(&record.prefix);
            let origin = pos + record.prefix.len() + extra;
            page[origin..origin + record.data.len()].copy_from_slice(&record.data);
            origins.push(origin);
            pos = origin + record.data.len();
        }
        let heap_top = pos;

        let first = origins.first().copied().unwrap_or(supremum);
        let n_owned = (self.records.len() + 1).min(8) as u8;
        if self.compact {
            write_compact_header(&mut page, infimum, 0x01, 0, 2, first);
            page[infimum..infimum + 8].copy_from_slice(b"infimum\0");
            write_compact_header(&mut page, supremum, n_owned, 1, 3, supremum);
            page[supremum..supremum + 8].copy_from_slice(b"supremum");
        } else {
            page[infimum - REC_N_OLD_EXTRA_BYTES - 1] = 8;
            write_redundant_header(&mut page, infimum, 0x01, 0, 1, true, first);
            page[infimum..infimum + 8].copy_from_slice(b"infimum\0");
            page[supremum - REC_N_OLD_EXTRA_BYTES - 1] = 9;
            write_redundant_header(&mut page, supremum, n_owned, 1, 1, true, 0);
            page[supremum..supremum + 9].copy_from_slice(b"supremum\0");
        }

        for (i, record) in self.records.iter().enumerate() {
            let origin = origins[i];
            let next = origins.get(i + 1).copied().unwrap_or(supremum);
            let heap = 2 + i as u16;
            if self.compact {
                write_compact_header(&mut page, origin, record.info, heap, record.status, next);
            } else {
                write_redundant_header(
                    &mut page,
                    origin,
                    record.info,
                    heap,
                    record.n_fields,
                    record.one_byte_offsets,
                    next,
                );
            }
        }

        let base = FIL_PAGE_DATA;
        let flag = if self.compact { PAGE_N_HEAP_COMPACT_FLAG } else { 0 };
        BigEndian::write_u16(&mut page[base + PAGE_N_DIR_SLOTS..], 2);
        BigEndian::write_u16(&mut page[base + PAGE_HEAP_TOP..], heap_top as u16);
        BigEndian::write_u16(&mut page[base + PAGE_N_HEAP..], flag | (2 + self.records.len() as u16));
        BigEndian::write_u16(
            &mut page[base + PAGE_LAST_INSERT..],
            origins.last().copied().unwrap_or(0) as u16,
        );
        BigEndian::write_u16(&mut page[base + PAGE_DIRECTION..], 2);
        BigEndian::write_u16(&mut page[base + PAGE_N_DIRECTION..], self.records.len() as u16);
        BigEndian::write_u16(&mut page[base + PAGE_N_RECS..], self.records.len() as u16);
        BigEndian::write_u16(&mut page[base + PAGE_LEVEL..], self.level);
        BigEndian::write_u64(&mut page[base + PAGE_INDEX_ID..], self.index_id);

        let dir = PS - SIZE_FIL_TRAILER;
        BigEndian::write_u16(&mut page[dir - 2..], infimum as u16);
        BigEndian::write_u16(&mut page[dir - 4..], supremum as u16);

        write_crc32c_checksum(&mut page);
        page
    }
}

fn write_compact_header(page: &mut [u8], origin: usize, info: u8, heap: u16, status: u8, next: usize) {
    page[origin - 5] = info;
    BigEndian::write_u16(&mut page[origin - 4..], (heap << 3) | status as u16);
    let delta = next as i64 - origin as i64;
    BigEndian::write_i16(&mut page[origin - 2..], delta as i16);
}

fn write_redundant_header(
    page: &mut [u8],
    origin: usize,
    info: u8,
    heap: u16,
    n_fields: u16,
    one_byte_offsets: bool,
    next: usize,
) {
    page[origin - 6] = info;
    let bits = (one_byte_offsets as u64) | ((n_fields as u64) << 1) | ((heap as u64) << 11);
    BigEndian::write_uint(&mut page[origin - 5..], bits, 3);
    BigEndian::write_u16(&mut page[origin - 2..], next as u16);
}

// ---------- spaces ----------

/// In-memory image of a whole space, one page per slot.
pub struct SpaceImage {
    pages: Vec<Vec<u8>>,
}

impl SpaceImage {
    /// FSP header on page 0, every other page allocated but empty.
    pub fn new(space_id: u32, n_pages: u32) -> Self {
        let mut pages = vec![fsp_page(space_id, n_pages)];
        for n in 1..n_pages {
            pages.push(blank_page(n, space_id, PAGE_TYPE_ALLOCATED));
        }
        SpaceImage { pages }
    }

    pub fn set(&mut self, page_no: u32, page: Vec<u8>) -> &mut Self {
        self.pages[page_no as usize] = page;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.pages.concat()
    }

    pub fn to_space(&self) -> Space {
        Space::from_bytes(self.to_bytes()).unwrap()
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&self.to_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }
}

// ---------- catalog fixture ----------

pub const ROOTS: CatalogRootPages = CatalogRootPages {
    sys_tables: 8,
    sys_table_ids: 9,
    sys_columns: 10,
    sys_indexes: 11,
    sys_fields: 12,
};

pub const SYS_TABLES_INDEX_ID: u64 = 1;
pub const SYS_TABLE_IDS_INDEX_ID: u64 = 2;
pub const SYS_COLUMNS_INDEX_ID: u64 = 3;
pub const SYS_INDEXES_INDEX_ID: u64 = 4;
pub const SYS_FIELDS_INDEX_ID: u64 = 5;

/// `test/t (id INT NOT NULL PRIMARY KEY, name VARCHAR(100), KEY k_name(name))`
/// stored in the system space.
pub const T_TABLE_ID: u64 = 15;
pub const T_PRIMARY_ID: u64 = 22;
pub const T_PRIMARY_ROOT: u32 = 13;
pub const T_NAME_INDEX_ID: u64 = 23;
pub const T_NAME_ROOT: u32 = 14;

/// `test/f (id INT NOT NULL PRIMARY KEY, name VARCHAR(100))` in its own file.
pub const F_TABLE_ID: u64 = 16;
pub const F_SPACE_ID: u32 = 5;
pub const F_PRIMARY_ID: u64 = 24;
pub const F_PRIMARY_ROOT: u32 = 3;

pub const SYSTEM_PAGES: u32 = 16;

const MYSQL_TYPE_LONG: u64 = 3;
const MYSQL_TYPE_VARCHAR: u64 = 15;
const MYSQL_TYPE_STRING: u64 = 254;
const UTF8_GENERAL_CI: u64 = 33;

fn catalog_row(keys: Vec<Field>, rows: Vec<Field>) -> RawRecord {
    let mut fields = keys;
    fields.push(uint(0x0102, DATA_TRX_ID_LEN));
    fields.push(roll_ptr(true, 1, 9, 0x10));
    fields.extend(rows);
    redundant_record(&fields)
}

fn sys_tables_row(name: &str, id: u64, space: u32) -> RawRecord {
    catalog_row(
        vec![text(name)],
        vec![
            uint(id, 8),
            uint(2, 4),
            uint(1, 4),
            uint(0, 8),
            uint(0, 4),
            Field::Null(0),
            uint(space as u64, 4),
        ],
    )
}

fn sys_columns_row(table_id: u64, pos: u64, name: &str, mtype: u64, prtype: u64, len: u64) -> RawRecord {
    catalog_row(
        vec![uint(table_id, 8), uint(pos, 4)],
        vec![text(name), uint(mtype, 4), uint(prtype, 4), uint(len, 4), uint(0, 4)],
    )
}

fn sys_indexes_row(table_id: u64, id: u64, name: &str, index_type: u64, space: u32, root: u32) -> RawRecord {
    catalog_row(
        vec![uint(table_id, 8), uint(id, 8)],
        vec![text(name), uint(1, 4), uint(index_type, 4), uint(space as u64, 4), uint(root as u64, 4)],
    )
}

fn sys_fields_row(index_id: u64, pos: u64, col_name: &str) -> RawRecord {
    catalog_row(vec![uint(index_id, 8), uint(pos, 4)], vec![text(col_name)])
}

/// Columns `id INT NOT NULL` and `name VARCHAR(100)` of a table.
fn two_column_rows(table_id: u64) -> [RawRecord; 2] {
    [
        sys_columns_row(table_id, 0, "id", DATA_INT, DATA_NOT_NULL | MYSQL_TYPE_LONG, 4),
        sys_columns_row(table_id, 1, "name", DATA_VARMYSQL, MYSQL_TYPE_VARCHAR, 100),
    ]
}

/// Clustered leaf row of a `(id, name)` table in compact format.
pub fn user_row(id: i32, name: Option<&str>, trx_id: u64) -> RawRecord {
    let mut fields = vec![
        int(id as i64, 4),
        uint(trx_id, DATA_TRX_ID_LEN),
        roll_ptr(false, 2, 300, 0x110),
    ];
    match name {
        Some(name) => {
            fields.push(text(name));
            compact_record(&[false], &[name.len()], &fields)
        }
        None => compact_record(&[true], &[], &fields),
    }
}

/// System space with a catalog describing `test/t` and `test/f`, and the
/// two indexes of `test/t` holding rows (1, "a") and (2, "bb").
pub fn catalog_system_space() -> SpaceImage {
    let mut image = SpaceImage::new(0, SYSTEM_PAGES);
    image.set(
        DICT_HDR_PAGE_NO as u32,
        dictionary_header_page(ROOTS, F_TABLE_ID, F_PRIMARY_ID),
    );

    image.set(
        ROOTS.sys_tables,
        IndexPageBuilder::new(ROOTS.sys_tables, SYS_TABLES_INDEX_ID, false)
            .record(sys_tables_row("test/f", F_TABLE_ID, F_SPACE_ID))
            .record(sys_tables_row("test/t", T_TABLE_ID, 0))
            .build(),
    );
    image.set(
        ROOTS.sys_table_ids,
        IndexPageBuilder::new(ROOTS.sys_table_ids, SYS_TABLE_IDS_INDEX_ID, false)
            .record(redundant_record(&[uint(T_TABLE_ID, 8), text("test/t")]))
            .record(redundant_record(&[uint(F_TABLE_ID, 8), text("test/f")]))
            .build(),
    );

    let mut columns = IndexPageBuilder::new(ROOTS.sys_columns, SYS_COLUMNS_INDEX_ID, false);
    for row in two_column_rows(T_TABLE_ID).into_iter().chain(two_column_rows(F_TABLE_ID)) {
        columns = columns.record(row);
    }
    image.set(ROOTS.sys_columns, columns.build());

    image.set(
        ROOTS.sys_indexes,
        IndexPageBuilder::new(ROOTS.sys_indexes, SYS_INDEXES_INDEX_ID, false)
            .record(sys_indexes_row(T_TABLE_ID, T_PRIMARY_ID, "PRIMARY", 3, 0, T_PRIMARY_ROOT))
            .record(sys_indexes_row(T_TABLE_ID, T_NAME_INDEX_ID, "k_name", 0, 0, T_NAME_ROOT))
            .record(sys_indexes_row(F_TABLE_ID, F_PRIMARY_ID, "PRIMARY", 3, F_SPACE_ID, F_PRIMARY_ROOT))
            .build(),
    );
    image.set(
        ROOTS.sys_fields,
        IndexPageBuilder::new(ROOTS.sys_fields, SYS_FIELDS_INDEX_ID, false)
            .record(sys_fields_row(T_PRIMARY_ID, 0, "id"))
            .record(sys_fields_row(T_NAME_INDEX_ID, 0, "name"))
            .record(sys_fields_row(F_PRIMARY_ID, 0, "id"))
            .build(),
    );

    image.set(
        T_PRIMARY_ROOT,
        IndexPageBuilder::new(T_PRIMARY_ROOT, T_PRIMARY_ID, true)
            .record(user_row(1, Some("a"), 0x501))
            .record(user_row(2, Some("bb"), 0x502))
            .build(),
    );
    image.set(
        T_NAME_ROOT,
        IndexPageBuilder::new(T_NAME_ROOT, T_NAME_INDEX_ID, true)
            .record(compact_record(&[false], &[1], &[text("a"), int(1, 4)]))
            .record(compact_record(&[false], &[2], &[text("bb"), int(2, 4)]))
            .build(),
    );
    image
}

/// File-per-table space of `test/f` holding (10, "x") and (11, NULL).
pub fn file_per_table_space() -> SpaceImage {
    let mut image = SpaceImage::new(F_SPACE_ID, 5);
    image.set(
        F_PRIMARY_ROOT,
        IndexPageBuilder::new(F_PRIMARY_ROOT, F_PRIMARY_ID, true)
            .space(F_SPACE_ID)
            .record(user_row(10, Some("x"), 0x601))
            .record(user_row(11, None, 0x602))
            .build(),
    );
    image
}

/// `test/c (id INT NOT NULL PRIMARY KEY, code CHAR(4) NOT NULL, note VARCHAR(100))`
/// with `code` in utf8 (LEN 12), alone in a system space catalog.
pub const C_TABLE_ID: u64 = 30;
pub const C_PRIMARY_ID: u64 = 40;
pub const C_PRIMARY_ROOT: u32 = 13;

/// System space holding `test/c` rows (1, "ab", "hello") and (2, "wxyz", NULL).
/// Compact records store the utf8 CHAR with a length byte, padded to 4 bytes.
pub fn utf8_char_system_space() -> SpaceImage {
    let mut image = SpaceImage::new(0, SYSTEM_PAGES);
    image.set(
        DICT_HDR_PAGE_NO as u32,
        dictionary_header_page(ROOTS, C_TABLE_ID, C_PRIMARY_ID),
    );
    image.set(
        ROOTS.sys_tables,
        IndexPageBuilder::new(ROOTS.sys_tables, SYS_TABLES_INDEX_ID, false)
            .record(sys_tables_row("test/c", C_TABLE_ID, 0))
            .build(),
    );
    image.set(
        ROOTS.sys_table_ids,
        IndexPageBuilder::new(ROOTS.sys_table_ids, SYS_TABLE_IDS_INDEX_ID, false)
            .record(redundant_record(&[uint(C_TABLE_ID, 8), text("test/c")]))
            .build(),
    );
    image.set(
        ROOTS.sys_columns,
        IndexPageBuilder::new(ROOTS.sys_columns, SYS_COLUMNS_INDEX_ID, false)
            .record(sys_columns_row(C_TABLE_ID, 0, "id", DATA_INT, DATA_NOT_NULL | MYSQL_TYPE_LONG, 4))
            .record(sys_columns_row(
                C_TABLE_ID,
                1,
                "code",
                DATA_MYSQL,
                (UTF8_GENERAL_CI << 16) | DATA_NOT_NULL | MYSQL_TYPE_STRING,
                12,
            ))
            .record(sys_columns_row(C_TABLE_ID, 2, "note", DATA_VARMYSQL, MYSQL_TYPE_VARCHAR, 100))
            .build(),
    );
    image.set(
        ROOTS.sys_indexes,
        IndexPageBuilder::new(ROOTS.sys_indexes, SYS_INDEXES_INDEX_ID, false)
            .record(sys_indexes_row(C_TABLE_ID, C_PRIMARY_ID, "PRIMARY", 3, 0, C_PRIMARY_ROOT))
            .build(),
    );
    image.set(
        ROOTS.sys_fields,
        IndexPageBuilder::new(ROOTS.sys_fields, SYS_FIELDS_INDEX_ID, false)
            .record(sys_fields_row(C_PRIMARY_ID, 0, "id"))
            .build(),
    );

    let system = |id: i64| [int(id, 4), uint(0x700 + id as u64, DATA_TRX_ID_LEN), roll_ptr(true, 1, 20, 0x30)];
    let mut first = system(1).to_vec();
    first.extend([text("ab  "), text("hello")]);
    let mut second = system(2).to_vec();
    second.push(text("wxyz"));
    image.set(
        C_PRIMARY_ROOT,
        IndexPageBuilder::new(C_PRIMARY_ROOT, C_PRIMARY_ID, true)
            .record(compact_record(&[false], &[4, 5], &first))
            .record(compact_record(&[true], &[4], &second))
            .build(),
    );
    image
}
