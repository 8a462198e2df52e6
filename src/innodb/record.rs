//! Record header decoding for the compact and redundant row formats.
//!
//! Every record on an INDEX page is addressed by its *origin*: the offset of
//! the first data byte. The header lives immediately before the origin and
//! is read backward.
//!
//! Compact (MySQL 5.0+) records carry a 5-byte fixed header:
//!
//! | Offset from origin | Size | Content |
//! |--------------------|------|---------|
//! | -5 | 1 | info flags (high nibble) + n_owned (low nibble) |
//! | -4 | 2 | heap number (13 bits) + record type (3 bits) |
//! | -2 | 2 | signed `next` delta, relative to the origin |
//!
//! preceded by a null bitmap and a variable-length field table that only a
//! schema can interpret.
//!
//! Redundant (pre-5.0) records carry a 6-byte fixed header with an
//! *absolute* `next` offset, preceded by a table of cumulative field end
//! offsets that is self-describing for lengths but not for column names.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::page::Page;
use crate::innodb::schema::ColumnDescriptor;
use crate::IdbError;

/// Record type extracted from the header status bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Row on a leaf page.
    Conventional,
    /// Key plus child page number on a non-leaf page.
    NodePointer,
    Infimum,
    Supremum,
}

impl RecordType {
    /// Convert the 3-bit status value of a compact header.
    ///
    /// Only the lowest 3 bits of `val` are used.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::record::RecordType;
    ///
    /// assert_eq!(RecordType::from_u8(0), RecordType::Conventional);
    /// assert_eq!(RecordType::from_u8(1), RecordType::NodePointer);
    /// assert_eq!(RecordType::from_u8(2), RecordType::Infimum);
    /// assert_eq!(RecordType::from_u8(3), RecordType::Supremum);
    /// assert_eq!(RecordType::from_u8(0x09), RecordType::NodePointer);
    ///
    /// assert_eq!(RecordType::Conventional.name(), "conventional");
    /// ```
    pub fn from_u8(val: u8) -> Self {
        match val & 0x07 {
            1 => RecordType::NodePointer,
            2 => RecordType::Infimum,
            3 => RecordType::Supremum,
            _ => RecordType::Conventional,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecordType::Conventional => "conventional",
            RecordType::NodePointer => "node_pointer",
            RecordType::Infimum => "infimum",
            RecordType::Supremum => "supremum",
        }
    }

    /// True for the infimum and supremum sentinels.
    pub fn is_system(&self) -> bool {
        matches!(self, RecordType::Infimum | RecordType::Supremum)
    }
}

/// Physical row format of an INDEX page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFormat {
    Compact,
    Redundant,
}

impl RowFormat {
    /// Row format from the PAGE_N_HEAP field (bit 15 set = compact).
    pub fn from_n_heap(n_heap: u16) -> Self {
        if n_heap & PAGE_N_HEAP_COMPACT_FLAG != 0 {
            RowFormat::Compact
        } else {
            RowFormat::Redundant
        }
    }

    pub fn infimum_offset(&self) -> usize {
        match self {
            RowFormat::Compact => PAGE_NEW_INFIMUM,
            RowFormat::Redundant => PAGE_OLD_INFIMUM,
        }
    }

    pub fn supremum_offset(&self) -> usize {
        match self {
            RowFormat::Compact => PAGE_NEW_SUPREMUM,
            RowFormat::Redundant => PAGE_OLD_SUPREMUM,
        }
    }

    /// Size of the fixed part of the record header.
    pub fn extra_bytes(&self) -> usize {
        match self {
            RowFormat::Compact => REC_N_NEW_EXTRA_BYTES,
            RowFormat::Redundant => REC_N_OLD_EXTRA_BYTES,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RowFormat::Compact => "compact",
            RowFormat::Redundant => "redundant",
        }
    }
}

/// Per-column facts recovered from a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldMeta {
    /// Stored length in bytes (for extern columns, including the 20-byte reference).
    pub length: usize,
    pub null: bool,
    /// Column is stored off-page; the in-page bytes end with a field reference.
    pub external: bool,
}

/// Decoded record header.
#[derive(Debug, Clone, Serialize)]
pub struct RecordHeader {
    /// Record origin within the page.
    pub offset: usize,
    pub format: RowFormat,
    /// Absolute offset of the next record origin, already resolved for
    /// compact records.
    pub next: usize,
    pub record_type: RecordType,
    pub heap_number: u16,
    pub n_owned: u8,
    /// Info flags in the high nibble (`REC_INFO_*`).
    pub info_flags: u8,
    /// Field count stored in a redundant header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_fields: Option<u16>,
    /// Width of redundant field offsets (1 or 2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_size: Option<u8>,
    /// Column name to length/null/extern. Empty when decoded without a schema.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldMeta>,
    /// Total header bytes preceding the origin.
    pub length: usize,
}

impl RecordHeader {
    pub fn is_deleted(&self) -> bool {
        self.info_flags & REC_INFO_DELETED_FLAG != 0
    }

    pub fn is_min_rec(&self) -> bool {
        self.info_flags & REC_INFO_MIN_REC_FLAG != 0
    }

    /// Length/null/extern facts for one column, if the header was decoded
    /// with a schema that names it.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    /// Sum of the stored lengths of all decoded columns.
    pub fn data_length(&self) -> usize {
        self.fields.values().map(|f| f.length).sum()
    }
}

/// Decode the header of the record whose origin is `offset`.
///
/// With `columns` present, the per-column length/null/extern table is
/// decoded too (for conventional and node pointer records); without it only
/// the fixed header is read, which is enough to follow the record chain.
/// Returns the header and its total length in bytes.
pub fn decode_header(
    page: &Page,
    format: RowFormat,
    columns: Option<&[ColumnDescriptor]>,
    offset: usize,
) -> Result<(RecordHeader, usize), IdbError> {
    if offset < format.extra_bytes() || offset >= page.len() {
        return Err(IdbError::Parse(format!(
            "Record offset {} is outside page {}",
            offset,
            page.number()
        )));
    }
    let header = match format {
        RowFormat::Compact => decode_compact(page, columns, offset)?,
        RowFormat::Redundant => decode_redundant(page, columns, offset)?,
    };
    let length = header.length;
    Ok((header, length))
}

fn decode_compact(
    page: &Page,
    columns: Option<&[ColumnDescriptor]>,
    offset: usize,
) -> Result<RecordHeader, IdbError> {
    let info = page.read_u8(offset - 5)?;
    let status = page.read_u16(offset - 4)?;
    let delta = page.read_u16(offset - 2)? as i16;

    let next = (offset as i64 + delta as i64).max(0) as usize;
    let record_type = RecordType::from_u8((status & 0x07) as u8);

    let mut header = RecordHeader {
        offset,
        format: RowFormat::Compact,
        next,
        record_type,
        heap_number: status >> 3,
        n_owned: info & 0x0F,
        info_flags: info & 0xF0,
        n_fields: None,
        offset_size: None,
        fields: BTreeMap::new(),
        length: REC_N_NEW_EXTRA_BYTES,
    };

    if let Some(columns) = columns {
        if !record_type.is_system() {
            header.length += read_compact_fields(page, columns, offset, &mut header.fields)?;
        }
    }
    Ok(header)
}

/// Walk the null bitmap and variable-length table of a compact record.
/// Returns the number of bytes they occupy.
fn read_compact_fields(
    page: &Page,
    columns: &[ColumnDescriptor],
    offset: usize,
    fields: &mut BTreeMap<String, FieldMeta>,
) -> Result<usize, IdbError> {
    let n_nullable = columns.iter().filter(|c| c.nullable).count();
    let null_bytes = n_nullable.div_ceil(8);
    let bitmap_end = offset - REC_N_NEW_EXTRA_BYTES;
    if bitmap_end < null_bytes {
        return Err(IdbError::Parse(format!(
            "Null bitmap of record at offset {} on page {} underruns the page",
            offset,
            page.number()
        )));
    }

    // Length bytes are consumed downward from just below the bitmap.
    let mut cursor = bitmap_end - null_bytes;
    let mut next_length_byte = || -> Result<u8, IdbError> {
        if cursor == 0 {
            return Err(IdbError::Parse(format!(
                "Length table of record at offset {} on page {} underruns the page",
                offset,
                page.number()
            )));
        }
        cursor -= 1;
        page.read_u8(cursor)
    };

    let mut nullable_index = 0usize;
    let mut varlen_bytes = 0usize;
    for column in columns {
        if column.nullable {
            let byte = page.read_u8(bitmap_end - 1 - nullable_index / 8)?;
            let is_null = byte & (1 << (nullable_index % 8)) != 0;
            nullable_index += 1;
            if is_null {
                fields.insert(
                    column.name.clone(),
                    FieldMeta {
                        length: 0,
                        null: true,
                        external: false,
                    },
                );
                continue;
            }
        }

        let meta = match column.data_type.fixed_width() {
            Some(width) => FieldMeta {
                length: width,
                null: false,
                external: false,
            },
            None => {
                let b1 = next_length_byte()?;
                varlen_bytes += 1;
                if column.data_type.allows_long_length() && b1 & REC_VARLEN_TWO_BYTE_FLAG != 0 {
                    let b2 = next_length_byte()?;
                    varlen_bytes += 1;
                    FieldMeta {
                        length: (((b1 & 0x3F) as usize) << 8) | b2 as usize,
                        null: false,
                        external: b1 & REC_VARLEN_EXTERN_FLAG != 0,
                    }
                } else {
                    FieldMeta {
                        length: b1 as usize,
                        null: false,
                        external: false,
                    }
                }
            }
        };
        fields.insert(column.name.clone(), meta);
    }

    Ok(null_bytes + varlen_bytes)
}

fn decode_redundant(
    page: &Page,
    columns: Option<&[ColumnDescriptor]>,
    offset: usize,
) -> Result<RecordHeader, IdbError> {
    let info = page.read_u8(offset - 6)?;
    let bits = page.read_uint(offset - 5, 3)? as u32;
    let next = page.read_u16(offset - 2)? as usize;

    let one_byte_offsets = bits & 0x01 != 0;
    let n_fields = ((bits >> 1) & 0x3FF) as u16;
    let heap_number = (bits >> 11) as u16;
    let offset_size: usize = if one_byte_offsets { 1 } else { 2 };

    // Redundant headers have no status bits; the type follows from position
    // and page level.
    let record_type = if offset == PAGE_OLD_INFIMUM {
        RecordType::Infimum
    } else if offset == PAGE_OLD_SUPREMUM {
        RecordType::Supremum
    } else if page.read_u16(FIL_PAGE_DATA + PAGE_LEVEL)? > 0 {
        RecordType::NodePointer
    } else {
        RecordType::Conventional
    };

    let mut header = RecordHeader {
        offset,
        format: RowFormat::Redundant,
        next,
        record_type,
        heap_number,
        n_owned: info & 0x0F,
        info_flags: info & 0xF0,
        n_fields: Some(n_fields),
        offset_size: Some(offset_size as u8),
        fields: BTreeMap::new(),
        length: REC_N_OLD_EXTRA_BYTES + n_fields as usize * offset_size,
    };

    if let Some(columns) = columns {
        if !record_type.is_system() {
            let table = read_redundant_offsets(page, offset, n_fields as usize, offset_size)?;
            for column in columns {
                let meta = table.get(column.position).ok_or_else(|| {
                    IdbError::Parse(format!(
                        "Record at offset {} on page {} has {} fields, column {} is at position {}",
                        offset,
                        page.number(),
                        n_fields,
                        column.name,
                        column.position
                    ))
                })?;
                header.fields.insert(column.name.clone(), *meta);
            }
        }
    }
    Ok(header)
}

/// Read the cumulative end-offset table of a redundant record and turn it
/// into per-field lengths.
fn read_redundant_offsets(
    page: &Page,
    offset: usize,
    n_fields: usize,
    offset_size: usize,
) -> Result<Vec<FieldMeta>, IdbError> {
    let table_base = offset - REC_N_OLD_EXTRA_BYTES;
    if table_base < n_fields * offset_size {
        return Err(IdbError::Parse(format!(
            "Field offsets of record at offset {} on page {} underrun the page",
            offset,
            page.number()
        )));
    }

    let mut out = Vec::with_capacity(n_fields);
    let mut previous_end = 0usize;
    for i in 0..n_fields {
        let at = table_base - (i + 1) * offset_size;
        let (end, null, external) = if offset_size == 1 {
            let raw = page.read_u8(at)? as u16;
            (
                (raw & REC_1BYTE_OFFS_MASK) as usize,
                raw & REC_1BYTE_SQL_NULL_MASK != 0,
                false,
            )
        } else {
            let raw = page.read_u16(at)?;
            (
                (raw & REC_2BYTE_OFFS_MASK) as usize,
                raw & REC_2BYTE_SQL_NULL_MASK != 0,
                raw & REC_2BYTE_EXTERN_MASK != 0,
            )
        };
        out.push(FieldMeta {
            length: end.saturating_sub(previous_end),
            null,
            external,
        });
        previous_end = end;
    }
    Ok(out)
}
