//! Field-level value decoding for InnoDB records.
//!
//! Turns the bytes of one column, located by the record header's length
//! table, into a typed [`FieldValue`].
//!
//! # Supported types
//!
//! | Type | InnoDB encoding | Result |
//! |------|-----------------|--------|
//! | TINYINT–BIGINT (signed) | Big-endian, high bit flipped | `Int` |
//! | TINYINT–BIGINT UNSIGNED | Plain big-endian | `Uint` |
//! | TRX_ID, ROW_ID | 6-byte big-endian | `Uint` |
//! | ROLL_PTR | 7-byte packed pointer | `RollPointer` |
//! | CHAR/VARCHAR | Bytes, trailing spaces trimmed | `Str` |
//! | BLOB/TEXT | Inline prefix | `Str` if UTF-8, else `Hex` |
//! | BINARY/VARBINARY/others | Raw bytes | `Hex` |
//!
//! Columns flagged as externally stored keep only a prefix in the page,
//! followed by a 20-byte [`ExternReference`] to the overflow pages.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::page::Page;
use crate::innodb::record::RecordHeader;
use crate::innodb::schema::{ColumnDescriptor, DataType};
use crate::util::hex::format_bytes;
use crate::IdbError;

/// Decoded field value from an InnoDB record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// SQL NULL.
    Null,
    Int(i64),
    Uint(u64),
    Str(String),
    RollPointer(RollPointer),
    /// Hex-encoded bytes for binary and uninterpreted types.
    Hex(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Integer view of the value, if it is one and fits.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            FieldValue::Uint(v) => Some(v),
            FieldValue::Int(v) if v >= 0 => Some(v as u64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::Int(v) => Some(v),
            FieldValue::Uint(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => f.write_str("NULL"),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Uint(v) => write!(f, "{}", v),
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::RollPointer(rp) => write!(
                f,
                "(insert={}, rseg={}, page={}, offset={})",
                rp.is_insert, rp.rollback_segment_id, rp.undo_log_page, rp.undo_log_offset
            ),
            FieldValue::Hex(h) => write!(f, "0x{}", h),
        }
    }
}

/// Unpacked `DB_ROLL_PTR`.
///
/// # Examples
///
/// ```
/// use ibr::innodb::field_decode::RollPointer;
///
/// let rp = RollPointer::from_u56((1 << 55) | (5 << 48) | (300 << 16) | 0x110);
/// assert!(rp.is_insert);
/// assert_eq!(rp.rollback_segment_id, 5);
/// assert_eq!(rp.undo_log_page, 300);
/// assert_eq!(rp.undo_log_offset, 0x110);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RollPointer {
    pub is_insert: bool,
    pub rollback_segment_id: u8,
    pub undo_log_page: u32,
    pub undo_log_offset: u16,
}

impl RollPointer {
    pub fn from_u56(value: u64) -> Self {
        RollPointer {
            is_insert: (value >> 55) & 1 == 1,
            rollback_segment_id: ((value >> 48) & 0x7F) as u8,
            undo_log_page: ((value >> 16) & 0xFFFF_FFFF) as u32,
            undo_log_offset: (value & 0xFFFF) as u16,
        }
    }
}

/// Location of an off-page column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExternReference {
    pub space_id: u32,
    pub page_number: u32,
    pub offset: u32,
    /// Total stored length, masked to 30 bits.
    pub length: u32,
}

impl ExternReference {
    /// Parse a 20-byte field reference.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < FIELD_REF_SIZE {
            return None;
        }
        Some(ExternReference {
            space_id: BigEndian::read_u32(&data[0..]),
            page_number: BigEndian::read_u32(&data[4..]),
            offset: BigEndian::read_u32(&data[8..]),
            // 8-byte length field; only the low 4 bytes carry the length.
            length: BigEndian::read_u32(&data[16..]) & EXTERN_LENGTH_MASK,
        })
    }

    /// Read the reference stored at `at` in a page.
    pub fn read(page: &Page, at: usize) -> Result<Self, IdbError> {
        let bytes = page.bytes(at, FIELD_REF_SIZE)?;
        ExternReference::parse(bytes).ok_or_else(|| {
            IdbError::Parse(format!(
                "Short field reference at offset {} on page {}",
                at,
                page.number()
            ))
        })
    }
}

/// Undo the sign-bit flip of a stored signed integer of `width` bytes.
///
/// # Examples
///
/// ```
/// use ibr::innodb::field_decode::decode_signed;
///
/// assert_eq!(decode_signed(0x80, 1), 0);
/// assert_eq!(decode_signed(0x7F, 1), -1);
/// assert_eq!(decode_signed(0x8000_0001, 4), 1);
/// assert_eq!(decode_signed(0x0000_0000, 4), i32::MIN as i64);
/// ```
pub fn decode_signed(raw: u64, width: usize) -> i64 {
    let bits = (width * 8) as u32;
    let flipped = raw ^ (1u64 << (bits - 1));
    let shift = 64 - bits;
    ((flipped << shift) as i64) >> shift
}

/// Store a signed integer the way InnoDB does (two's complement, high bit flipped).
pub fn encode_signed(value: i64, width: usize) -> u64 {
    let bits = (width * 8) as u32;
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    ((value as u64) & mask) ^ (1u64 << (bits - 1))
}

/// Trim trailing 0x20 (space) bytes.
pub fn trim_trailing_spaces(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && data[end - 1] == 0x20 {
        end -= 1;
    }
    &data[..end]
}

/// Sign-flipped integer of 1 to 8 bytes, width taken from the slice.
pub fn parse_mysql_int(data: &[u8]) -> Option<i64> {
    if data.is_empty() || data.len() > 8 {
        return None;
    }
    Some(decode_signed(BigEndian::read_uint(data, data.len()), data.len()))
}

/// Packed DATETIME (5 to 8 bytes, sign bit flipped), rendered as
/// `YYYY-MM-DD HH:MM:SS[.ffffff]`.
///
/// # Examples
///
/// ```
/// use ibr::innodb::field_decode::parse_mysql_datetime;
///
/// // 2024-03-15 10:20:30, no fractional part
/// let ym: u64 = 2024 * 13 + 3;
/// let packed = (ym << 22) | (15 << 17) | (10 << 12) | (20 << 6) | 30;
/// let stored = (packed | (1 << 39)).to_be_bytes();
/// assert_eq!(
///     parse_mysql_datetime(&stored[3..]).unwrap(),
///     "2024-03-15 10:20:30"
/// );
/// ```
pub fn parse_mysql_datetime(data: &[u8]) -> Option<String> {
    if data.len() < 5 || data.len() > 8 {
        return None;
    }
    let width = data.len();
    let raw = BigEndian::read_uint(data, width) ^ (1u64 << (width * 8 - 1));
    let v = raw << (64 - width * 8);

    let year_month = (v >> 46) & 0x1FFFF;
    let year = year_month / 13;
    let month = year_month % 13;
    let day = (v >> 41) & 0x1F;
    let hour = (v >> 36) & 0x1F;
    let minute = (v >> 30) & 0x3F;
    let second = (v >> 24) & 0x3F;
    let micros = v & 0xFF_FFFF;

    let mut out = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hour, minute, second
    );
    if micros != 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    Some(out)
}

/// 4-byte TIMESTAMP (UTC seconds since the epoch).
pub fn parse_mysql_timestamp(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let secs = BigEndian::read_u32(data);
    if secs == 0 {
        return Some("0000-00-00 00:00:00".to_string());
    }
    let (year, month, day) = days_to_ymd(secs / 86_400);
    let time_of_day = secs % 86_400;
    Some(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60
    ))
}

/// Civil date for a day count since 1970-01-01.
fn days_to_ymd(days: u32) -> (u32, u32, u32) {
    // Howard Hinnant's civil_from_days.
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u32::from(month <= 2);
    (year, month, day)
}

/// Decode raw column bytes of a known type.
pub fn decode_value(data_type: &DataType, data: &[u8]) -> FieldValue {
    match *data_type {
        DataType::Integer { unsigned, .. } if (1..=8).contains(&data.len()) => {
            let raw = BigEndian::read_uint(data, data.len());
            if unsigned {
                FieldValue::Uint(raw)
            } else {
                FieldValue::Int(decode_signed(raw, data.len()))
            }
        }
        DataType::TransactionId | DataType::RowId if (1..=8).contains(&data.len()) => {
            FieldValue::Uint(BigEndian::read_uint(data, data.len()))
        }
        DataType::RollPointer if data.len() == DATA_ROLL_PTR_LEN => {
            FieldValue::RollPointer(RollPointer::from_u56(BigEndian::read_uint(
                data,
                DATA_ROLL_PTR_LEN,
            )))
        }
        DataType::Char { .. } | DataType::MultiByteChar { .. } | DataType::VarChar { .. } => {
            FieldValue::Str(String::from_utf8_lossy(trim_trailing_spaces(data)).into_owned())
        }
        DataType::Blob => match std::str::from_utf8(data) {
            Ok(s) => FieldValue::Str(s.to_string()),
            Err(_) => FieldValue::Hex(format_bytes(data)),
        },
        _ => FieldValue::Hex(format_bytes(data)),
    }
}

/// Decode `column` from the record data at `offset`.
///
/// The length comes from the record header (never from the declared
/// maximum). For extern columns only the in-page prefix is decoded; the
/// bytes consumed still include the 20-byte reference. Returns the value and
/// the number of bytes consumed.
pub fn decode_field(
    column: &ColumnDescriptor,
    offset: usize,
    header: &RecordHeader,
    page: &Page,
) -> Result<(FieldValue, usize), IdbError> {
    let meta = header.field(&column.name).ok_or_else(|| {
        IdbError::Parse(format!(
            "No length for column {} in record at offset {} on page {}",
            column.name,
            header.offset,
            page.number()
        ))
    })?;

    if meta.null {
        return Ok((FieldValue::Null, meta.length));
    }

    let inline_len = if meta.external {
        meta.length.checked_sub(FIELD_REF_SIZE).ok_or_else(|| {
            IdbError::Parse(format!(
                "Extern column {} at offset {} on page {} is shorter than a field reference",
                column.name,
                offset,
                page.number()
            ))
        })?
    } else {
        meta.length
    };

    let data = page.bytes(offset, inline_len)?;
    Ok((decode_value(&column.data_type, data), meta.length))
}

/// Field reference of an extern column, `None` if the column is stored inline.
pub fn extern_reference(
    column: &ColumnDescriptor,
    offset: usize,
    header: &RecordHeader,
    page: &Page,
) -> Result<Option<ExternReference>, IdbError> {
    match header.field(&column.name) {
        Some(meta) if meta.external && !meta.null && meta.length >= FIELD_REF_SIZE => Ok(Some(
            ExternReference::read(page, offset + meta.length - FIELD_REF_SIZE)?,
        )),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::record::{FieldMeta, RecordType, RowFormat};
    use crate::innodb::schema::ColumnRole;
    use std::collections::BTreeMap;

    fn header_with(fields: &[(&str, FieldMeta)]) -> RecordHeader {
        RecordHeader {
            offset: 200,
            format: RowFormat::Compact,
            next: 0,
            record_type: RecordType::Conventional,
            heap_number: 2,
            n_owned: 0,
            info_flags: 0,
            n_fields: None,
            offset_size: None,
            fields: fields
                .iter()
                .map(|(n, m)| (n.to_string(), *m))
                .collect::<BTreeMap<_, _>>(),
            length: 5,
        }
    }

    fn column(name: &str, data_type: DataType) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type,
            nullable: true,
            role: ColumnRole::Row,
            position: 0,
        }
    }

    fn page_with(at: usize, bytes: &[u8]) -> Page {
        let mut buf = vec![0u8; SIZE_PAGE_DEFAULT as usize];
        buf[at..at + bytes.len()].copy_from_slice(bytes);
        Page::new(3, buf).unwrap()
    }

    // ---------- integers ----------

    #[test]
    fn test_sign_flip_law() {
        for width in [1usize, 2, 3, 4, 6, 8] {
            let bits = width * 8;
            let min = if bits == 64 { i64::MIN } else { -(1i64 << (bits - 1)) };
            let max = if bits == 64 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };
            for v in [min, min + 1, -1000, -1, 0, 1, 1000, max - 1, max] {
                if v < min || v > max {
                    continue;
                }
                assert_eq!(decode_signed(encode_signed(v, width), width), v, "width {}", width);
            }
        }
        assert_eq!(encode_signed(0, 4), 0x8000_0000);
        assert_eq!(encode_signed(-1, 4), 0x7FFF_FFFF);
    }

    #[test]
    fn test_unsigned_is_plain_big_endian() {
        let t = DataType::Integer { width: 4, unsigned: true };
        assert_eq!(decode_value(&t, &[0x80, 0, 0, 1]), FieldValue::Uint(0x8000_0001));
        let s = DataType::Integer { width: 4, unsigned: false };
        assert_eq!(decode_value(&s, &[0x80, 0, 0, 1]), FieldValue::Int(1));
    }

    #[test]
    fn test_parse_mysql_int() {
        assert_eq!(parse_mysql_int(&[0x80, 0x00, 0x00, 0x2A]), Some(42));
        assert_eq!(parse_mysql_int(&[0x7F, 0xFF]), Some(-1));
        assert_eq!(parse_mysql_int(&[]), None);
    }

    // ---------- system columns ----------

    #[test]
    fn test_roll_pointer_and_trx_id() {
        let rp = decode_value(
            &DataType::RollPointer,
            &[0x81, 0x00, 0x00, 0x01, 0x2C, 0x01, 0x10],
        );
        assert_eq!(
            rp,
            FieldValue::RollPointer(RollPointer {
                is_insert: true,
                rollback_segment_id: 1,
                undo_log_page: 300,
                undo_log_offset: 0x0110,
            })
        );
        let trx = decode_value(&DataType::TransactionId, &[0, 0, 0, 0, 0x05, 0x01]);
        assert_eq!(trx, FieldValue::Uint(0x0501));
    }

    // ---------- strings and dates ----------

    #[test]
    fn test_varchar_trims_trailing_spaces() {
        let v = decode_value(&DataType::VarChar { max_length: 10 }, b"ab  ");
        assert_eq!(v, FieldValue::Str("ab".into()));
        let b = decode_value(&DataType::VarBinary { max_length: 4 }, &[0xDE, 0xAD]);
        assert_eq!(b, FieldValue::Hex("dead".into()));
    }

    #[test]
    fn test_parse_mysql_timestamp() {
        assert_eq!(
            parse_mysql_timestamp(&[0, 0, 0, 0]).unwrap(),
            "0000-00-00 00:00:00"
        );
        // 2021-01-01 00:00:01 UTC
        assert_eq!(
            parse_mysql_timestamp(&1_609_459_201u32.to_be_bytes()).unwrap(),
            "2021-01-01 00:00:01"
        );
        assert_eq!(days_to_ymd(0), (1970, 1, 1));
        assert_eq!(days_to_ymd(19_782), (2024, 2, 29));
    }

    #[test]
    fn test_parse_mysql_datetime_with_micros() {
        let ym: u64 = 1999 * 13 + 12;
        let packed = (ym << 22) | (31 << 17) | (23 << 12) | (59 << 6) | 58;
        let v = (((packed << 24) | 123_456) ^ (1 << 63)).to_be_bytes();
        assert_eq!(
            parse_mysql_datetime(&v).unwrap(),
            "1999-12-31 23:59:58.123456"
        );
        assert!(parse_mysql_datetime(&[0; 4]).is_none());
    }

    // ---------- decode_field ----------

    #[test]
    fn test_decode_field_uses_header_length() {
        let page = page_with(200, b"hello world");
        let hdr = header_with(&[(
            "NAME",
            FieldMeta { length: 5, null: false, external: false },
        )]);
        let col = column("NAME", DataType::VarChar { max_length: 100 });
        let (value, consumed) = decode_field(&col, 200, &hdr, &page).unwrap();
        assert_eq!(value, FieldValue::Str("hello".into()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_decode_field_null() {
        let page = page_with(200, b"x");
        let hdr = header_with(&[("N", FieldMeta { length: 0, null: true, external: false })]);
        let col = column("N", DataType::VarChar { max_length: 10 });
        assert_eq!(
            decode_field(&col, 200, &hdr, &page).unwrap(),
            (FieldValue::Null, 0)
        );
    }

    #[test]
    fn test_extern_column_prefix_and_reference() {
        let mut bytes = b"prefix".to_vec();
        let mut reference = [0u8; 20];
        BigEndian::write_u32(&mut reference[0..], 9);
        BigEndian::write_u32(&mut reference[4..], 77);
        BigEndian::write_u32(&mut reference[8..], 38);
        BigEndian::write_u32(&mut reference[16..], 0xC000_4000);
        bytes.extend_from_slice(&reference);
        let page = page_with(300, &bytes);

        let hdr = header_with(&[(
            "DOC",
            FieldMeta { length: 26, null: false, external: true },
        )]);
        let col = column("DOC", DataType::Blob);
        let (value, consumed) = decode_field(&col, 300, &hdr, &page).unwrap();
        assert_eq!(value, FieldValue::Str("prefix".into()));
        assert_eq!(consumed, 26);

        let ext = extern_reference(&col, 300, &hdr, &page).unwrap().unwrap();
        assert_eq!(
            ext,
            ExternReference { space_id: 9, page_number: 77, offset: 38, length: 0x4000 }
        );
    }

    #[test]
    fn test_decode_field_missing_meta() {
        let page = page_with(200, b"x");
        let hdr = header_with(&[]);
        let col = column("GONE", DataType::Blob);
        assert!(decode_field(&col, 200, &hdr, &page).is_err());
    }
}
