/// InnoDB page, record and dictionary constants.
///
/// Offsets follow the InnoDB headers:
/// - fil0fil.h (FIL header/trailer)
/// - page0page.h (index page header, system records)
/// - rem0rec.h (record headers)
/// - dict0boot.h (data dictionary header)
// Page sizes
pub const SIZE_PAGE_DEFAULT: u32 = 16384;

// FIL Header (38 bytes total)
pub const SIZE_FIL_HEAD: usize = 38;
pub const FIL_PAGE_SPACE_OR_CHKSUM: usize = 0; // 4 bytes - checksum or space id
pub const FIL_PAGE_OFFSET: usize = 4; // 4 bytes - page number
pub const FIL_PAGE_PREV: usize = 8; // 4 bytes - previous page
pub const FIL_PAGE_NEXT: usize = 12; // 4 bytes - next page
pub const FIL_PAGE_LSN: usize = 16; // 8 bytes - LSN of newest modification
pub const FIL_PAGE_TYPE: usize = 24; // 2 bytes - page type
pub const FIL_PAGE_FILE_FLUSH_LSN: usize = 26; // 8 bytes - flush LSN
pub const FIL_PAGE_SPACE_ID: usize = 34; // 4 bytes - space id

// FIL Trailer (8 bytes total, at page_size - 8)
pub const SIZE_FIL_TRAILER: usize = 8;

// Start of page body
pub const FIL_PAGE_DATA: usize = 38;

// "No page" link value
pub const FIL_NULL: u32 = 0xFFFFFFFF;

// Stored checksum written when innodb_checksum_algorithm=none
pub const BUF_NO_CHECKSUM_MAGIC: u32 = 0xDEADBEEF;

// FSP Header (starts at FIL_PAGE_DATA on page 0)
pub const FSP_HEADER_SIZE: usize = 112;
pub const FSP_SPACE_ID: usize = 0; // 4 bytes
pub const FSP_SIZE: usize = 8; // 4 bytes - size in pages
pub const FSP_FREE_LIMIT: usize = 12; // 4 bytes
pub const FSP_SPACE_FLAGS: usize = 16; // 4 bytes
pub const FSP_FRAG_N_USED: usize = 20; // 4 bytes

// Index page header (starts at FIL_PAGE_DATA)
pub const PAGE_N_DIR_SLOTS: usize = 0; // 2 bytes
pub const PAGE_HEAP_TOP: usize = 2; // 2 bytes
pub const PAGE_N_HEAP: usize = 4; // 2 bytes, bit 15 = compact flag
pub const PAGE_FREE: usize = 6; // 2 bytes
pub const PAGE_GARBAGE: usize = 8; // 2 bytes
pub const PAGE_LAST_INSERT: usize = 10; // 2 bytes
pub const PAGE_DIRECTION: usize = 12; // 2 bytes
pub const PAGE_N_DIRECTION: usize = 14; // 2 bytes
pub const PAGE_N_RECS: usize = 16; // 2 bytes
pub const PAGE_MAX_TRX_ID: usize = 18; // 8 bytes
pub const PAGE_LEVEL: usize = 26; // 2 bytes, 0 = leaf
pub const PAGE_INDEX_ID: usize = 28; // 8 bytes
pub const INDEX_HEADER_SIZE: usize = 36;

pub const FSEG_HEADER_SIZE: usize = 10;

// PAGE_HEADER(38) + 36 + 2 * FSEG_HEADER_SIZE
pub const PAGE_DATA: usize = FIL_PAGE_DATA + INDEX_HEADER_SIZE + 2 * FSEG_HEADER_SIZE; // 94

pub const PAGE_N_HEAP_COMPACT_FLAG: u16 = 0x8000;

// Record extra bytes
pub const REC_N_NEW_EXTRA_BYTES: usize = 5;
pub const REC_N_OLD_EXTRA_BYTES: usize = 6;

// System record data ("infimum\0" / "supremum")
pub const SYSTEM_RECORD_DATA_SIZE: usize = 8;

pub const PAGE_NEW_INFIMUM: usize = PAGE_DATA + REC_N_NEW_EXTRA_BYTES; // 99
pub const PAGE_NEW_SUPREMUM: usize = PAGE_NEW_INFIMUM + REC_N_NEW_EXTRA_BYTES + SYSTEM_RECORD_DATA_SIZE; // 112
// Redundant system records carry one field-offset byte each
pub const PAGE_OLD_INFIMUM: usize = PAGE_DATA + REC_N_OLD_EXTRA_BYTES + 1; // 101
pub const PAGE_OLD_SUPREMUM: usize = PAGE_OLD_INFIMUM + REC_N_OLD_EXTRA_BYTES + 1 + SYSTEM_RECORD_DATA_SIZE; // 116

// Page directory slot width
pub const PAGE_DIR_SLOT_SIZE: usize = 2;

// Record info flags (upper nibble of the info/n_owned byte)
pub const REC_INFO_MIN_REC_FLAG: u8 = 0x10;
pub const REC_INFO_DELETED_FLAG: u8 = 0x20;

// Redundant field-offset table masks
pub const REC_1BYTE_OFFS_MASK: u16 = 0x7F;
pub const REC_1BYTE_SQL_NULL_MASK: u16 = 0x80;
pub const REC_2BYTE_OFFS_MASK: u16 = 0x3FFF;
pub const REC_2BYTE_SQL_NULL_MASK: u16 = 0x8000;
pub const REC_2BYTE_EXTERN_MASK: u16 = 0x4000;

// Compact variable-length table flags (first length byte)
pub const REC_VARLEN_TWO_BYTE_FLAG: u8 = 0x80;
pub const REC_VARLEN_EXTERN_FLAG: u8 = 0x40;

// Off-page column reference
pub const FIELD_REF_SIZE: usize = 20;
pub const EXTERN_LENGTH_MASK: u32 = 0x3FFFFFFF;

// Node pointer child page number
pub const NODE_PTR_CHILD_SIZE: usize = 4;

// System column widths
pub const DATA_TRX_ID_LEN: usize = 6;
pub const DATA_ROLL_PTR_LEN: usize = 7;
pub const DATA_ROW_ID_LEN: usize = 6;

// Data dictionary header (page 7 of the system space, at FIL_PAGE_DATA)
pub const DICT_HDR_PAGE_NO: u64 = 7;
pub const DICT_HDR_ROW_ID: usize = 0; // 8 bytes
pub const DICT_HDR_TABLE_ID: usize = 8; // 8 bytes
pub const DICT_HDR_INDEX_ID: usize = 16; // 8 bytes
pub const DICT_HDR_MAX_SPACE_ID: usize = 24; // 4 bytes
pub const DICT_HDR_MIX_ID_LOW: usize = 28; // 4 bytes
pub const DICT_HDR_TABLES: usize = 32; // 4 bytes - SYS_TABLES.PRIMARY root
pub const DICT_HDR_TABLE_IDS: usize = 36; // 4 bytes - SYS_TABLES.ID root
pub const DICT_HDR_COLUMNS: usize = 40; // 4 bytes - SYS_COLUMNS.PRIMARY root
pub const DICT_HDR_INDEXES: usize = 44; // 4 bytes - SYS_INDEXES.PRIMARY root
pub const DICT_HDR_FIELDS: usize = 48; // 4 bytes - SYS_FIELDS.PRIMARY root
pub const DICT_HDR_UNUSED_SPACE: usize = 52; // 4 bytes
pub const DICT_HDR_FSEG_HEADER: usize = 56; // 10 bytes

// SYS_INDEXES.TYPE bits
pub const DICT_CLUSTERED: u64 = 1;
pub const DICT_UNIQUE: u64 = 2;

// SYS_COLUMNS.MTYPE codes
pub const DATA_VARCHAR: u64 = 1;
pub const DATA_CHAR: u64 = 2;
pub const DATA_FIXBINARY: u64 = 3;
pub const DATA_BINARY: u64 = 4;
pub const DATA_BLOB: u64 = 5;
pub const DATA_INT: u64 = 6;
pub const DATA_SYS: u64 = 8;
pub const DATA_VARMYSQL: u64 = 12;
pub const DATA_MYSQL: u64 = 13;

// SYS_COLUMNS.PRTYPE flags
pub const DATA_NOT_NULL: u64 = 256;
pub const DATA_UNSIGNED: u64 = 512;
pub const DATA_BINARY_TYPE: u64 = 1024;

// Insert direction values
pub const PAGE_LEFT: u16 = 1;
pub const PAGE_RIGHT: u16 = 2;
pub const PAGE_SAME_REC: u16 = 3;
pub const PAGE_SAME_PAGE: u16 = 4;
pub const PAGE_NO_DIRECTION: u16 = 5;
