//! InnoDB page type codes.
//!
//! Maps the 2-byte page type field (bytes 24-25 of the FIL header) to a
//! [`PageType`]. The numeric codes are on-disk constants from `fil0fil.h`;
//! codes this reader has no use for are preserved in [`PageType::Unknown`]
//! so they can still be reported.

use serde::Serialize;
use std::fmt;

/// Page types found in system and file-per-table tablespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageType {
    /// Freshly allocated, type field not initialized (FIL_PAGE_TYPE_ALLOCATED = 0)
    Allocated,
    /// Undo log page (FIL_PAGE_UNDO_LOG = 2)
    UndoLog,
    /// File segment inode (FIL_PAGE_INODE = 3)
    Inode,
    /// Insert buffer free list (FIL_PAGE_IBUF_FREE_LIST = 4)
    IbufFreeList,
    /// Insert buffer bitmap (FIL_PAGE_IBUF_BITMAP = 5)
    IbufBitmap,
    /// System internal page (FIL_PAGE_TYPE_SYS = 6)
    Sys,
    /// Transaction system header (FIL_PAGE_TYPE_TRX_SYS = 7)
    TrxSys,
    /// File space header, page 0 of each tablespace (FIL_PAGE_TYPE_FSP_HDR = 8)
    FspHdr,
    /// Extent descriptor (FIL_PAGE_TYPE_XDES = 9)
    Xdes,
    /// Uncompressed BLOB page (FIL_PAGE_TYPE_BLOB = 10)
    Blob,
    /// First compressed BLOB page (FIL_PAGE_TYPE_ZBLOB = 11)
    ZBlob,
    /// Subsequent compressed BLOB page (FIL_PAGE_TYPE_ZBLOB2 = 12)
    ZBlob2,
    /// B+Tree node (FIL_PAGE_INDEX = 17855)
    Index,
    /// Any other code, kept verbatim.
    Unknown(u16),
}

impl PageType {
    /// Decode the raw page type field.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::page_types::PageType;
    ///
    /// assert_eq!(PageType::from_u16(17855), PageType::Index);
    /// assert_eq!(PageType::from_u16(6), PageType::Sys);
    /// assert_eq!(PageType::from_u16(9999), PageType::Unknown(9999));
    /// assert_eq!(PageType::Unknown(9999).as_u16(), 9999);
    /// ```
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => PageType::Allocated,
            2 => PageType::UndoLog,
            3 => PageType::Inode,
            4 => PageType::IbufFreeList,
            5 => PageType::IbufBitmap,
            6 => PageType::Sys,
            7 => PageType::TrxSys,
            8 => PageType::FspHdr,
            9 => PageType::Xdes,
            10 => PageType::Blob,
            11 => PageType::ZBlob,
            12 => PageType::ZBlob2,
            17855 => PageType::Index,
            other => PageType::Unknown(other),
        }
    }

    /// Raw on-disk code.
    pub fn as_u16(self) -> u16 {
        match self {
            PageType::Allocated => 0,
            PageType::UndoLog => 2,
            PageType::Inode => 3,
            PageType::IbufFreeList => 4,
            PageType::IbufBitmap => 5,
            PageType::Sys => 6,
            PageType::TrxSys => 7,
            PageType::FspHdr => 8,
            PageType::Xdes => 9,
            PageType::Blob => 10,
            PageType::ZBlob => 11,
            PageType::ZBlob2 => 12,
            PageType::Index => 17855,
            PageType::Unknown(code) => code,
        }
    }

    /// Short upper-case name, as used in `fil0fil.h` without the prefix.
    pub fn name(self) -> &'static str {
        match self {
            PageType::Allocated => "ALLOCATED",
            PageType::UndoLog => "UNDO_LOG",
            PageType::Inode => "INODE",
            PageType::IbufFreeList => "IBUF_FREE_LIST",
            PageType::IbufBitmap => "IBUF_BITMAP",
            PageType::Sys => "SYS",
            PageType::TrxSys => "TRX_SYS",
            PageType::FspHdr => "FSP_HDR",
            PageType::Xdes => "XDES",
            PageType::Blob => "BLOB",
            PageType::ZBlob => "ZBLOB",
            PageType::ZBlob2 => "ZBLOB2",
            PageType::Index => "INDEX",
            PageType::Unknown(_) => "UNKNOWN",
        }
    }

    /// One-line description for dumps.
    pub fn description(self) -> &'static str {
        match self {
            PageType::Allocated => "Freshly allocated",
            PageType::UndoLog => "Undo log",
            PageType::Inode => "File segment inode",
            PageType::IbufFreeList => "Insert buffer free list",
            PageType::IbufBitmap => "Insert buffer bitmap",
            PageType::Sys => "System internal",
            PageType::TrxSys => "Transaction system header",
            PageType::FspHdr => "File space header",
            PageType::Xdes => "Extent descriptor",
            PageType::Blob => "Uncompressed BLOB",
            PageType::ZBlob => "First compressed BLOB",
            PageType::ZBlob2 => "Subsequent compressed BLOB",
            PageType::Index => "B+Tree index",
            PageType::Unknown(_) => "Unrecognized page type",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageType::Unknown(code) => write!(f, "UNKNOWN({})", code),
            other => f.write_str(other.name()),
        }
    }
}
