//! Page checksum inspection.
//!
//! Checksums are reported, never enforced: a forensic read of a damaged page
//! is still attempted. Only CRC-32C (the MySQL 5.7.7+ default) is recomputed.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::*;

/// What the stored checksum of a page turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChecksumStatus {
    /// Stored checksum is zero and the page is all zeros.
    Empty,
    /// `innodb_checksum_algorithm=none` magic value.
    Disabled,
    /// Stored value equals the CRC-32C of the page.
    Crc32c { stored: u32 },
    /// Stored value does not match CRC-32C (may be a legacy checksum).
    Mismatch { stored: u32, crc32c: u32 },
    /// Buffer is shorter than a page.
    Truncated,
}

impl ChecksumStatus {
    pub fn is_match(&self) -> bool {
        matches!(
            self,
            ChecksumStatus::Empty | ChecksumStatus::Disabled | ChecksumStatus::Crc32c { .. }
        )
    }
}

/// Inspect the stored checksum of a full page buffer.
pub fn inspect(page_data: &[u8]) -> ChecksumStatus {
    if page_data.len() < FIL_PAGE_DATA + SIZE_FIL_TRAILER {
        return ChecksumStatus::Truncated;
    }

    let stored = BigEndian::read_u32(&page_data[FIL_PAGE_SPACE_OR_CHKSUM..]);
    if stored == BUF_NO_CHECKSUM_MAGIC {
        return ChecksumStatus::Disabled;
    }
    if stored == 0 && page_data.iter().all(|&b| b == 0) {
        return ChecksumStatus::Empty;
    }

    let computed = crc32c_of(page_data);
    if computed == stored {
        ChecksumStatus::Crc32c { stored }
    } else {
        ChecksumStatus::Mismatch {
            stored,
            crc32c: computed,
        }
    }
}

/// CRC-32C over bytes 4..26 and 38..(len - 8), skipping the stored checksum,
/// flush LSN, space id and trailer.
pub fn crc32c_of(page_data: &[u8]) -> u32 {
    let end = page_data.len() - SIZE_FIL_TRAILER;
    let crc = crc32c::crc32c(&page_data[FIL_PAGE_OFFSET..FIL_PAGE_FILE_FLUSH_LSN]);
    crc32c::crc32c_append(crc, &page_data[FIL_PAGE_DATA..end])
}
