//! Page-level structures shared by every InnoDB page.
//!
//! Every page begins with a 38-byte FIL header ([`FilHeader`]) holding the
//! checksum, page number, prev/next sibling links, LSN, page type, flush LSN
//! and space id. The last 8 bytes are the FIL trailer ([`FilTrailer`]).
//! Page 0 additionally carries the FSP header ([`FspHeader`]).
//!
//! [`Page`] bundles one raw page buffer with its decoded FIL header; it is
//! what a [`PageStore`](crate::innodb::space::PageStore) hands out.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::page_types::PageType;
use crate::IdbError;

/// Parsed FIL header (38 bytes, present at the start of every InnoDB page).
#[derive(Debug, Clone, Serialize)]
pub struct FilHeader {
    /// Checksum (or space id in very old formats). Bytes 0-3.
    pub checksum: u32,
    /// Page number within the tablespace. Bytes 4-7.
    pub page_number: u32,
    /// Previous page on the same B-tree level, FIL_NULL if none. Bytes 8-11.
    pub prev_page: u32,
    /// Next page on the same B-tree level, FIL_NULL if none. Bytes 12-15.
    pub next_page: u32,
    /// LSN of newest modification to this page. Bytes 16-23.
    pub lsn: u64,
    /// Page type. Bytes 24-25.
    pub page_type: PageType,
    /// Flush LSN (only meaningful for page 0 of the system tablespace). Bytes 26-33.
    pub flush_lsn: u64,
    /// Space ID this page belongs to. Bytes 34-37.
    pub space_id: u32,
}

impl FilHeader {
    /// Parse a FIL header from a byte slice of at least 38 bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SIZE_FIL_HEAD {
            return None;
        }

        Some(FilHeader {
            checksum: BigEndian::read_u32(&data[FIL_PAGE_SPACE_OR_CHKSUM..]),
            page_number: BigEndian::read_u32(&data[FIL_PAGE_OFFSET..]),
            prev_page: BigEndian::read_u32(&data[FIL_PAGE_PREV..]),
            next_page: BigEndian::read_u32(&data[FIL_PAGE_NEXT..]),
            lsn: BigEndian::read_u64(&data[FIL_PAGE_LSN..]),
            page_type: PageType::from_u16(BigEndian::read_u16(&data[FIL_PAGE_TYPE..])),
            flush_lsn: BigEndian::read_u64(&data[FIL_PAGE_FILE_FLUSH_LSN..]),
            space_id: BigEndian::read_u32(&data[FIL_PAGE_SPACE_ID..]),
        })
    }

    /// Returns true if the page links to a previous sibling.
    pub fn has_prev(&self) -> bool {
        self.prev_page != FIL_NULL && self.prev_page != 0
    }

    /// Returns true if the page links to a next sibling.
    pub fn has_next(&self) -> bool {
        self.next_page != FIL_NULL && self.next_page != 0
    }
}

/// Parsed FIL trailer (last 8 bytes of every page).
#[derive(Debug, Clone, Serialize)]
pub struct FilTrailer {
    /// Old-style checksum.
    pub checksum: u32,
    /// Low 32 bits of the page LSN.
    pub lsn_low32: u32,
}

impl FilTrailer {
    /// Parse the trailer from the 8 bytes at `page_size - 8`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SIZE_FIL_TRAILER {
            return None;
        }

        Some(FilTrailer {
            checksum: BigEndian::read_u32(&data[0..]),
            lsn_low32: BigEndian::read_u32(&data[4..]),
        })
    }
}

/// FSP header from page 0 of a tablespace.
#[derive(Debug, Clone, Serialize)]
pub struct FspHeader {
    pub space_id: u32,
    /// Size of the tablespace in pages.
    pub size: u32,
    /// Minimum page number not yet initialized.
    pub free_limit: u32,
    pub flags: u32,
    /// Number of used pages in the FSP_FREE_FRAG list.
    pub frag_n_used: u32,
}

impl FspHeader {
    /// Parse the FSP header from a full page 0 buffer.
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        if page_data.len() < FIL_PAGE_DATA + FSP_HEADER_SIZE {
            return None;
        }
        let data = &page_data[FIL_PAGE_DATA..];

        Some(FspHeader {
            space_id: BigEndian::read_u32(&data[FSP_SPACE_ID..]),
            size: BigEndian::read_u32(&data[FSP_SIZE..]),
            free_limit: BigEndian::read_u32(&data[FSP_FREE_LIMIT..]),
            flags: BigEndian::read_u32(&data[FSP_SPACE_FLAGS..]),
            frag_n_used: BigEndian::read_u32(&data[FSP_FRAG_N_USED..]),
        })
    }
}

/// One raw page together with its decoded FIL header.
///
/// Pages are immutable once read; nothing caches them, every traversal step
/// asks the store again.
#[derive(Debug, Clone)]
pub struct Page {
    number: u64,
    data: Vec<u8>,
    header: FilHeader,
}

impl Page {
    /// Wrap a page buffer read from position `number`.
    pub fn new(number: u64, data: Vec<u8>) -> Result<Self, IdbError> {
        let header = FilHeader::parse(&data).ok_or_else(|| {
            IdbError::Parse(format!(
                "Page {} is too short for a FIL header ({} bytes)",
                number,
                data.len()
            ))
        })?;
        Ok(Page {
            number,
            data,
            header,
        })
    }

    /// Position of the page in the space (not the stored page number field).
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn header(&self) -> &FilHeader {
        &self.header
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parse the FIL trailer at the end of the page.
    pub fn trailer(&self) -> Option<FilTrailer> {
        let start = self.data.len().checked_sub(SIZE_FIL_TRAILER)?;
        FilTrailer::parse(&self.data[start..])
    }

    /// Borrow `len` bytes at `offset`, failing with the page and offset named.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], IdbError> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[offset..end])
            .ok_or_else(|| {
                IdbError::Parse(format!(
                    "Read of {} bytes at offset {} overruns page {} ({} bytes)",
                    len,
                    offset,
                    self.number,
                    self.data.len()
                ))
            })
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, IdbError> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, IdbError> {
        Ok(BigEndian::read_u16(self.bytes(offset, 2)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, IdbError> {
        Ok(BigEndian::read_u32(self.bytes(offset, 4)?))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64, IdbError> {
        Ok(BigEndian::read_u64(self.bytes(offset, 8)?))
    }

    /// Read a big-endian unsigned integer of 1 to 8 bytes.
    pub fn read_uint(&self, offset: usize, width: usize) -> Result<u64, IdbError> {
        if width == 0 || width > 8 {
            return Err(IdbError::Argument(format!(
                "Cannot read a {}-byte integer",
                width
            )));
        }
        Ok(BigEndian::read_uint(self.bytes(offset, width)?, width))
    }
}
