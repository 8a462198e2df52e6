//! Page storage: one or more data files viewed as a single page-addressable space.
//!
//! [`PageStore`] is the seam every traversal goes through. [`Space`] is the
//! file-backed implementation: data files are concatenated in the order
//! given, so page `n` lives at byte `n * page_size` of the logical stream even
//! when the system tablespace is split over `ibdata1,ibdata2,...`.
//!
//! Reads are synchronous and uncached. The space is not `Sync`; each reader
//! holds its own seek position behind a `RefCell`.

use std::cell::RefCell;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::innodb::constants::*;
use crate::innodb::page::{FspHeader, Page};
use crate::IdbError;

/// Source of fixed-size pages.
pub trait PageStore {
    /// Size of every page in bytes.
    fn page_size(&self) -> u32;

    /// Number of whole pages addressable in the store.
    fn page_count(&self) -> u64;

    /// Space id the store belongs to (0 for the system space).
    fn space_id(&self) -> u32;

    /// Read page `page_number` with its FIL header decoded.
    fn read_page(&self, page_number: u64) -> Result<Page, IdbError>;

    /// True if this is the system tablespace.
    fn is_system_space(&self) -> bool {
        self.space_id() == 0
    }
}

/// Supertrait combining `Read + Seek` for type-erased readers.
pub(crate) trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

enum Source {
    Reader(RefCell<Box<dyn ReadSeek>>),
    #[cfg(feature = "cli")]
    Mapped(memmap2::Mmap),
}

/// One file (or in-memory segment) of a space, located at `offset` in the
/// logical byte stream.
struct DataFile {
    name: String,
    offset: u64,
    size: u64,
    source: Source,
}

impl DataFile {
    fn read_at(&self, local_offset: u64, buf: &mut [u8]) -> Result<(), IdbError> {
        match &self.source {
            Source::Reader(reader) => {
                let mut reader = reader.borrow_mut();
                reader.seek(SeekFrom::Start(local_offset)).map_err(|e| {
                    IdbError::Io(format!(
                        "Cannot seek to {} in {}: {}",
                        local_offset, self.name, e
                    ))
                })?;
                reader.read_exact(buf).map_err(|e| {
                    IdbError::Io(format!(
                        "Cannot read {} bytes at {} in {}: {}",
                        buf.len(),
                        local_offset,
                        self.name,
                        e
                    ))
                })
            }
            #[cfg(feature = "cli")]
            Source::Mapped(mmap) => {
                let start = local_offset as usize;
                let end = start + buf.len();
                if end > mmap.len() {
                    return Err(IdbError::Io(format!(
                        "Read past end of {} ({} > {})",
                        self.name,
                        end,
                        mmap.len()
                    )));
                }
                buf.copy_from_slice(&mmap[start..end]);
                Ok(())
            }
        }
    }
}

/// A tablespace made of one or more data files.
pub struct Space {
    name: String,
    files: Vec<DataFile>,
    total_size: u64,
    page_size: u32,
    space_id: u32,
    fsp_header: Option<FspHeader>,
}

impl Space {
    /// Open the given data files in order as one space.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self, IdbError> {
        let mut segments = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file = std::fs::File::open(path)
                .map_err(|e| IdbError::Io(format!("Cannot open {}: {}", path.display(), e)))?;
            let size = file
                .metadata()
                .map_err(|e| IdbError::Io(format!("Cannot stat {}: {}", path.display(), e)))?
                .len();
            segments.push((
                path.display().to_string(),
                size,
                Source::Reader(RefCell::new(Box::new(file) as Box<dyn ReadSeek>)),
            ));
        }
        Self::assemble(segments)
    }

    /// Open the given data files using memory-mapped I/O.
    ///
    /// # Safety
    ///
    /// `mmap` is `unsafe` because another process could modify the file while
    /// it is mapped. The files are expected to be copies or belong to a
    /// stopped server, which is the forensic use case this reader serves.
    #[cfg(feature = "cli")]
    pub fn open_mmap<P: AsRef<Path>>(paths: &[P]) -> Result<Self, IdbError> {
        let mut segments = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file = std::fs::File::open(path)
                .map_err(|e| IdbError::Io(format!("Cannot open {}: {}", path.display(), e)))?;
            let mmap = unsafe {
                memmap2::Mmap::map(&file)
                    .map_err(|e| IdbError::Io(format!("Cannot mmap {}: {}", path.display(), e)))?
            };
            segments.push((
                path.display().to_string(),
                mmap.len() as u64,
                Source::Mapped(mmap),
            ));
        }
        Self::assemble(segments)
    }

    /// Build a single-file space from an in-memory image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, IdbError> {
        Self::from_segments(vec![data])
    }

    /// Build a multi-file space from in-memory segments, concatenated in order.
    pub fn from_segments(segments: Vec<Vec<u8>>) -> Result<Self, IdbError> {
        let segments = segments
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                let size = data.len() as u64;
                (
                    format!("<memory:{}>", i),
                    size,
                    Source::Reader(RefCell::new(Box::new(Cursor::new(data)) as Box<dyn ReadSeek>)),
                )
            })
            .collect();
        Self::assemble(segments)
    }

    fn assemble(segments: Vec<(String, u64, Source)>) -> Result<Self, IdbError> {
        if segments.is_empty() {
            return Err(IdbError::Argument("No data files given".to_string()));
        }

        let name = segments
            .iter()
            .map(|(n, _, _)| n.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut files = Vec::with_capacity(segments.len());
        let mut offset = 0u64;
        for (name, size, source) in segments {
            files.push(DataFile {
                name,
                offset,
                size,
                source,
            });
            offset += size;
        }

        let mut space = Space {
            name,
            files,
            total_size: offset,
            page_size: SIZE_PAGE_DEFAULT,
            space_id: 0,
            fsp_header: None,
        };

        if space.total_size < (SIZE_FIL_HEAD + FSP_HEADER_SIZE) as u64 {
            return Err(IdbError::Parse(format!(
                "{} is too small to be a tablespace: {} bytes",
                space.name, space.total_size
            )));
        }

        let head_len = space.total_size.min(SIZE_PAGE_DEFAULT as u64) as usize;
        let mut head = vec![0u8; head_len];
        space.read_at(0, &mut head)?;
        space.fsp_header = FspHeader::parse(&head);
        space.space_id = match &space.fsp_header {
            Some(fsp) => fsp.space_id,
            None => BigEndian::read_u32(&head[FIL_PAGE_SPACE_ID..]),
        };

        debug!(
            space = %space.name,
            space_id = space.space_id,
            bytes = space.total_size,
            files = space.files.len(),
            "opened space"
        );
        Ok(space)
    }

    /// Override the page size (default 16 KiB).
    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, IdbError> {
        if !matches!(page_size, 4096 | 8192 | 16384 | 32768 | 65536) {
            return Err(IdbError::Argument(format!(
                "Unsupported page size {}",
                page_size
            )));
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Comma-joined names of the underlying files.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total size in bytes of all data files.
    pub fn size(&self) -> u64 {
        self.total_size
    }

    /// Number of data files backing the space.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// FSP header from page 0, if it parsed.
    pub fn fsp_header(&self) -> Option<&FspHeader> {
        self.fsp_header.as_ref()
    }

    /// Page 7 of the system space, which holds the data dictionary header.
    pub fn data_dictionary_header_page(&self) -> Result<Page, IdbError> {
        if !self.is_system_space() {
            return Err(IdbError::Argument(format!(
                "{} is space {}, not the system space",
                self.name, self.space_id
            )));
        }
        self.read_page(DICT_HDR_PAGE_NO)
    }

    /// Read `buf.len()` bytes at logical `offset`, crossing file boundaries.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), IdbError> {
        let end = offset + buf.len() as u64;
        if end > self.total_size {
            return Err(IdbError::Io(format!(
                "Read of {} bytes at {} is past the end of {} ({} bytes)",
                buf.len(),
                offset,
                self.name,
                self.total_size
            )));
        }

        let mut filled = 0usize;
        for file in &self.files {
            let file_end = file.offset + file.size;
            let pos = offset + filled as u64;
            if filled == buf.len() {
                break;
            }
            if pos >= file_end || pos < file.offset {
                continue;
            }
            let take = ((file_end - pos) as usize).min(buf.len() - filled);
            file.read_at(pos - file.offset, &mut buf[filled..filled + take])?;
            filled += take;
        }

        if filled != buf.len() {
            return Err(IdbError::Io(format!(
                "Short read at {} in {}: {} of {} bytes",
                offset,
                self.name,
                filled,
                buf.len()
            )));
        }
        Ok(())
    }
}

impl PageStore for Space {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn page_count(&self) -> u64 {
        self.total_size / self.page_size as u64
    }

    fn space_id(&self) -> u32 {
        self.space_id
    }

    fn read_page(&self, page_number: u64) -> Result<Page, IdbError> {
        if page_number >= self.page_count() {
            return Err(IdbError::Argument(format!(
                "Page {} out of range ({} has {} pages)",
                page_number,
                self.name,
                self.page_count()
            )));
        }

        let mut buf = vec![0u8; self.page_size as usize];
        self.read_at(page_number * self.page_size as u64, &mut buf)?;
        Page::new(page_number, buf)
    }
}
