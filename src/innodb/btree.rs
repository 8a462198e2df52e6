//! B+Tree traversal over a [`PageStore`].
//!
//! [`BTreeIndex`] descends from a root page along the minimum node pointer
//! of every level to reach the leftmost page of a target level, then follows
//! the leaf sibling chain (`FIL_PAGE_NEXT`) until `FIL_NULL`. Every page is
//! fetched from the store on demand; nothing is cached between calls.
//!
//! Corrupt links (out-of-range page numbers, cycles, level mismatches) are
//! reported as [`IdbError::MalformedLink`] instead of looping.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::innodb::index::{IndexPage, Record};
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::innodb::record::RecordType;
use crate::innodb::schema::RecordDescriber;
use crate::innodb::space::PageStore;
use crate::IdbError;

/// What a scan does when a record or page fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Return the first error.
    #[default]
    Abort,
    /// Log it, keep it in [`ScanOutcome::errors`] and continue.
    SkipErrors,
}

/// Records collected by [`BTreeIndex::scan`].
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub records: Vec<Record>,
    pub errors: Vec<IdbError>,
}

/// One index tree inside a page store.
pub struct BTreeIndex<'s> {
    store: &'s dyn PageStore,
    root: u64,
    describer: Option<RecordDescriber>,
}

impl<'s> BTreeIndex<'s> {
    /// Open the tree rooted at `root`. The root must be an INDEX page.
    pub fn open(
        store: &'s dyn PageStore,
        root: u64,
        describer: Option<RecordDescriber>,
    ) -> Result<Self, IdbError> {
        if root >= store.page_count() {
            return Err(IdbError::Argument(format!(
                "Root page {} is beyond the end of the space ({} pages)",
                root,
                store.page_count()
            )));
        }
        let index = BTreeIndex {
            store,
            root,
            describer,
        };
        let root_page = index.root_page()?;
        debug!(
            root,
            index_id = root_page.index_id(),
            level = root_page.level(),
            row_format = root_page.row_format().name(),
            "opened index tree"
        );
        Ok(index)
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn store(&self) -> &'s dyn PageStore {
        self.store
    }

    pub fn describer(&self) -> Option<&RecordDescriber> {
        self.describer.as_ref()
    }

    fn wrap(&self, page: Page) -> Result<IndexPage<'_>, IdbError> {
        let page = IndexPage::open(page)?;
        Ok(match &self.describer {
            Some(d) => page.with_describer(d),
            None => page,
        })
    }

    /// Read page `number` as an INDEX page of this tree.
    pub fn page(&self, number: u64) -> Result<IndexPage<'_>, IdbError> {
        self.wrap(self.store.read_page(number)?)
    }

    pub fn root_page(&self) -> Result<IndexPage<'_>, IdbError> {
        self.page(self.root)
    }

    /// Index id stored in the root page header.
    pub fn index_id(&self) -> Result<u64, IdbError> {
        Ok(self.root_page()?.index_id())
    }

    fn check_in_range(&self, from: u64, target: u64, what: &str) -> Result<(), IdbError> {
        if target >= self.store.page_count() {
            return Err(IdbError::MalformedLink {
                page: from,
                reason: format!(
                    "{} page {} is beyond the end of the space ({} pages)",
                    what,
                    target,
                    self.store.page_count()
                ),
            });
        }
        Ok(())
    }

    /// Leftmost page of `level`, reached by following the minimum node
    /// pointer of every level above it.
    pub fn min_page_at_level(&self, level: u16) -> Result<IndexPage<'_>, IdbError> {
        let mut page = self.root_page()?;
        if level > page.level() {
            return Err(IdbError::Argument(format!(
                "Level {} is above the root of index at page {} (level {})",
                level,
                self.root,
                page.level()
            )));
        }

        let mut visited = HashSet::from([self.root]);
        while page.level() > level {
            let record = page.min_record()?.ok_or_else(|| IdbError::MalformedLink {
                page: page.number(),
                reason: "non-leaf page has no records".to_string(),
            })?;
            if record.record_type() != RecordType::NodePointer {
                return Err(IdbError::MalformedLink {
                    page: page.number(),
                    reason: format!(
                        "minimum record at offset {} is {}, not a node pointer",
                        record.offset,
                        record.record_type().name()
                    ),
                });
            }
            let child = match record.child_page_number {
                Some(child) => child as u64,
                None => {
                    return Err(IdbError::SchemaRequired {
                        page: page.number(),
                        offset: record.offset,
                    })
                }
            };

            self.check_in_range(page.number(), child, "child")?;
            if !visited.insert(child) {
                return Err(IdbError::MalformedLink {
                    page: page.number(),
                    reason: format!("child page {} was already visited", child),
                });
            }

            let next = self.page(child)?;
            if next.level() + 1 != page.level() {
                return Err(IdbError::MalformedLink {
                    page: page.number(),
                    reason: format!(
                        "child page {} is at level {}, expected {}",
                        child,
                        next.level(),
                        page.level() - 1
                    ),
                });
            }
            debug!(from = page.number(), to = child, level = next.level(), "descend");
            page = next;
        }
        Ok(page)
    }

    /// Lazily iterate the leaf level from left to right.
    pub fn leaf_pages(&self) -> Result<LeafPages<'_, 's>, IdbError> {
        let first = self.min_page_at_level(0)?;
        let visited = HashSet::from([first.number()]);
        Ok(LeafPages {
            index: self,
            first: Some(first),
            next: None,
            from: self.root,
            visited,
            done: false,
        })
    }

    /// All leaf pages in sibling-link order.
    pub fn each_leaf_page(&self) -> Result<Vec<IndexPage<'_>>, IdbError> {
        self.leaf_pages()?.collect()
    }

    /// Every user record on the leaf level; fails on the first error.
    pub fn each_record(&self) -> Result<Vec<Record>, IdbError> {
        Ok(self.scan(ScanMode::Abort)?.records)
    }

    /// Walk every leaf record, handling decode errors per `mode`.
    ///
    /// Errors locating the leftmost leaf are always returned.
    pub fn scan(&self, mode: ScanMode) -> Result<ScanOutcome, IdbError> {
        self.scan_with(mode, |_| {})
    }

    /// Like [`scan`](Self::scan), calling `on_leaf` after each leaf page.
    pub fn scan_with<F>(&self, mode: ScanMode, mut on_leaf: F) -> Result<ScanOutcome, IdbError>
    where
        F: FnMut(&IndexPage<'_>),
    {
        let mut outcome = ScanOutcome::default();
        for page in self.leaf_pages()? {
            let page = match page {
                Ok(page) => page,
                Err(e) if mode == ScanMode::SkipErrors => {
                    warn!(root = self.root, error = %e, "leaf chain broken, stopping scan");
                    outcome.errors.push(e);
                    break;
                }
                Err(e) => return Err(e),
            };

            for record in page.cursor() {
                match record {
                    Ok(record) if record.record_type() == RecordType::Conventional => {
                        outcome.records.push(record)
                    }
                    Ok(_) => {}
                    Err(e) if mode == ScanMode::SkipErrors => {
                        warn!(page = page.number(), error = %e, "skipping record");
                        outcome.errors.push(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            on_leaf(&page);
        }
        debug!(
            root = self.root,
            records = outcome.records.len(),
            errors = outcome.errors.len(),
            "scan finished"
        );
        Ok(outcome)
    }
}

/// Iterator over the leaf level of a [`BTreeIndex`].
pub struct LeafPages<'b, 's> {
    index: &'b BTreeIndex<'s>,
    first: Option<IndexPage<'b>>,
    next: Option<u64>,
    from: u64,
    visited: HashSet<u64>,
    done: bool,
}

impl<'b> LeafPages<'b, '_> {
    fn fail(&mut self, reason: String) -> Option<Result<IndexPage<'b>, IdbError>> {
        self.done = true;
        Some(Err(IdbError::MalformedLink {
            page: self.from,
            reason,
        }))
    }
}

impl<'b> Iterator for LeafPages<'b, '_> {
    type Item = Result<IndexPage<'b>, IdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let page = match self.first.take() {
            Some(page) => page,
            None => {
                let number = self.next?;
                let page_count = self.index.store.page_count();
                if number >= page_count {
                    return self.fail(format!(
                        "next page {} is beyond the end of the space ({} pages)",
                        number, page_count
                    ));
                }
                if !self.visited.insert(number) || self.visited.len() as u64 > page_count {
                    return self.fail(format!("sibling chain revisits page {}", number));
                }

                let raw = match self.index.store.read_page(number) {
                    Ok(raw) => raw,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };
                if raw.page_type() != PageType::Index {
                    warn!(
                        page = number,
                        page_type = %raw.page_type(),
                        "sibling is not an INDEX page, stopping"
                    );
                    self.done = true;
                    return None;
                }
                let page = match self.index.wrap(raw) {
                    Ok(page) => page,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };
                if !page.is_leaf() {
                    return self.fail(format!(
                        "sibling page {} is at level {}",
                        number,
                        page.level()
                    ));
                }
                debug!(from = self.from, to = number, "leaf hop");
                page
            }
        };

        self.from = page.number();
        self.next = page.next();
        Some(Ok(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::*;
    use crate::innodb::space::Space;
    use byteorder::{BigEndian, ByteOrder};

    const PS: usize = SIZE_PAGE_DEFAULT as usize;

    /// Empty compact INDEX page at `level` with the given siblings.
    fn empty_index_page(number: u32, level: u16, prev: u32, next: u32) -> Vec<u8> {
        let mut buf = vec![0u8; PS];
        BigEndian::write_u32(&mut buf[FIL_PAGE_OFFSET..], number);
        BigEndian::write_u32(&mut buf[FIL_PAGE_PREV..], prev);
        BigEndian::write_u32(&mut buf[FIL_PAGE_NEXT..], next);
        BigEndian::write_u16(&mut buf[FIL_PAGE_TYPE..], 17855);
        BigEndian::write_u16(
            &mut buf[FIL_PAGE_DATA + PAGE_N_HEAP..],
            PAGE_N_HEAP_COMPACT_FLAG | 2,
        );
        BigEndian::write_u16(&mut buf[FIL_PAGE_DATA + PAGE_LEVEL..], level);
        BigEndian::write_u16(&mut buf[PAGE_NEW_INFIMUM - 4..], 2);
        BigEndian::write_i16(
            &mut buf[PAGE_NEW_INFIMUM - 2..],
            (PAGE_NEW_SUPREMUM - PAGE_NEW_INFIMUM) as i16,
        );
        BigEndian::write_u16(&mut buf[PAGE_NEW_SUPREMUM - 4..], (1 << 3) | 3);
        buf
    }

    fn space_of(pages: Vec<Vec<u8>>) -> Space {
        Space::from_bytes(pages.concat()).unwrap()
    }

    #[test]
    fn test_open_rejects_out_of_range_root() {
        let space = space_of(vec![vec![0u8; PS], empty_index_page(1, 0, FIL_NULL, FIL_NULL)]);
        assert!(BTreeIndex::open(&space, 5, None).is_err());
        assert!(BTreeIndex::open(&space, 0, None).is_err());
        assert!(BTreeIndex::open(&space, 1, None).is_ok());
    }

    #[test]
    fn test_single_leaf_root() {
        let space = space_of(vec![vec![0u8; PS], empty_index_page(1, 0, FIL_NULL, FIL_NULL)]);
        let index = BTreeIndex::open(&space, 1, None).unwrap();
        assert_eq!(index.min_page_at_level(0).unwrap().number(), 1);
        assert_eq!(index.each_leaf_page().unwrap().len(), 1);
        assert!(index.each_record().unwrap().is_empty());
        assert!(index.min_page_at_level(1).is_err());
    }

    #[test]
    fn test_leaf_chain_stops_at_non_index_page() {
        let mut sys = vec![0u8; PS];
        BigEndian::write_u16(&mut sys[FIL_PAGE_TYPE..], 6);
        let space = space_of(vec![
            vec![0u8; PS],
            empty_index_page(1, 0, FIL_NULL, 2),
            sys,
        ]);
        let index = BTreeIndex::open(&space, 1, None).unwrap();
        assert_eq!(index.each_leaf_page().unwrap().len(), 1);
    }

    #[test]
    fn test_leaf_chain_out_of_range() {
        let space = space_of(vec![vec![0u8; PS], empty_index_page(1, 0, FIL_NULL, 40)]);
        let index = BTreeIndex::open(&space, 1, None).unwrap();
        match index.each_leaf_page() {
            Err(IdbError::MalformedLink { page, reason }) => {
                assert_eq!(page, 1);
                assert!(reason.contains("40"));
            }
            other => panic!("expected MalformedLink, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_skip_errors_keeps_partial_results() {
        let space = space_of(vec![
            vec![0u8; PS],
            empty_index_page(1, 0, FIL_NULL, 2),
            empty_index_page(2, 0, 1, 1),
        ]);
        let index = BTreeIndex::open(&space, 1, None).unwrap();
        assert!(index.each_record().is_err());
        let outcome = index.scan(ScanMode::SkipErrors).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.errors.len(), 1);
    }
}
