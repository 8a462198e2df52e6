//! Iteration over the record chain of one INDEX page.
//!
//! Records on a page form a singly linked list from the infimum to the
//! supremum. [`RecordCursor`] follows it and decodes each user record with
//! the page's describer. The walk ends at the supremum, at a record that
//! points to itself, or at a link leaving the page; a chain longer than the
//! page could possibly hold is reported as [`IdbError::MalformedLink`].

use tracing::warn;

use crate::innodb::index::{IndexPage, Record};
use crate::IdbError;

/// Direction of a [`RecordCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    /// Follow `next` pointers toward the supremum.
    Forward,
    /// Yield the records before the start offset, nearest first.
    Backward,
}

/// Cursor over the user records of one page.
pub struct RecordCursor<'p, 'd> {
    page: &'p IndexPage<'d>,
    current: usize,
    direction: CursorDirection,
    /// Offsets still to yield when walking backward.
    pending: Option<Vec<usize>>,
    steps: usize,
    done: bool,
}

impl<'p, 'd> RecordCursor<'p, 'd> {
    /// Start at `start_offset` (exclusive). Forward from the infimum visits
    /// every record; backward from the supremum visits every record in
    /// reverse.
    pub fn new(page: &'p IndexPage<'d>, start_offset: usize, direction: CursorDirection) -> Self {
        RecordCursor {
            page,
            current: start_offset,
            direction,
            pending: None,
            steps: 0,
            done: false,
        }
    }

    pub fn direction(&self) -> CursorDirection {
        self.direction
    }

    /// Offset of the record most recently yielded (or the start offset).
    pub fn position(&self) -> usize {
        self.current
    }

    fn step_limit(&self) -> usize {
        self.page.page().len() / self.page.row_format().extra_bytes()
    }

    /// Advance one link. `Ok(None)` at the end of the chain.
    fn advance(&mut self) -> Result<Option<usize>, IdbError> {
        let page = self.page;
        let header = page.header_at(self.current)?;
        let next = header.next;

        if next == page.row_format().supremum_offset() || next == self.current {
            return Ok(None);
        }
        if next < page.row_format().extra_bytes() || next >= page.page().len() {
            warn!(
                page = page.number(),
                offset = self.current,
                next,
                "record link leaves the page, stopping"
            );
            return Ok(None);
        }

        self.steps += 1;
        if self.steps > self.step_limit() {
            return Err(IdbError::MalformedLink {
                page: page.number(),
                reason: format!("record chain loops at offset {}", next),
            });
        }
        self.current = next;
        Ok(Some(next))
    }

    /// Offsets of the records between the infimum and `until` (exclusive).
    fn offsets_before(&self, until: usize) -> Result<Vec<usize>, IdbError> {
        let mut walker = RecordCursor::new(
            self.page,
            self.page.row_format().infimum_offset(),
            CursorDirection::Forward,
        );
        let mut out = Vec::new();
        while let Some(offset) = walker.advance()? {
            if offset == until {
                break;
            }
            out.push(offset);
        }
        Ok(out)
    }
}

impl Iterator for RecordCursor<'_, '_> {
    type Item = Result<Record, IdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let offset = match self.direction {
            CursorDirection::Forward => self.advance(),
            CursorDirection::Backward => {
                if self.pending.is_none() {
                    match self.offsets_before(self.current) {
                        Ok(offsets) => self.pending = Some(offsets),
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                let popped = self.pending.as_mut().and_then(|p| p.pop());
                if let Some(offset) = popped {
                    self.current = offset;
                }
                Ok(popped)
            }
        };

        match offset {
            Ok(Some(offset)) => Some(self.page.record_at(offset)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
