//! Dense arena of per-page policy records, indexed by [`PageId`].
//!
//! Page ids are frame numbers handed out by the host, so the arena is a plain
//! `Vec` that grows on first touch of a larger id. A record is never removed;
//! an untracked page simply carries [`QueueTag::None`].
//!
//! ```text
//!   records: Vec<PageRecord>
//!   ┌────────┬──────────────────────────────────────────────┐
//!   │ PageId │ PageRecord { queue, flags, prev, next }      │
//!   ├────────┼──────────────────────────────────────────────┤
//!   │   0    │ { Cold, TEST,      prev: None,  next: 3 }    │
//!   │   1    │ { None, -,         -,           -       }    │
//!   │   2    │ { Hot,  HOT|REF,   prev: None,  next: None } │
//!   │   3    │ { Cold, -,         prev: 0,     next: None } │
//!   └────────┴──────────────────────────────────────────────┘
//! ```
//!
//! The `prev`/`next` links belong to whichever [`PageQueue`](super::PageQueue)
//! the record's tag names.

use crate::page::{PageFlags, PageId, QueueTag};

/// Policy metadata attached to one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRecord {
    pub(crate) queue: QueueTag,
    pub(crate) flags: PageFlags,
    pub(crate) prev: Option<PageId>,
    pub(crate) next: Option<PageId>,
}

impl PageRecord {
    #[inline]
    pub fn queue(&self) -> QueueTag {
        self.queue
    }

    #[inline]
    pub fn flags(&self) -> PageFlags {
        self.flags
    }
}

#[derive(Debug, Default)]
pub struct PageTable {
    records: Vec<PageRecord>,
}

impl PageTable {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Reserves room for ids below `span` without materialising records.
    pub fn reserve_span(&mut self, span: usize) {
        self.records
            .reserve(span.saturating_sub(self.records.len()));
    }

    pub fn get(&self, id: PageId) -> Option<&PageRecord> {
        self.records.get(id.index())
    }

    /// Returns the record for `id`, materialising it if needed.
    pub fn entry(&mut self, id: PageId) -> &mut PageRecord {
        let idx = id.index();
        if idx >= self.records.len() {
            self.records.resize_with(idx + 1, PageRecord::default);
        }
        &mut self.records[idx]
    }

    /// Returns the record for an id that must already be materialised.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never touched; queue links only ever name
    /// materialised records.
    #[inline]
    pub(crate) fn linked(&mut self, id: PageId) -> &mut PageRecord {
        match self.records.get_mut(id.index()) {
            Some(record) => record,
            None => panic!("{id} linked into a queue but has no record"),
        }
    }

    #[inline]
    pub fn queue(&self, id: PageId) -> QueueTag {
        self.get(id).map(|r| r.queue).unwrap_or_default()
    }

    #[inline]
    pub fn flags(&self, id: PageId) -> PageFlags {
        self.get(id).map(|r| r.flags).unwrap_or_default()
    }

    #[inline]
    pub fn contains_flags(&self, id: PageId, flags: PageFlags) -> bool {
        self.flags(id).contains(flags)
    }

    pub fn insert_flags(&mut self, id: PageId, flags: PageFlags) {
        self.entry(id).flags.insert(flags);
    }

    pub fn remove_flags(&mut self, id: PageId, flags: PageFlags) {
        if let Some(record) = self.records.get_mut(id.index()) {
            record.flags.remove(flags);
        }
    }

    /// Drops all status bits of an untracked page.
    ///
    /// # Panics
    ///
    /// Panics if the page is still queued.
    pub fn reset(&mut self, id: PageId) {
        if let Some(record) = self.records.get_mut(id.index()) {
            assert_eq!(record.queue, QueueTag::None, "{id} reset while queued");
            *record = PageRecord::default();
        }
    }

    /// Iterates over records of tracked pages.
    pub fn iter_tracked(&self) -> impl Iterator<Item = (PageId, &PageRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.queue != QueueTag::None)
            .map(|(idx, r)| (PageId::new(idx), r))
    }

    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.records.capacity() * std::mem::size_of::<PageRecord>()
    }
}
