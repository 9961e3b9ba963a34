//! Intrusive page queues whose links live in the [`PageTable`].
//!
//! [`PageQueue`] is a doubly linked list that stores only `head`, `tail` and
//! `len`; the `prev`/`next` links sit in each page's [`PageRecord`]. That keeps
//! every queue operation O(1) without a second allocation per page.
//!
//! [`QueueSet`] owns one queue per [`QueueTag`] and keeps each record's tag in
//! step with the queue it is linked into:
//!
//! ```text
//!   QueueSet
//!   ┌───────┬──────────────────────────────────────────────┐
//!   │ New   │ head ─► [p7] ◄──► [p2] ◄── tail              │
//!   │ Cold  │ head ─► [p0] ◄──► [p3] ◄──► [p9] ◄── tail    │
//!   │ Hot   │ head ─► [p4] ◄── tail                        │
//!   │ List  │ (empty)                                      │
//!   │Reclaim│ head ─► [p5] ◄── tail                        │
//!   └───────┴──────────────────────────────────────────────┘
//!   head = oldest (next under the hand), tail = most recently queued
//! ```
//!
//! A tag that disagrees with the queue a page is found on is a broken
//! invariant and panics.
//!
//! [`PageRecord`]: super::PageRecord

use crate::ds::page_table::PageTable;
use crate::error::InvariantError;
use crate::page::{PageId, QueueTag};

/// Head/tail/length of one intrusive page queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageQueue {
    head: Option<PageId>,
    tail: Option<PageId>,
    len: usize,
}

impl PageQueue {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn front(&self) -> Option<PageId> {
        self.head
    }

    #[inline]
    pub fn back(&self) -> Option<PageId> {
        self.tail
    }

    pub fn push_back(&mut self, table: &mut PageTable, id: PageId) {
        let old_tail = self.tail;
        {
            let record = table.entry(id);
            record.prev = old_tail;
            record.next = None;
        }
        match old_tail {
            Some(tail) => table.linked(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    pub fn push_front(&mut self, table: &mut PageTable, id: PageId) {
        let old_head = self.head;
        {
            let record = table.entry(id);
            record.prev = None;
            record.next = old_head;
        }
        match old_head {
            Some(head) => table.linked(head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    /// Unlinks `id`, which must be on this queue.
    pub fn remove(&mut self, table: &mut PageTable, id: PageId) {
        assert!(self.len > 0, "{id} removed from an empty queue");
        let (prev, next) = {
            let record = table.linked(id);
            let links = (record.prev, record.next);
            record.prev = None;
            record.next = None;
            links
        };

        match prev {
            Some(prev_id) => table.linked(prev_id).next = next,
            None => {
                assert_eq!(self.head, Some(id), "{id} has no prev but is not head");
                self.head = next;
            },
        }
        match next {
            Some(next_id) => table.linked(next_id).prev = prev,
            None => {
                assert_eq!(self.tail, Some(id), "{id} has no next but is not tail");
                self.tail = prev;
            },
        }
        self.len -= 1;
    }

    pub fn pop_front(&mut self, table: &mut PageTable) -> Option<PageId> {
        let id = self.head?;
        self.remove(table, id);
        Some(id)
    }

    /// Iterates page ids from head (oldest) to tail.
    pub fn iter<'a>(&self, table: &'a PageTable) -> PageQueueIter<'a> {
        PageQueueIter {
            table,
            current: self.head,
            forward: true,
        }
    }

    /// Iterates page ids from tail (newest) to head.
    pub fn iter_rev<'a>(&self, table: &'a PageTable) -> PageQueueIter<'a> {
        PageQueueIter {
            table,
            current: self.tail,
            forward: false,
        }
    }
}

pub struct PageQueueIter<'a> {
    table: &'a PageTable,
    current: Option<PageId>,
    forward: bool,
}

impl Iterator for PageQueueIter<'_> {
    type Item = PageId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let record = self.table.get(id)?;
        self.current = if self.forward {
            record.next
        } else {
            record.prev
        };
        Some(id)
    }
}

/// One [`PageQueue`] per queued [`QueueTag`], with tag bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct QueueSet {
    queues: [PageQueue; QueueTag::QUEUED.len()],
}

impl QueueSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn slot(tag: QueueTag) -> usize {
        match tag.slot() {
            Some(slot) => slot,
            None => panic!("QueueTag::None has no queue"),
        }
    }

    #[inline]
    pub fn queue(&self, tag: QueueTag) -> &PageQueue {
        &self.queues[Self::slot(tag)]
    }

    #[inline]
    pub fn len(&self, tag: QueueTag) -> usize {
        self.queue(tag).len()
    }

    #[inline]
    pub fn front(&self, tag: QueueTag) -> Option<PageId> {
        self.queue(tag).front()
    }

    /// Total pages across all queues.
    pub fn total_len(&self) -> usize {
        self.queues.iter().map(PageQueue::len).sum()
    }

    /// Appends an untracked page to the tail of `tag`'s queue.
    pub fn insert_tail(&mut self, table: &mut PageTable, tag: QueueTag, id: PageId) {
        let slot = Self::slot(tag);
        let record = table.entry(id);
        assert_eq!(record.queue, QueueTag::None, "{id} inserted while queued");
        record.queue = tag;
        self.queues[slot].push_back(table, id);
    }

    /// Prepends an untracked page to the head of `tag`'s queue.
    pub fn insert_head(&mut self, table: &mut PageTable, tag: QueueTag, id: PageId) {
        let slot = Self::slot(tag);
        let record = table.entry(id);
        assert_eq!(record.queue, QueueTag::None, "{id} inserted while queued");
        record.queue = tag;
        self.queues[slot].push_front(table, id);
    }

    /// Unlinks `id` from whichever queue its tag names and clears the tag.
    ///
    /// Returns the tag the page had.
    pub fn remove(&mut self, table: &mut PageTable, id: PageId) -> QueueTag {
        let tag = table.queue(id);
        let slot = match tag.slot() {
            Some(slot) => slot,
            None => panic!("{id} removed but not queued"),
        };
        self.queues[slot].remove(table, id);
        table.linked(id).queue = QueueTag::None;
        tag
    }

    /// Unlinks `id`, asserting it is on `expected`.
    pub fn remove_from(&mut self, table: &mut PageTable, expected: QueueTag, id: PageId) {
        let actual = table.queue(id);
        assert_eq!(actual, expected, "{id} tagged {actual:?}, expected {expected:?}");
        self.remove(table, id);
    }

    /// Pops the head of `tag`'s queue, clearing its tag.
    pub fn pop_front(&mut self, table: &mut PageTable, tag: QueueTag) -> Option<PageId> {
        let id = self.front(tag)?;
        self.remove_from(table, tag, id);
        Some(id)
    }

    pub fn iter<'a>(&self, table: &'a PageTable, tag: QueueTag) -> PageQueueIter<'a> {
        self.queue(tag).iter(table)
    }

    pub fn iter_rev<'a>(&self, table: &'a PageTable, tag: QueueTag) -> PageQueueIter<'a> {
        self.queue(tag).iter_rev(table)
    }

    /// Walks every queue and checks links, lengths and tags.
    pub fn check_invariants(&self, table: &PageTable) -> Result<(), InvariantError> {
        for tag in QueueTag::QUEUED {
            let queue = self.queue(tag);
            let mut count = 0usize;
            let mut prev: Option<PageId> = None;
            let mut current = queue.front();
            while let Some(id) = current {
                count += 1;
                if count > queue.len() {
                    return Err(InvariantError::new(format!(
                        "{tag:?} queue: walked past recorded length {}",
                        queue.len()
                    )));
                }
                let record = table.get(id).ok_or_else(|| {
                    InvariantError::new(format!("{tag:?} queue: {id} has no record"))
                })?;
                if record.queue != tag {
                    return Err(InvariantError::new(format!(
                        "{id} on {tag:?} queue is tagged {:?}",
                        record.queue
                    )));
                }
                if record.prev != prev {
                    return Err(InvariantError::new(format!(
                        "{tag:?} queue: {id} prev link inconsistent"
                    )));
                }
                prev = Some(id);
                current = record.next;
            }
            if count != queue.len() {
                return Err(InvariantError::new(format!(
                    "{tag:?} queue: counted {count} but len = {}",
                    queue.len()
                )));
            }
            if queue.back() != prev {
                return Err(InvariantError::new(format!(
                    "{tag:?} queue: tail does not match last node"
                )));
            }
        }

        let tagged = table.iter_tracked().count();
        if tagged != self.total_len() {
            return Err(InvariantError::new(format!(
                "{tagged} pages tagged but queues hold {}",
                self.total_len()
            )));
        }
        Ok(())
    }
}
