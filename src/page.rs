//! Page-facing vocabulary shared by the policy and its host.
//!
//! The policy never owns a page. It refers to pages by [`PageId`], keeps a
//! small record per id (queue tag + [`PageFlags`]), and reaches the page's
//! real state only through the [`PageHost`] collaborator:
//!
//! ```text
//!   ┌──────────────────────────┐            ┌──────────────────────────────┐
//!   │        ClockPro          │  PageId    │          PageHost            │
//!   │                          │ ─────────► │  identity(page)              │
//!   │  PageTable[PageId]       │            │  sample_reference(page, ..)  │
//!   │   { tag, flags, links }  │ ◄───────── │  test_reference(page)        │
//!   │                          │  RefSample │  try_drop_swap(page)         │
//!   └──────────────────────────┘            └──────────────────────────────┘
//! ```
//!
//! [`PageIdentity`] is only ever hashed; two unrelated pages that happen to
//! share an identity (object reuse after free) are an accepted inaccuracy.

use std::fmt;

use bitflags::bitflags;

/// Stable index of a page frame as seen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(usize);

impl PageId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for PageId {
    #[inline]
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}

/// Opaque identity of the object (file, anonymous region) a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// `(object, offset)` pair naming the contents of a page.
///
/// `offset` is a page index within the object, not a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageIdentity {
    pub object: ObjectId,
    pub offset: u64,
}

impl PageIdentity {
    #[inline]
    pub const fn new(object: ObjectId, offset: u64) -> Self {
        Self { object, offset }
    }
}

/// Which policy queue a page currently lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueTag {
    /// Not tracked by the policy.
    #[default]
    None,
    /// Arrival buffer; pages here have not met the cold hand yet.
    New,
    /// Cold region, in front of the cold hand.
    Cold,
    /// Hot region, in front of the hot hand.
    Hot,
    /// Cold pages the hot hand has passed during a takeover.
    List,
    /// Victims handed out by the cold hand, waiting for `remove`.
    Reclaim,
}

impl QueueTag {
    /// Tags that own a queue, in storage order.
    pub const QUEUED: [QueueTag; 5] = [
        QueueTag::New,
        QueueTag::Cold,
        QueueTag::Hot,
        QueueTag::List,
        QueueTag::Reclaim,
    ];

    /// Storage slot of a queued tag; `None` for [`QueueTag::None`].
    #[inline]
    pub(crate) const fn slot(self) -> Option<usize> {
        match self {
            QueueTag::None => None,
            QueueTag::New => Some(0),
            QueueTag::Cold => Some(1),
            QueueTag::Hot => Some(2),
            QueueTag::List => Some(3),
            QueueTag::Reclaim => Some(4),
        }
    }
}

bitflags! {
    /// Policy status bits carried alongside each tracked page.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PageFlags: u8 {
        /// Software copy of the reference bit.
        const REFERENCED  = 1 << 0;
        /// Part of the working set; never a victim while set.
        const HOT         = 1 << 1;
        /// Cold page inside its test period.
        const TEST        = 1 << 2;
        /// The admitting reference has not been cleared yet.
        const INITIAL_REF = 1 << 3;
        /// Admitted without a confirmed use (read-ahead).
        const SPECULATIVE = 1 << 4;
    }
}

/// Result of sampling a page's hardware reference bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSample {
    Referenced,
    Unreferenced,
    /// The owner lock could not be taken without blocking.
    OwnerBusy,
}

impl RefSample {
    /// Collapses the sample to a bit; a busy owner counts as unreferenced.
    #[inline]
    pub fn is_referenced(self) -> bool {
        matches!(self, RefSample::Referenced)
    }
}

/// Whether the caller of [`PageHost::sample_reference`] already holds the
/// page owner's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerLock {
    /// Try-acquire without blocking; report [`RefSample::OwnerBusy`] on failure.
    Try,
    /// Already held by the caller.
    Held,
}

/// Collaborator that owns the pages the policy classifies.
///
/// Every method is called synchronously from inside a policy call, with the
/// policy already borrowed mutably. Implementations must not call back into
/// the policy.
pub trait PageHost {
    /// Identity of the page's contents, or `None` while the page is in flux
    /// (being freed or changing owner).
    fn identity(&self, page: PageId) -> Option<PageIdentity>;

    /// Test-and-clear of the hardware reference bit.
    ///
    /// With [`OwnerLock::Try`] the host must not block: if the owner lock is
    /// contended, return [`RefSample::OwnerBusy`] and leave the bit alone.
    fn sample_reference(&mut self, page: PageId, lock: OwnerLock) -> RefSample;

    /// Test-only read of the hardware reference bit.
    fn test_reference(&self, page: PageId) -> bool;

    /// Releases the swap slot backing `page`, if any. Returns `true` when a
    /// slot was released.
    fn try_drop_swap(&mut self, _page: PageId) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_id_round_trips_index() {
        let id = PageId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(PageId::from(42usize), id);
        assert_eq!(id.to_string(), "page#42");
    }

    #[test]
    fn queue_tag_slots_are_distinct() {
        let mut seen = [false; QueueTag::QUEUED.len()];
        for tag in QueueTag::QUEUED {
            let slot = tag.slot().unwrap();
            assert!(!seen[slot]);
            seen[slot] = true;
        }
        assert_eq!(QueueTag::None.slot(), None);
        assert_eq!(QueueTag::default(), QueueTag::None);
    }

    #[test]
    fn owner_busy_collapses_to_unreferenced() {
        assert!(RefSample::Referenced.is_referenced());
        assert!(!RefSample::Unreferenced.is_referenced());
        assert!(!RefSample::OwnerBusy.is_referenced());
    }

    #[test]
    fn flags_compose() {
        let mut flags = PageFlags::TEST | PageFlags::REFERENCED;
        flags.remove(PageFlags::REFERENCED);
        assert_eq!(flags, PageFlags::TEST);
        assert!(!flags.intersects(PageFlags::HOT | PageFlags::SPECULATIVE));
    }
}
