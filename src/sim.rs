//! In-memory [`PageHost`] for tests, benchmarks and demos.
//!
//! Keeps one [`SimPage`] per frame: a hardware reference bit, an optional
//! identity, an injectable "owner busy" switch and a swap-backed flag.
//!
//! ```
//! use clockpro::page::{ObjectId, OwnerLock, PageHost, PageId, RefSample};
//! use clockpro::sim::SimHost;
//!
//! let mut host = SimHost::with_pages(4, ObjectId(3));
//! let page = PageId::new(2);
//! host.touch(page);
//! assert_eq!(host.sample_reference(page, OwnerLock::Try), RefSample::Referenced);
//! assert_eq!(host.sample_reference(page, OwnerLock::Try), RefSample::Unreferenced);
//!
//! host.set_busy(page, true);
//! assert_eq!(host.sample_reference(page, OwnerLock::Try), RefSample::OwnerBusy);
//! ```

use crate::page::{ObjectId, OwnerLock, PageHost, PageId, PageIdentity, RefSample};

/// Simulated frame state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimPage {
    pub identity: Option<PageIdentity>,
    pub referenced: bool,
    pub busy: bool,
    pub swap_backed: bool,
}

#[derive(Debug, Default, Clone)]
pub struct SimHost {
    pages: Vec<SimPage>,
    samples: u64,
    busy_samples: u64,
    swap_releases: u64,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `n` frames; frame `i` holds page `i` of `object`.
    pub fn with_pages(n: usize, object: ObjectId) -> Self {
        let pages = (0..n)
            .map(|i| SimPage {
                identity: Some(PageIdentity::new(object, i as u64)),
                ..SimPage::default()
            })
            .collect();
        Self {
            pages,
            ..Self::default()
        }
    }

    fn frame(&mut self, page: PageId) -> &mut SimPage {
        let idx = page.index();
        if idx >= self.pages.len() {
            self.pages.resize_with(idx + 1, SimPage::default);
        }
        &mut self.pages[idx]
    }

    pub fn page(&self, page: PageId) -> Option<&SimPage> {
        self.pages.get(page.index())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Sets the hardware reference bit, as an access through a mapping would.
    pub fn touch(&mut self, page: PageId) {
        self.frame(page).referenced = true;
    }

    pub fn is_referenced(&self, page: PageId) -> bool {
        self.page(page).is_some_and(|p| p.referenced)
    }

    /// Rebinds the frame to new contents (or to none while in flux).
    pub fn set_identity(&mut self, page: PageId, identity: Option<PageIdentity>) {
        self.frame(page).identity = identity;
    }

    /// Makes the frame's owner lock appear contended to `OwnerLock::Try`.
    pub fn set_busy(&mut self, page: PageId, busy: bool) {
        self.frame(page).busy = busy;
    }

    pub fn set_swap_backed(&mut self, page: PageId, backed: bool) {
        self.frame(page).swap_backed = backed;
    }

    pub fn is_swap_backed(&self, page: PageId) -> bool {
        self.page(page).is_some_and(|p| p.swap_backed)
    }

    /// Reference samples taken so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Samples that found the owner busy or the page in flux.
    pub fn busy_samples(&self) -> u64 {
        self.busy_samples
    }

    pub fn swap_releases(&self) -> u64 {
        self.swap_releases
    }
}

impl PageHost for SimHost {
    fn identity(&self, page: PageId) -> Option<PageIdentity> {
        self.page(page).and_then(|p| p.identity)
    }

    fn sample_reference(&mut self, page: PageId, lock: OwnerLock) -> RefSample {
        self.samples += 1;
        let frame = self.frame(page);
        let contended = lock == OwnerLock::Try && (frame.busy || frame.identity.is_none());
        if contended {
            self.busy_samples += 1;
            return RefSample::OwnerBusy;
        }
        if std::mem::take(&mut frame.referenced) {
            RefSample::Referenced
        } else {
            RefSample::Unreferenced
        }
    }

    fn test_reference(&self, page: PageId) -> bool {
        self.is_referenced(page)
    }

    fn try_drop_swap(&mut self, page: PageId) -> bool {
        let frame = self.frame(page);
        if !frame.swap_backed {
            return false;
        }
        frame.swap_backed = false;
        self.swap_releases += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_clears_reference_bit() {
        let mut host = SimHost::with_pages(2, ObjectId(1));
        let page = PageId::new(1);
        host.touch(page);
        assert!(host.test_reference(page));
        assert_eq!(host.sample_reference(page, OwnerLock::Try), RefSample::Referenced);
        assert!(!host.test_reference(page));
        assert_eq!(host.samples(), 1);
    }

    #[test]
    fn busy_owner_leaves_bit_set() {
        let mut host = SimHost::with_pages(1, ObjectId(1));
        let page = PageId::new(0);
        host.touch(page);
        host.set_busy(page, true);
        assert_eq!(host.sample_reference(page, OwnerLock::Try), RefSample::OwnerBusy);
        assert!(host.is_referenced(page));
        // A held owner lock bypasses contention.
        assert_eq!(host.sample_reference(page, OwnerLock::Held), RefSample::Referenced);
        assert_eq!(host.busy_samples(), 1);
    }

    #[test]
    fn page_in_flux_reads_as_busy() {
        let mut host = SimHost::new();
        let page = PageId::new(5);
        host.touch(page);
        assert_eq!(host.identity(page), None);
        assert_eq!(host.sample_reference(page, OwnerLock::Try), RefSample::OwnerBusy);
        assert_eq!(host.len(), 6);
    }

    #[test]
    fn swap_slot_released_once() {
        let mut host = SimHost::with_pages(1, ObjectId(1));
        let page = PageId::new(0);
        assert!(!host.try_drop_swap(page));
        host.set_swap_backed(page, true);
        assert!(host.try_drop_swap(page));
        assert!(!host.try_drop_swap(page));
        assert_eq!(host.swap_releases(), 1);
    }

    #[test]
    fn with_pages_assigns_identities() {
        let host = SimHost::with_pages(3, ObjectId(8));
        assert_eq!(
            host.identity(PageId::new(2)),
            Some(PageIdentity::new(ObjectId(8), 2))
        );
    }
}
