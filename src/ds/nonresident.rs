//! Bounded record of recently evicted page identities.
//!
//! A hash table of fixed 14-slot rings. Each slot holds a 32-bit cookie
//! derived from a page identity; a second, independently seeded hash picks
//! the ring. Memory is proportional to the number of resident pages and never
//! to the length of the eviction history.
//!
//! ## Architecture
//!
//! ```text
//!   global cycle ──► 41           (advanced by the hot hand)
//!
//!   buckets: Vec<Bucket>
//!   ┌──────┬───────┬─────┬────────────────────────────────────────────┐
//!   │  #   │ cycle │ cur │ slots[14]                                  │
//!   ├──────┼───────┼─────┼────────────────────────────────────────────┤
//!   │  0   │  39   │  3  │ a91f 0 0 [0] 77c2 ...                      │
//!   │  1   │  41   │  0  │ [5e01] 0 c4d0 ...                          │
//!   └──────┴───────┴─────┴────────────────────────────────────────────┘
//! ```
//!
//! ## Aging
//!
//! A bucket lags the global cycle until something touches it. On touch it
//! catches up: for every cycle it missed, the slot under `cur` is cleared and
//! `cur` advances. A live cookie cleared this way belonged to a page that was
//! evicted and never came back within its window; the same holds for a live
//! cookie overwritten by [`NonResidentSet::record`]. Both are queued in
//! [`ExpiryCounts`] for the tuner to drain.
//!
//! A lag of at least two full turns is cut down to `lag % 14 + 14`: one turn
//! clears everything, the remainder keeps the cursor in phase.
//!
//! ## Collisions
//!
//! Unrelated identities may share a cookie within one bucket. Such a match
//! reads as a hit; the policy accepts the misclassification.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::page::PageIdentity;

/// Slots per bucket.
pub const BUCKET_SIZE: usize = 14;

const EMPTY: u32 = 0;
const COOKIE_SEED: u64 = 0x243f_6a88_85a3_08d3;
const BUCKET_SEED: u64 = 0x1319_8a2e_0370_7344;

/// Non-resident entries that expired before their page returned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryCounts {
    /// Live slots cleared while catching a bucket up to the global cycle.
    pub aged_out: u64,
    /// Live slots overwritten by a newer record.
    pub overwritten: u64,
}

impl ExpiryCounts {
    #[inline]
    pub fn total(&self) -> u64 {
        self.aged_out + self.overwritten
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    cycle: u32,
    cur: usize,
    slots: [u32; BUCKET_SIZE],
}

impl Bucket {
    fn new(cycle: u32) -> Self {
        Self {
            cycle,
            cur: 0,
            slots: [EMPTY; BUCKET_SIZE],
        }
    }

    /// Catches the bucket up to `target`, returning how many live slots were
    /// cleared on the way.
    fn rotate(&mut self, target: u32) -> u64 {
        let mut todo = target.wrapping_sub(self.cycle) as usize;
        if todo >= 2 * BUCKET_SIZE {
            todo = todo % BUCKET_SIZE + BUCKET_SIZE;
        }
        let mut cleared = 0;
        for _ in 0..todo {
            let slot = &mut self.slots[self.cur];
            if *slot != EMPTY {
                *slot = EMPTY;
                cleared += 1;
            }
            self.cur = (self.cur + 1) % BUCKET_SIZE;
        }
        self.cycle = target;
        cleared
    }

    fn live(&self) -> usize {
        self.slots.iter().filter(|&&s| s != EMPTY).count()
    }
}

/// Approximate set of recently evicted page identities.
#[derive(Debug, Clone)]
pub struct NonResidentSet {
    buckets: Vec<Bucket>,
    cycle: u32,
    cycle_frac: usize,
    hash_factor: usize,
    pending: ExpiryCounts,
}

impl NonResidentSet {
    /// Creates a set with a single bucket; call [`rehash`](Self::rehash) once
    /// the amount of memory is known.
    pub fn new(hash_factor: usize) -> Self {
        Self {
            buckets: vec![Bucket::new(0)],
            cycle: 0,
            cycle_frac: 0,
            hash_factor: hash_factor.max(1),
            pending: ExpiryCounts::default(),
        }
    }

    /// Resizes for `total_pages` resident pages, discarding all history.
    ///
    /// The bucket count is `ceil(total_pages / 14) * hash_factor`, at least 1.
    pub fn rehash(&mut self, total_pages: usize) {
        let count = total_pages.div_ceil(BUCKET_SIZE).max(1) * self.hash_factor;
        self.buckets = vec![Bucket::new(self.cycle); count];
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Maximum number of identities the set can hold at once.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len() * BUCKET_SIZE
    }

    #[inline]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Live cookies across all buckets, without aging anything.
    pub fn live_count(&self) -> usize {
        self.buckets.iter().map(Bucket::live).sum()
    }

    /// Remembers an evicted page.
    pub fn record(&mut self, identity: PageIdentity) {
        let cookie = cookie(identity);
        let (cycle, idx) = (self.cycle, self.bucket_index(identity));
        let bucket = &mut self.buckets[idx];
        self.pending.aged_out += bucket.rotate(cycle);

        let slot = &mut bucket.slots[bucket.cur];
        if *slot != EMPTY {
            self.pending.overwritten += 1;
        }
        *slot = cookie;
        bucket.cur = (bucket.cur + 1) % BUCKET_SIZE;
    }

    /// Removes `identity` if present. Returns `true` on a hit.
    pub fn lookup_remove(&mut self, identity: PageIdentity) -> bool {
        let cookie = cookie(identity);
        let bucket = self.aged_bucket(identity);
        match bucket.slots.iter_mut().find(|slot| **slot == cookie) {
            Some(slot) => {
                *slot = EMPTY;
                true
            },
            None => false,
        }
    }

    /// Reports whether `identity` is present without consuming it.
    ///
    /// The bucket is still caught up to the current cycle.
    pub fn probe(&mut self, identity: PageIdentity) -> bool {
        let cookie = cookie(identity);
        self.aged_bucket(identity).slots.contains(&cookie)
    }

    /// Advances the global cycle by `14 / hot_len`, carrying the remainder.
    ///
    /// Called once per hot-hand step so that one full sweep of the hot region
    /// turns every bucket over once.
    pub fn advance_cycle(&mut self, hot_len: usize) {
        let hot_len = hot_len.max(1);
        self.cycle_frac += BUCKET_SIZE;
        while self.cycle_frac >= hot_len {
            self.cycle = self.cycle.wrapping_add(1);
            self.cycle_frac -= hot_len;
        }
    }

    /// Returns and resets the expiries accumulated since the last drain.
    pub fn drain_expiries(&mut self) -> ExpiryCounts {
        std::mem::take(&mut self.pending)
    }

    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.buckets.capacity() * std::mem::size_of::<Bucket>()
    }

    fn aged_bucket(&mut self, identity: PageIdentity) -> &mut Bucket {
        let (cycle, idx) = (self.cycle, self.bucket_index(identity));
        let bucket = &mut self.buckets[idx];
        self.pending.aged_out += bucket.rotate(cycle);
        bucket
    }

    fn bucket_index(&self, identity: PageIdentity) -> usize {
        (seeded_hash(identity, BUCKET_SEED) % self.buckets.len() as u64) as usize
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(!self.buckets.is_empty());
        for bucket in &self.buckets {
            assert!(bucket.cur < BUCKET_SIZE);
            assert!(self.cycle.wrapping_sub(bucket.cycle) < u32::MAX / 2);
        }
    }

    #[cfg(not(any(test, debug_assertions)))]
    #[inline(always)]
    pub fn debug_validate_invariants(&self) {}
}

fn seeded_hash(identity: PageIdentity, seed: u64) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(seed);
    identity.hash(&mut hasher);
    hasher.finish()
}

/// 32-bit cookie for `identity`; never [`EMPTY`].
fn cookie(identity: PageIdentity) -> u32 {
    match (seeded_hash(identity, COOKIE_SEED) >> 32) as u32 {
        EMPTY => 1,
        c => c,
    }
}
