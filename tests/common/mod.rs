// ==============================================
// SIMULATED MACHINE (shared test harness)
// ==============================================
//
// A fixed number of frames backed by `SimHost`. Logical pages of one object
// are faulted into free frames; once memory is full the policy picks the
// frame to reuse.

#![allow(dead_code)]

use std::collections::HashMap;

use clockpro::config::ClockProConfig;
use clockpro::page::{ObjectId, PageId, PageIdentity};
use clockpro::policy::clock_pro::ClockPro;
use clockpro::sim::SimHost;

pub const OBJECT: ObjectId = ObjectId(42);

pub fn identity(logical: u64) -> PageIdentity {
    PageIdentity::new(OBJECT, logical)
}

pub struct Machine {
    pub policy: ClockPro,
    pub host: SimHost,
    frames: usize,
    resident: HashMap<u64, PageId>,
    contents: Vec<Option<u64>>,
    free: Vec<PageId>,
    /// Logical pages evicted so far, in eviction order.
    pub victims: Vec<u64>,
}

impl Machine {
    pub fn new(frames: usize, config: ClockProConfig) -> Self {
        let mut policy = ClockPro::with_config(config);
        policy.reinit(frames);
        Self {
            policy,
            host: SimHost::new(),
            frames,
            resident: HashMap::new(),
            contents: vec![None; frames],
            free: (0..frames).rev().map(PageId::new).collect(),
            victims: Vec::new(),
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn frame_of(&self, logical: u64) -> Option<PageId> {
        self.resident.get(&logical).copied()
    }

    pub fn is_resident(&self, logical: u64) -> bool {
        self.resident.contains_key(&logical)
    }

    /// Touches `logical` through its mapping, faulting it in on a miss.
    /// Returns `true` on a hit.
    pub fn access(&mut self, logical: u64) -> bool {
        if let Some(frame) = self.frame_of(logical) {
            self.host.touch(frame);
            return true;
        }
        let frame = self.fault_in(logical);
        self.policy.activate(&mut self.host, frame);
        false
    }

    /// Reads `logical` ahead of use. Resident pages are left alone.
    pub fn prefetch(&mut self, logical: u64) -> PageId {
        if let Some(frame) = self.frame_of(logical) {
            return frame;
        }
        let frame = self.fault_in(logical);
        self.policy.enqueue_speculative(&mut self.host, frame);
        frame
    }

    /// Reclaims one frame chosen by the policy. Returns the evicted logical
    /// page, or `None` if the policy offered nothing.
    pub fn evict_one(&mut self) -> Option<u64> {
        let victim = self.policy.select_victim(&mut self.host)?;
        self.policy.remove(victim);
        let logical = self.contents[victim.index()]
            .take()
            .expect("victim frame holds a page");
        self.resident.remove(&logical);
        self.host.set_identity(victim, None);
        self.free.push(victim);
        self.victims.push(logical);
        Some(logical)
    }

    fn fault_in(&mut self, logical: u64) -> PageId {
        if self.free.is_empty() {
            self.evict_one().expect("full memory yields a victim");
        }
        let frame = self.free.pop().expect("a frame was just freed");
        self.host.set_identity(frame, Some(identity(logical)));
        self.contents[frame.index()] = Some(logical);
        self.resident.insert(logical, frame);
        frame
    }
}
