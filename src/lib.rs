//! clockpro: the CLOCK-Pro page replacement policy for virtual-memory page
//! daemons.
//!
//! The policy tracks externally owned page frames by [`page::PageId`],
//! classifies them as hot or cold from sampled reference bits, and hands the
//! reclaim driver one cold victim at a time. The frames themselves stay with
//! the caller, reached through the [`page::PageHost`] trait.
//!
//! ```
//! use clockpro::prelude::*;
//!
//! let mut host = SimHost::with_pages(16, ObjectId(1));
//! let mut policy = ClockPro::new();
//! policy.reinit(host.len());
//!
//! for i in 0..16 {
//!     policy.activate(&mut host, PageId::new(i));
//! }
//! if let Some(victim) = policy.select_victim(&mut host) {
//!     policy.remove(victim);
//! }
//! assert_eq!(policy.tracked_pages(), 15);
//! ```
//!
//! Feature flags: `metrics` adds event counters, snapshots and a Prometheus
//! text exporter; `concurrency` adds [`SharedClockPro`](sync::SharedClockPro).

pub mod config;
pub mod ds;
pub mod error;
pub mod page;
pub mod policy;
pub mod sim;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "concurrency")]
pub mod sync;

pub mod prelude;
