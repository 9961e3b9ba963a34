// ==============================================
// SHARED CLOCK-PRO CONCURRENCY TESTS (integration)
// ==============================================
#![cfg(feature = "concurrency")]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use clockpro::page::{ObjectId, PageId};
use clockpro::policy::clock_pro::ClockPro;
use clockpro::sim::SimHost;
use clockpro::sync::SharedClockPro;

const THREADS: usize = 4;
const PAGES_PER_THREAD: usize = 64;
const TOTAL: usize = THREADS * PAGES_PER_THREAD;

fn shared() -> SharedClockPro {
    let mut policy = ClockPro::new();
    policy.reinit(TOTAL);
    SharedClockPro::new(policy)
}

#[test]
fn faulting_threads_and_a_reclaimer_share_one_policy() {
    let policy = shared();
    let stop = Arc::new(AtomicBool::new(false));
    let reclaimed = Arc::new(AtomicUsize::new(0));

    let faulters: Vec<_> = (0..THREADS)
        .map(|t| {
            let policy = policy.clone();
            thread::spawn(move || {
                // Each thread owns a disjoint frame range.
                let mut host = SimHost::with_pages(TOTAL, ObjectId(t as u64 + 1));
                let base = t * PAGES_PER_THREAD;
                for round in 0..50 {
                    for i in 0..PAGES_PER_THREAD {
                        let page = PageId::new(base + i);
                        if round % 2 == 0 {
                            policy.lock().activate(&mut host, page);
                        } else {
                            host.touch(page);
                        }
                    }
                }
            })
        })
        .collect();

    let reclaimer = {
        let policy = policy.clone();
        let stop = stop.clone();
        let reclaimed = reclaimed.clone();
        thread::spawn(move || {
            let mut host = SimHost::with_pages(TOTAL, ObjectId(99));
            while !stop.load(Ordering::Acquire) {
                if !policy.needs_scan() && policy.estimate_counts().1 == 0 {
                    thread::yield_now();
                    continue;
                }
                let mut guard = policy.lock();
                if let Some(victim) = guard.select_victim(&mut host) {
                    guard.remove(victim);
                    reclaimed.fetch_add(1, Ordering::Relaxed);
                }
            }
        })
    };

    for handle in faulters {
        handle.join().unwrap();
    }
    stop.store(true, Ordering::Release);
    reclaimer.join().unwrap();

    let guard = policy.lock();
    guard.check_invariants().unwrap();
    assert!(guard.tracked_pages() <= TOTAL);
    let (active, cold) = guard.estimate_counts();
    assert_eq!(active + cold, guard.tracked_pages());
    drop(guard);

    let (active, cold) = policy.estimate_counts();
    let guard = policy.lock();
    assert_eq!(active + cold, guard.tracked_pages());
    assert_eq!(cold, guard.cold_count());
}

#[test]
fn gauges_are_readable_while_locked_elsewhere() {
    let policy = shared();
    let mut host = SimHost::with_pages(TOTAL, ObjectId(1));
    {
        let mut guard = policy.lock();
        for i in 0..TOTAL {
            guard.activate(&mut host, PageId::new(i));
        }
    }

    let guard = policy.lock();
    let reader = {
        let policy = policy.clone();
        thread::spawn(move || (policy.estimate_counts(), policy.try_lock().is_none()))
    };
    let ((active, cold), contended) = reader.join().unwrap();
    drop(guard);

    assert_eq!((active, cold), (0, TOTAL));
    assert!(contended);
}
