#![no_main]

use clockpro::config::ClockProConfig;
use clockpro::page::{ObjectId, PageFlags, PageId, PageIdentity};
use clockpro::policy::clock_pro::ClockPro;
use clockpro::sim::SimHost;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary call sequences on ClockPro
//
// Pages are frames of a 64-frame SimHost. Reclaimed frames get fresh
// identities so the non-resident set sees churn.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    const FRAMES: usize = 64;
    let pct = u32::from(data[0]) % 91;
    let config = ClockProConfig::builder()
        .cold_target_pct(pct)
        .new_queue_min(usize::from(data[1] % 8) + 1)
        .adaptive(data[1] & 0x80 == 0)
        .build();
    let mut policy = ClockPro::with_config(config);
    policy.reinit(FRAMES);
    let mut host = SimHost::with_pages(FRAMES, ObjectId(1));
    let mut generation = FRAMES as u64;

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 9;
        let page = PageId::new(usize::from(data[idx + 1]) % FRAMES);

        match op {
            0 | 1 => policy.activate(&mut host, page),
            2 => host.touch(page),
            3 => policy.deactivate(page),
            4 => policy.enqueue_speculative(&mut host, page),
            5 => {
                if let Some(victim) = policy.select_victim(&mut host) {
                    assert!(policy.is_tracked(victim));
                    assert!(!policy.page_flags(victim).contains(PageFlags::HOT));
                    policy.remove(victim);
                    generation += 1;
                    host.set_identity(victim, Some(PageIdentity::new(ObjectId(1), generation)));
                }
            }
            6 => {
                policy.remove(page);
                assert!(!policy.is_tracked(page));
            }
            7 => host.set_busy(page, data[idx + 1] & 0x80 != 0),
            8 => {
                let _ = policy.set_cold_target_pct(u32::from(data[idx + 1]) % 101);
            }
            _ => unreachable!(),
        }

        assert!(policy.check_invariants().is_ok());
        let (active, cold) = policy.estimate_counts();
        assert_eq!(active + cold, policy.tracked_pages());
        assert!(policy.tracked_pages() <= FRAMES);

        idx += 2;
    }
});
