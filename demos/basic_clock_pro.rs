//! Example driving CLOCK-Pro the way a page daemon would.
//!
//! Run with: cargo run --example basic_clock_pro

use clockpro::config::ClockProConfig;
use clockpro::page::{ObjectId, PageFlags, PageId, PageIdentity};
use clockpro::policy::clock_pro::ClockPro;
use clockpro::sim::SimHost;

const FRAMES: usize = 8;
const FILE: ObjectId = ObjectId(7);

/// Reclaims one frame and loads `offset` of the file into it.
fn fault(policy: &mut ClockPro, host: &mut SimHost, offset: u64) -> PageId {
    let victim = policy
        .select_victim(host)
        .expect("full memory always has a cold page");
    let evicted = host.page(victim).and_then(|p| p.identity);
    policy.remove(victim);
    println!(
        "   reclaimed frame {victim} (held offset {:?}) for offset {offset}",
        evicted.map(|id| id.offset)
    );
    host.set_identity(victim, Some(PageIdentity::new(FILE, offset)));
    policy.activate(host, victim);
    victim
}

fn main() {
    println!("=== CLOCK-Pro Example ===\n");

    let config = ClockProConfig::builder()
        .cold_target_pct(50)
        .new_queue_min(1)
        .build();
    let mut policy = ClockPro::with_config(config);
    policy.reinit(FRAMES);
    let mut host = SimHost::with_pages(FRAMES, FILE);

    // Example 1: fill memory
    println!("1. Fault in {FRAMES} pages");
    for i in 0..FRAMES {
        policy.activate(&mut host, PageId::new(i));
    }
    let (active, cold) = policy.estimate_counts();
    println!("   active = {active}, cold = {cold}\n");

    // Example 2: frames 0 and 1 are used again before the cold hand arrives
    println!("2. Touch frames 0 and 1, then reclaim");
    host.touch(PageId::new(0));
    host.touch(PageId::new(1));
    for offset in 100..103 {
        fault(&mut policy, &mut host, offset);
    }
    for i in 0..2 {
        let hot = policy.page_flags(PageId::new(i)).contains(PageFlags::HOT);
        println!("   frame {i} hot? {hot}");
    }
    println!();

    // Example 3: a recently evicted page comes back hot
    println!("3. Re-fault offset 2");
    let remembered = policy.remembers(PageIdentity::new(FILE, 2));
    println!("   offset 2 remembered? {remembered}");
    let frame = fault(&mut policy, &mut host, 2);
    println!(
        "   admitted hot? {}",
        policy.page_flags(frame).contains(PageFlags::HOT)
    );
    println!();

    // Example 4: read-ahead that is never used goes first
    println!("4. Read-ahead");
    let victim = policy.select_victim(&mut host).expect("cold page");
    policy.remove(victim);
    host.set_identity(victim, Some(PageIdentity::new(FILE, 500)));
    policy.enqueue_speculative(&mut host, victim);
    println!("   frame {victim} holds read-ahead offset 500");
    let next = fault(&mut policy, &mut host, 501);
    println!("   read-ahead frame reclaimed first? {}", next == victim);
    println!();

    policy
        .check_invariants()
        .expect("policy state is consistent");
    println!(
        "tracked = {}, hot = {}, cold target = {}",
        policy.tracked_pages(),
        policy.hot_count(),
        policy.cold_target()
    );
}
