#![no_main]

use clockpro::ds::NonResidentSet;
use clockpro::page::{ObjectId, PageIdentity};
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on NonResidentSet
//
// Tests random record, lookup, probe, cycle and rehash sequences against the
// bucket invariants and the capacity bound.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let hash_factor = usize::from(data[0] % 4) + 1;
    let mut set = NonResidentSet::new(hash_factor);
    set.rehash(usize::from(data[1]) * 4);

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 7;
        let identity = PageIdentity::new(ObjectId(u64::from(data[idx + 1] >> 4)), u64::from(data[idx + 1] & 0x0f));

        match op {
            0 | 1 => set.record(identity),
            2 => {
                if set.lookup_remove(identity) {
                    // A consumed record does not come back unless recorded again.
                    let _ = set.probe(identity);
                }
            }
            3 => {
                let _ = set.probe(identity);
            }
            4 => set.advance_cycle(usize::from(data[idx + 1])),
            5 => {
                let _ = set.drain_expiries();
            }
            6 => set.rehash(usize::from(data[idx + 1]) * 8),
            _ => unreachable!(),
        }

        set.debug_validate_invariants();
        assert!(set.live_count() <= set.capacity());

        idx += 2;
    }
});
