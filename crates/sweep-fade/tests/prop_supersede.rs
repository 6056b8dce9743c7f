use std::collections::HashMap;

use proptest::prelude::*;
use sweep_chunk::Tint;
use sweep_fade::{FadeConfig, FadeController, TintSink};

#[derive(Default)]
struct Tints(HashMap<(u8, usize), Vec<Tint>>);

impl TintSink<u8> for Tints {
    fn set_tint(&mut self, slot: u8, tile: usize, tint: Tint) {
        self.0.entry((slot, tile)).or_default().push(tint);
    }
}

fn color() -> impl Strategy<Value = Tint> {
    (0u32..=0xFF_FF_FF).prop_map(Tint)
}

proptest! {
    // After a restart, every later write on the tile belongs to the newest fade.
    #[test]
    fn newest_fade_owns_the_tile(first in color(), second in color(), restart_at in 0u64..256) {
        let cfg = FadeConfig::default();
        let mut fades = FadeController::new(cfg);
        let mut sink = Tints::default();
        fades.start(0u8, [5usize], first, 0, &mut sink);
        fades.advance(restart_at, &mut sink);
        let before = sink.0[&(0, 5)].len();

        fades.start(0u8, [5usize], second, restart_at, &mut sink);
        prop_assert_eq!(fades.active_count(), 1);
        prop_assert_eq!(*sink.0[&(0, 5)].last().unwrap(), second);

        fades.advance(restart_at + cfg.duration_ms() * 2, &mut sink);
        let comp = second.complement();
        let expected: Vec<Tint> = std::iter::once(second)
            .chain((0..cfg.steps).rev().map(|r| Tint::faded(comp, r, cfg.steps)))
            .collect();
        prop_assert_eq!(&sink.0[&(0, 5)][before..], &expected[..]);
        prop_assert!(fades.is_idle());
    }

    // Independent tiles never disturb each other and all end neutral.
    #[test]
    fn all_fades_end_neutral(starts in prop::collection::vec((0u8..4, 0usize..8, 0u64..500, color()), 1..40)) {
        let mut starts = starts;
        starts.sort_by_key(|s| s.2);
        let mut fades = FadeController::new(FadeConfig::default());
        let mut sink = Tints::default();
        for (slot, tile, at, c) in starts {
            fades.advance(at, &mut sink);
            fades.start(slot, [tile], c, at, &mut sink);
        }
        fades.advance(10_000, &mut sink);
        prop_assert!(fades.is_idle());
        for writes in sink.0.values() {
            prop_assert_eq!(*writes.last().unwrap(), Tint::NEUTRAL);
        }
    }
}
