//! Highlight fades for recently updated tiles.
//!
//! A fade starts at the update's colour hint and walks back to neutral in a
//! fixed number of discrete steps. Steps are scheduled on their own millisecond
//! timeline, independent of how often the host renders. Each tile has at most
//! one authoritative fade; starting another one on the same tile supersedes the
//! old one, whose already-scheduled steps are then skipped when they come due.
#![forbid(unsafe_code)]

use std::collections::{BTreeMap, VecDeque};
use std::hash::Hash;

use hashbrown::HashMap;
use sweep_chunk::Tint;

pub const DEFAULT_FADE_STEPS: u32 = 16;
pub const DEFAULT_FADE_INTERVAL_MS: u64 = 16;

/// Receives tint changes produced by running fades.
pub trait TintSink<K> {
    fn set_tint(&mut self, slot: K, tile: usize, tint: Tint);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FadeConfig {
    pub steps: u32,
    pub interval_ms: u64,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_FADE_STEPS,
            interval_ms: DEFAULT_FADE_INTERVAL_MS,
        }
    }
}

impl FadeConfig {
    #[inline]
    pub fn duration_ms(&self) -> u64 {
        self.interval_ms * u64::from(self.steps)
    }
}

#[derive(Clone, Copy, Debug)]
struct Fade {
    id: u64,
    complement: Tint,
    step: u32,
}

#[derive(Clone, Copy, Debug)]
struct ScheduledStep<K> {
    slot: K,
    tile: usize,
    id: u64,
}

pub struct FadeController<K> {
    cfg: FadeConfig,
    active: HashMap<(K, usize), Fade>,
    // due time (ms) -> FIFO of steps
    by_time: BTreeMap<u64, VecDeque<ScheduledStep<K>>>,
    next_id: u64,
}

impl<K: Copy + Eq + Hash + std::fmt::Debug> FadeController<K> {
    pub fn new(cfg: FadeConfig) -> Self {
        Self {
            cfg,
            active: HashMap::new(),
            by_time: BTreeMap::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn config(&self) -> FadeConfig {
        self.cfg
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn schedule(&mut self, at: u64, step: ScheduledStep<K>) {
        self.by_time.entry(at).or_default().push_back(step);
    }

    /// Starts (or restarts) a fade on each listed tile of `slot`.
    pub fn start<S: TintSink<K>>(
        &mut self,
        slot: K,
        tiles: impl IntoIterator<Item = usize>,
        color: Tint,
        now_ms: u64,
        sink: &mut S,
    ) {
        let complement = color.complement();
        for tile in tiles {
            if self.cfg.steps == 0 {
                self.active.remove(&(slot, tile));
                sink.set_tint(slot, tile, Tint::NEUTRAL);
                continue;
            }
            let id = self.alloc_id();
            if self
                .active
                .insert(
                    (slot, tile),
                    Fade {
                        id,
                        complement,
                        step: 0,
                    },
                )
                .is_some()
            {
                log::trace!(target: "fade", "superseded fade on {:?} tile {}", slot, tile);
            }
            sink.set_tint(slot, tile, Tint::faded(complement, self.cfg.steps, self.cfg.steps));
            self.schedule(now_ms + self.cfg.interval_ms, ScheduledStep { slot, tile, id });
        }
    }

    /// Runs every step due at or before `now_ms`, oldest first.
    pub fn advance<S: TintSink<K>>(&mut self, now_ms: u64, sink: &mut S) -> usize {
        let mut applied = 0;
        while let Some(mut entry) = self.by_time.first_entry() {
            let due = *entry.key();
            if due > now_ms {
                break;
            }
            let Some(step) = entry.get_mut().pop_front() else {
                entry.remove();
                continue;
            };
            if entry.get().is_empty() {
                entry.remove();
            }
            let key = (step.slot, step.tile);
            let Some(fade) = self.active.get_mut(&key) else {
                continue;
            };
            if fade.id != step.id {
                continue;
            }
            fade.step += 1;
            let remaining = self.cfg.steps.saturating_sub(fade.step);
            sink.set_tint(step.slot, step.tile, Tint::faded(fade.complement, remaining, self.cfg.steps));
            applied += 1;
            if remaining == 0 {
                self.active.remove(&key);
            } else {
                self.schedule(due + self.cfg.interval_ms, step);
            }
        }
        applied
    }

    /// Forgets every fade on `slot`. Pending steps become no-ops.
    pub fn cancel_slot(&mut self, slot: K) -> usize {
        let before = self.active.len();
        self.active.retain(|(s, _), _| *s != slot);
        let dropped = before - self.active.len();
        if dropped > 0 {
            log::debug!(target: "fade", "cancelled {} fades on {:?}", dropped, slot);
        }
        dropped
    }

    /// Stops any fade on the listed tiles of `slot` and writes them neutral.
    pub fn cancel_tiles<S: TintSink<K>>(
        &mut self,
        slot: K,
        tiles: impl IntoIterator<Item = usize>,
        sink: &mut S,
    ) -> usize {
        let mut dropped = 0;
        for tile in tiles {
            if self.active.remove(&(slot, tile)).is_some() {
                sink.set_tint(slot, tile, Tint::NEUTRAL);
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::trace!(target: "fade", "cancelled {} tile fades on {:?}", dropped, slot);
        }
        dropped
    }

    #[inline]
    pub fn is_fading(&self, slot: K, tile: usize) -> bool {
        self.active.contains_key(&(slot, tile))
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Earliest scheduled step, including stale ones not yet discarded.
    pub fn next_due(&self) -> Option<u64> {
        self.by_time.keys().next().copied()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}
