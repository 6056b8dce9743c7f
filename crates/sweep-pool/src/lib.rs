//! Pool of renderable chunk slots bound to streamed partitions.
//!
//! Slots are allocated up to a high-water mark and afterwards only rebound:
//! `Remove` pushes a slot onto the free list, the next `Add` pops it. A
//! partition key maps to at most one bound slot at any time.
#![forbid(unsafe_code)]

mod slot;

use hashbrown::HashMap;
use sweep_chunk::{GridError, TileGrid, TileRef, TileResolver, Tint};
use sweep_fade::TintSink;
use sweep_geom::PartitionKey;
use sweep_protocol::{Action, ActionKind};

pub use slot::{ChunkSlot, SlotId, SlotState};

pub const DEFAULT_SOFT_CAP: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("{kind:?} for partition ({key}) which has no bound slot")]
    NotBound { kind: ActionKind, key: PartitionKey },
    #[error("partition ({key}) is already bound to slot {slot:?}")]
    AlreadyBound { key: PartitionKey, slot: SlotId },
    #[error("partition ({key}): {source}")]
    Grid {
        key: PartitionKey,
        #[source]
        source: GridError,
    },
}

/// What a successfully applied action did to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Bound { slot: SlotId, reused: bool },
    Updated {
        slot: SlotId,
        changed: Vec<usize>,
        color: Option<Tint>,
    },
    Released { slot: SlotId },
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated: usize,
    pub bound: usize,
    pub free: usize,
    pub high_water: usize,
}

pub struct ChunkSlotPool {
    partition_size: usize,
    soft_cap: usize,
    slots: Vec<ChunkSlot>,
    free: Vec<SlotId>,
    bound: HashMap<PartitionKey, SlotId>,
    high_water: usize,
}

impl ChunkSlotPool {
    pub fn new(partition_size: usize, soft_cap: usize) -> Self {
        debug_assert!(partition_size > 0);
        Self {
            partition_size,
            soft_cap,
            slots: Vec::new(),
            free: Vec::new(),
            bound: HashMap::new(),
            high_water: 0,
        }
    }

    #[inline]
    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.slots.len(),
            bound: self.bound.len(),
            free: self.free.len(),
            high_water: self.high_water,
        }
    }

    #[inline]
    pub fn find(&self, key: &PartitionKey) -> Option<SlotId> {
        self.bound.get(key).copied()
    }

    #[inline]
    pub fn slot(&self, id: SlotId) -> Option<&ChunkSlot> {
        self.slots.get(id.0)
    }

    #[inline]
    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut ChunkSlot> {
        self.slots.get_mut(id.0)
    }

    /// Bound slots with their keys, in no particular order.
    pub fn bound(&self) -> impl Iterator<Item = (SlotId, &PartitionKey)> + '_ {
        self.bound.iter().map(|(k, id)| (*id, k))
    }

    /// Every slot ever allocated, bound or free.
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &ChunkSlot)> + '_ {
        self.slots.iter().enumerate().map(|(i, s)| (SlotId(i), s))
    }

    /// Applies one stream action. On error the pool is left untouched.
    pub fn apply_action<R: TileResolver + ?Sized>(
        &mut self,
        action: &Action,
        resolver: &R,
    ) -> Result<ApplyOutcome, PoolError> {
        match action {
            Action::Add { key, tiles } => {
                let tiles: Vec<TileRef> = tiles.iter().map(|t| resolver.resolve(t)).collect();
                self.add(key, &tiles)
            }
            Action::Update { key, color, deltas } => {
                let id = self.find(key).ok_or_else(|| PoolError::NotBound {
                    kind: ActionKind::Update,
                    key: key.clone(),
                })?;
                let slot = &mut self.slots[id.0];
                let mut resolved = Vec::with_capacity(deltas.len());
                for d in deltas {
                    let idx = slot
                        .tiles
                        .checked_idx(d.lx, d.ly)
                        .map_err(|source| PoolError::Grid {
                            key: key.clone(),
                            source,
                        })?;
                    resolved.push((idx, resolver.resolve(&d.tile)));
                }
                let mut changed = Vec::with_capacity(resolved.len());
                for (idx, tile) in resolved {
                    slot.tiles.set_index(idx, tile);
                    if !changed.contains(&idx) {
                        changed.push(idx);
                    }
                }
                slot.tiles_dirty = true;
                log::trace!(target: "stream", "updated {} tiles in ({}) on {:?}", changed.len(), key, id);
                Ok(ApplyOutcome::Updated {
                    slot: id,
                    changed,
                    color: *color,
                })
            }
            Action::Remove { key } => self.remove(key),
        }
    }

    pub fn add(&mut self, key: &PartitionKey, tiles: &[TileRef]) -> Result<ApplyOutcome, PoolError> {
        if let Some(slot) = self.find(key) {
            return Err(PoolError::AlreadyBound {
                key: key.clone(),
                slot,
            });
        }
        let expected = self.partition_size * self.partition_size;
        if tiles.len() != expected {
            return Err(PoolError::Grid {
                key: key.clone(),
                source: GridError::WrongLength {
                    size: self.partition_size,
                    expected,
                    got: tiles.len(),
                },
            });
        }
        let (id, reused) = match self.free.pop() {
            Some(id) => (id, true),
            None => {
                if self.slots.len() >= self.soft_cap {
                    log::warn!(
                        target: "stream",
                        "slot pool grew past soft cap {} ({} slots)",
                        self.soft_cap,
                        self.slots.len() + 1
                    );
                }
                self.slots.push(ChunkSlot::new(self.partition_size));
                (SlotId(self.slots.len() - 1), false)
            }
        };
        self.high_water = self.high_water.max(self.slots.len());
        let slot = &mut self.slots[id.0];
        let filled = slot.tiles.fill_from(tiles);
        debug_assert!(filled.is_ok());
        slot.bind(key.clone());
        self.bound.insert(key.clone(), id);
        log::debug!(target: "stream", "bound ({}) to {:?} reused={}", key, id, reused);
        Ok(ApplyOutcome::Bound { slot: id, reused })
    }

    pub fn remove(&mut self, key: &PartitionKey) -> Result<ApplyOutcome, PoolError> {
        let id = self.bound.remove(key).ok_or_else(|| PoolError::NotBound {
            kind: ActionKind::Remove,
            key: key.clone(),
        })?;
        self.slots[id.0].release();
        self.free.push(id);
        log::debug!(target: "stream", "released ({}) from {:?}", key, id);
        Ok(ApplyOutcome::Released { slot: id })
    }

    /// Tile grid of the slot currently bound to `key`.
    pub fn tiles_for(&self, key: &PartitionKey) -> Option<&TileGrid> {
        self.find(key).map(|id| &self.slots[id.0].tiles)
    }
}

impl TintSink<SlotId> for ChunkSlotPool {
    fn set_tint(&mut self, slot: SlotId, tile: usize, tint: Tint) {
        match self.slots.get_mut(slot.0) {
            Some(s) if s.is_bound() => s.set_tint(tile, tint),
            _ => log::trace!(target: "fade", "dropped tint for unbound {:?}", slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_chunk::TileDelta;

    fn resolve(id: &str) -> TileRef {
        match id {
            "x" => TileRef(9),
            other => TileRef(other.parse().unwrap_or(0)),
        }
    }

    fn grid(n: usize, fill: &str) -> Vec<String> {
        vec![fill.to_string(); n * n]
    }

    #[test]
    fn add_update_remove_add_reflects_latest_grid() {
        let mut pool = ChunkSlotPool::new(2, 8);
        let key = PartitionKey::new(2, 3);
        pool.apply_action(&Action::Add { key: key.clone(), tiles: grid(2, "1") }, &resolve)
            .unwrap();
        pool.apply_action(
            &Action::Update {
                key: key.clone(),
                color: None,
                deltas: vec![TileDelta { lx: 0, ly: 0, tile: "x".into() }],
            },
            &resolve,
        )
        .unwrap();
        assert_eq!(pool.tiles_for(&key).unwrap().get(0, 0), Some(TileRef(9)));
        pool.apply_action(&Action::Remove { key: key.clone() }, &resolve).unwrap();
        let out = pool
            .apply_action(&Action::Add { key: key.clone(), tiles: grid(2, "2") }, &resolve)
            .unwrap();
        assert_eq!(out, ApplyOutcome::Bound { slot: SlotId(0), reused: true });
        assert_eq!(pool.tiles_for(&key).unwrap().get(0, 0), Some(TileRef(2)));
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn update_of_unbound_key_fails_without_side_effects() {
        let mut pool = ChunkSlotPool::new(2, 8);
        let err = pool
            .apply_action(
                &Action::Update {
                    key: PartitionKey::new(0, 0),
                    color: Some(Tint(0)),
                    deltas: vec![],
                },
                &resolve,
            )
            .unwrap_err();
        assert!(matches!(err, PoolError::NotBound { kind: ActionKind::Update, .. }));
        assert_eq!(pool.stats(), PoolStats::default());
    }

    #[test]
    fn short_grid_is_rejected_before_taking_a_slot() {
        let mut pool = ChunkSlotPool::new(2, 8);
        let key = PartitionKey::new(1, 1);
        pool.apply_action(&Action::Add { key: key.clone(), tiles: grid(2, "1") }, &resolve)
            .unwrap();
        pool.apply_action(&Action::Remove { key: key.clone() }, &resolve).unwrap();

        let err = pool
            .apply_action(&Action::Add { key: key.clone(), tiles: vec!["1".into(); 3] }, &resolve)
            .unwrap_err();
        assert!(matches!(
            err,
            PoolError::Grid { source: GridError::WrongLength { expected: 4, got: 3, .. }, .. }
        ));
        assert_eq!(pool.find(&key), None);
        let stats = pool.stats();
        assert_eq!((stats.bound, stats.allocated), (0, 1));

        let out = pool
            .apply_action(&Action::Add { key, tiles: grid(2, "2") }, &resolve)
            .unwrap();
        assert_eq!(out, ApplyOutcome::Bound { slot: SlotId(0), reused: true });
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut pool = ChunkSlotPool::new(1, 8);
        let key = PartitionKey::new(0, 0);
        pool.apply_action(&Action::Add { key: key.clone(), tiles: grid(1, "1") }, &resolve)
            .unwrap();
        let err = pool
            .apply_action(&Action::Add { key: key.clone(), tiles: grid(1, "2") }, &resolve)
            .unwrap_err();
        assert_eq!(err, PoolError::AlreadyBound { key: key.clone(), slot: SlotId(0) });
        assert_eq!(pool.tiles_for(&key).unwrap().get(0, 0), Some(TileRef(1)));
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn out_of_range_delta_applies_nothing() {
        let mut pool = ChunkSlotPool::new(2, 8);
        let key = PartitionKey::new(5, 5);
        pool.apply_action(&Action::Add { key: key.clone(), tiles: grid(2, "1") }, &resolve)
            .unwrap();
        let err = pool
            .apply_action(
                &Action::Update {
                    key: key.clone(),
                    color: None,
                    deltas: vec![
                        TileDelta { lx: 0, ly: 0, tile: "x".into() },
                        TileDelta { lx: 2, ly: 0, tile: "x".into() },
                    ],
                },
                &resolve,
            )
            .unwrap_err();
        assert!(matches!(err, PoolError::Grid { .. }));
        assert_eq!(pool.tiles_for(&key).unwrap().get(0, 0), Some(TileRef(1)));
    }

    #[test]
    fn wrong_grid_length_does_not_take_a_slot() {
        let mut pool = ChunkSlotPool::new(3, 8);
        let err = pool
            .apply_action(&Action::Add { key: PartitionKey::new(0, 0), tiles: grid(2, "1") }, &resolve)
            .unwrap_err();
        assert!(matches!(err, PoolError::Grid { .. }));
        assert_eq!(pool.stats().allocated, 0);
    }

    #[test]
    fn tints_for_released_slots_are_dropped() {
        let mut pool = ChunkSlotPool::new(1, 8);
        let key = PartitionKey::new(0, 0);
        pool.add(&key, &[TileRef(0)]).unwrap();
        pool.remove(&key).unwrap();
        pool.set_tint(SlotId(0), 0, Tint(0x112233));
        assert_eq!(pool.slot(SlotId(0)).unwrap().tints()[0], Tint::NEUTRAL);
    }
}
