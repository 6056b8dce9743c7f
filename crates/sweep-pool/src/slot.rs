use sweep_chunk::{TileGrid, TileRef, Tint};
use sweep_geom::PartitionKey;

/// Stable index of a slot in the pool, independent of the partition bound to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SlotState {
    #[default]
    Free,
    Bound(PartitionKey),
}

/// One renderable chunk: a tile grid, per-tile tints, and its binding.
pub struct ChunkSlot {
    pub(crate) state: SlotState,
    pub(crate) tiles: TileGrid,
    tints: Vec<Tint>,
    visible: bool,
    label: Option<String>,
    /// Bumped on every bind and release so stale references can be detected.
    generation: u64,
    /// Grid changed since the backend last saw it.
    pub(crate) tiles_dirty: bool,
    /// Tints changed since the backend last saw them.
    tints_dirty: bool,
}

impl ChunkSlot {
    pub(crate) fn new(partition_size: usize) -> Self {
        Self {
            state: SlotState::Free,
            tiles: TileGrid::filled(partition_size, TileRef::default()),
            tints: vec![Tint::NEUTRAL; partition_size * partition_size],
            visible: false,
            label: None,
            generation: 0,
            tiles_dirty: false,
            tints_dirty: false,
        }
    }

    pub(crate) fn bind(&mut self, key: PartitionKey) {
        self.label = Some(key.to_string());
        self.state = SlotState::Bound(key);
        self.visible = true;
        self.generation = self.generation.wrapping_add(1);
        self.reset_tints();
        self.tiles_dirty = true;
    }

    pub(crate) fn release(&mut self) {
        self.state = SlotState::Free;
        self.visible = false;
        self.label = None;
        self.generation = self.generation.wrapping_add(1);
        self.reset_tints();
    }

    fn reset_tints(&mut self) {
        if self.tints.iter().any(|t| !t.is_neutral()) {
            self.tints.fill(Tint::NEUTRAL);
            self.tints_dirty = true;
        }
    }

    pub(crate) fn set_tint(&mut self, tile: usize, tint: Tint) {
        if let Some(t) = self.tints.get_mut(tile) {
            if *t != tint {
                *t = tint;
                self.tints_dirty = true;
            }
        }
    }

    #[inline]
    pub fn state(&self) -> &SlotState {
        &self.state
    }

    #[inline]
    pub fn key(&self) -> Option<&PartitionKey> {
        match &self.state {
            SlotState::Bound(k) => Some(k),
            SlotState::Free => None,
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        matches!(self.state, SlotState::Bound(_))
    }

    #[inline]
    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    #[inline]
    pub fn tints(&self) -> &[Tint] {
        &self.tints
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Debug label drawn over the chunk, `"x, y"` of its partition key.
    #[inline]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns and clears the dirty flags as `(tiles, tints)`.
    pub fn take_dirty(&mut self) -> (bool, bool) {
        let out = (self.tiles_dirty, self.tints_dirty);
        self.tiles_dirty = false;
        self.tints_dirty = false;
        out
    }
}
