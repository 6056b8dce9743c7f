use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use sweep_chunk::{TileRef, TileResolver};

/// Tile id drawn for cells the server has not revealed, and for unknown ids.
pub const UNREVEALED: &str = "u";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TilesetError {
    #[error("tileset has {0} entries; at most 65536 are addressable")]
    TooManyTiles(usize),
}

/// Atlas of square texture cells keyed by tile id.
pub struct Tileset {
    rects: Vec<AtlasRect>,
    by_id: HashMap<String, TileRef>,
    fallback: TileRef,
}

impl Tileset {
    /// Parses `{"<id>": [x, y], ...}` atlas offsets. Ids are assigned in key
    /// order so a given file always yields the same `TileRef`s.
    pub fn from_json_str(s: &str, cell: u32) -> Result<Self, Box<dyn Error>> {
        let entries: BTreeMap<String, [u32; 2]> = serde_json::from_str(s)?;
        if entries.len() > usize::from(u16::MAX) + 1 {
            return Err(TilesetError::TooManyTiles(entries.len()).into());
        }
        let mut ts = Tileset {
            rects: Vec::with_capacity(entries.len()),
            by_id: HashMap::with_capacity(entries.len()),
            fallback: TileRef(0),
        };
        for (id, [x, y]) in entries {
            let tile = TileRef(ts.rects.len() as u16);
            ts.by_id.insert(id, tile);
            ts.rects.push(AtlasRect { x, y, w: cell, h: cell });
        }
        match ts.by_id.get(UNREVEALED) {
            Some(t) => ts.fallback = *t,
            None => log::warn!(target: "events", "tileset has no {:?} tile; unknown ids use index 0", UNREVEALED),
        }
        log::info!(target: "events", "tileset loaded: {} tiles at {}px", ts.rects.len(), cell);
        Ok(ts)
    }

    pub fn from_path(path: impl AsRef<Path>, cell: u32) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_json_str(&s, cell)
    }

    pub fn get(&self, id: &str) -> Option<TileRef> {
        self.by_id.get(id).copied()
    }

    /// Source rectangle of every tile, indexed by `TileRef`.
    pub fn rects(&self) -> &[AtlasRect] {
        &self.rects
    }
}

impl TileResolver for Tileset {
    fn resolve(&self, id: &str) -> TileRef {
        match self.by_id.get(id) {
            Some(t) => *t,
            None => {
                log::trace!(target: "stream", "unknown tile id {:?}", id);
                self.fallback
            }
        }
    }
}
