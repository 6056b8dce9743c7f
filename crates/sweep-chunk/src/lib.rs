//! Fixed-size tile grids for one partition, plus the tint values used while
//! a recently updated tile fades back to neutral.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Opaque handle resolved by the tileset to a drawable texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef(pub u16);

/// Maps wire tile identifiers onto texture handles.
pub trait TileResolver {
    fn resolve(&self, id: &str) -> TileRef;
}

impl<F> TileResolver for F
where
    F: Fn(&str) -> TileRef,
{
    fn resolve(&self, id: &str) -> TileRef {
        self(id)
    }
}

/// Packed `0xRRGGBB` multiply tint. White leaves the texture untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tint(pub u32);

impl Tint {
    pub const NEUTRAL: Tint = Tint(0xFF_FF_FF);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Tint(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[inline]
    pub const fn channels(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    #[inline]
    pub const fn complement(self) -> Tint {
        Tint(!self.0 & 0xFF_FF_FF)
    }

    #[inline]
    pub fn is_neutral(self) -> bool {
        self == Tint::NEUTRAL
    }

    /// `NEUTRAL - complement * (remaining / steps)`, rounded per channel.
    ///
    /// With `remaining == steps` this yields the original colour, with
    /// `remaining == 0` it yields neutral.
    pub fn faded(complement: Tint, remaining: u32, steps: u32) -> Tint {
        if steps == 0 || remaining == 0 {
            return Tint::NEUTRAL;
        }
        let remaining = remaining.min(steps);
        let [r, g, b] = complement.channels();
        let scale = |c: u8| -> u8 {
            let premul = (u32::from(c) * remaining + steps / 2) / steps;
            255 - premul.min(255) as u8
        };
        Tint::rgb(scale(r), scale(g), scale(b))
    }
}

impl Default for Tint {
    fn default() -> Self {
        Tint::NEUTRAL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("expected {expected} tiles for a {size}x{size} grid, got {got}")]
    WrongLength {
        size: usize,
        expected: usize,
        got: usize,
    },
    #[error("local cell ({x}, {y}) outside a {size}x{size} grid")]
    OutOfRange { x: usize, y: usize, size: usize },
}

/// One sparse change inside a partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDelta<T = String> {
    pub lx: usize,
    pub ly: usize,
    pub tile: T,
}

/// Row-major `size * size` grid of tile handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    size: usize,
    tiles: Vec<TileRef>,
}

impl TileGrid {
    pub fn filled(size: usize, tile: TileRef) -> Self {
        Self {
            size,
            tiles: vec![tile; size * size],
        }
    }

    pub fn from_tiles(size: usize, tiles: Vec<TileRef>) -> Result<Self, GridError> {
        let expected = size * size;
        if tiles.len() != expected {
            return Err(GridError::WrongLength {
                size,
                expected,
                got: tiles.len(),
            });
        }
        Ok(Self { size, tiles })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn checked_idx(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if self.contains(x, y) {
            Ok(self.idx(x, y))
        } else {
            Err(GridError::OutOfRange {
                x,
                y,
                size: self.size,
            })
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<TileRef> {
        if self.contains(x, y) {
            Some(self.tiles[self.idx(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn set_index(&mut self, idx: usize, tile: TileRef) {
        self.tiles[idx] = tile;
    }

    /// Overwrites every cell from a slice of exactly `len()` handles.
    pub fn fill_from(&mut self, tiles: &[TileRef]) -> Result<(), GridError> {
        if tiles.len() != self.tiles.len() {
            return Err(GridError::WrongLength {
                size: self.size,
                expected: self.tiles.len(),
                got: tiles.len(),
            });
        }
        self.tiles.copy_from_slice(tiles);
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[TileRef] {
        &self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_flips_channels() {
        assert_eq!(Tint(0xFF0000).complement(), Tint(0x00FFFF));
        assert_eq!(Tint::NEUTRAL.complement(), Tint(0));
    }

    #[test]
    fn faded_endpoints() {
        let color = Tint(0x3366CC);
        let comp = color.complement();
        assert_eq!(Tint::faded(comp, 16, 16), color);
        assert_eq!(Tint::faded(comp, 0, 16), Tint::NEUTRAL);
    }

    #[test]
    fn faded_halfway_is_between() {
        let comp = Tint(0x000000).complement();
        let half = Tint::faded(comp, 8, 16);
        let [r, g, b] = half.channels();
        assert_eq!((r, g, b), (127, 127, 127));
    }

    #[test]
    fn from_tiles_rejects_wrong_length() {
        let err = TileGrid::from_tiles(4, vec![TileRef(0); 15]).unwrap_err();
        assert_eq!(
            err,
            GridError::WrongLength {
                size: 4,
                expected: 16,
                got: 15
            }
        );
    }
}
