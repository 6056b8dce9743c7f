use crate::camera::Camera;

/// Placement of the tiling background in stage space. The width and height
/// are in unscaled texture pixels, so the scaled sprite covers the viewport
/// plus one tile of margin on every side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundLayout {
    pub x: i64,
    pub y: i64,
    pub width: f64,
    pub height: f64,
}

/// Tracks the render surface size and the stage origin derived from it.
#[derive(Default)]
pub struct ViewportSync {
    size: Option<(u32, u32)>,
}

impl ViewportSync {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Records the reported surface size. Returns the new size when it changed.
    /// Degenerate sizes are ignored and the last good size kept.
    pub fn sync(&mut self, reported: (i32, i32)) -> Option<(u32, u32)> {
        let (w, h) = reported;
        if w <= 0 || h <= 0 {
            log::trace!(target: "events", "ignoring degenerate viewport {}x{}", w, h);
            return None;
        }
        let next = (w as u32, h as u32);
        if self.size == Some(next) {
            return None;
        }
        log::debug!(target: "events", "viewport {:?} -> {}x{}", self.size, next.0, next.1);
        self.size = Some(next);
        Some(next)
    }

    /// Screen position of the stage origin, which is where the camera sits.
    pub fn pivot(&self) -> (i64, i64) {
        match self.size {
            Some((w, h)) => (half_rounded(w), half_rounded(h)),
            None => (0, 0),
        }
    }

    pub fn background_layout(&self, camera: &Camera, tile_px: i64, scale: f64) -> BackgroundLayout {
        let (w, h) = self.size.unwrap_or((0, 0));
        let (phase_x, phase_y) = camera.background_offset(tile_px);
        let margin = |extent: u32| (f64::from(extent) / tile_px as f64 / 2.0).round() as i64 + 1;
        BackgroundLayout {
            x: -phase_x - margin(w) * tile_px,
            y: -phase_y - margin(h) * tile_px,
            width: (f64::from(w) + 2.0 * tile_px as f64) / scale,
            height: (f64::from(h) + 2.0 * tile_px as f64) / scale,
        }
    }
}

#[inline]
fn half_rounded(extent: u32) -> i64 {
    (i64::from(extent) + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_geom::Coordinate;

    #[test]
    fn sync_reports_changes_only() {
        let mut vp = ViewportSync::new();
        assert_eq!(vp.sync((800, 600)), Some((800, 600)));
        assert_eq!(vp.sync((800, 600)), None);
        assert_eq!(vp.sync((1024, 600)), Some((1024, 600)));
    }

    #[test]
    fn degenerate_sizes_keep_last_good() {
        let mut vp = ViewportSync::new();
        vp.sync((640, 480));
        assert_eq!(vp.sync((0, 480)), None);
        assert_eq!(vp.sync((640, -1)), None);
        assert_eq!(vp.size(), Some((640, 480)));
    }

    #[test]
    fn pivot_rounds_half_up() {
        let mut vp = ViewportSync::new();
        assert_eq!(vp.pivot(), (0, 0));
        vp.sync((801, 600));
        assert_eq!(vp.pivot(), (401, 300));
    }

    #[test]
    fn background_covers_viewport_with_margin() {
        let mut vp = ViewportSync::new();
        vp.sync((800, 600));
        let cam = Camera::at(Coordinate::new(-5, 40), 128);
        let bg = vp.background_layout(&cam, 32, 0.25);
        // 800/32/2 = 12.5 -> 13, 600/32/2 = 9.375 -> 9
        assert_eq!(bg.x, -27 - 14 * 32);
        assert_eq!(bg.y, -8 - 10 * 32);
        assert_eq!(bg.width, 864.0 * 4.0);
        assert_eq!(bg.height, 664.0 * 4.0);
        // The background's left edge is left of the viewport's.
        assert!(bg.x + vp.pivot().0 <= 0);
    }
}
