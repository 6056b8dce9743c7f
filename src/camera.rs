use sweep_geom::{Coordinate, PartitionKey};
use sweep_input::Point;

/// Camera over the infinite canvas. `position` is the world pixel shown at
/// the stage origin (screen centre).
pub struct Camera {
    pub position: Coordinate,
    last_reported: Coordinate,
    report_threshold: i64,
}

impl Camera {
    pub fn new(report_threshold: i64) -> Self {
        Self::at(Coordinate::zero(), report_threshold)
    }

    pub fn at(position: Coordinate, report_threshold: i64) -> Self {
        Self {
            last_reported: position.clone(),
            position,
            report_threshold,
        }
    }

    /// Moves the view with a screen-space drag: the world slides under the pointer.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let (rx, ry) = (dx.round() as i64, dy.round() as i64);
        if rx == 0 && ry == 0 {
            return;
        }
        self.position = self.position.offset(-rx, -ry);
    }

    /// Returns the position to announce once the camera has drifted at least
    /// the threshold on either axis since the last announcement.
    pub fn maybe_report_position(&mut self) -> Option<Coordinate> {
        let (dx, dy) = self.position.abs_delta(&self.last_reported);
        if dx < self.report_threshold && dy < self.report_threshold {
            return None;
        }
        log::debug!(target: "camera", "report ({}) after drift ({}, {})", self.position, dx, dy);
        Some(self.force_report())
    }

    pub fn force_report(&mut self) -> Coordinate {
        self.last_reported = self.position.clone();
        self.position.clone()
    }

    /// Screen offset of a partition's origin relative to the stage origin.
    pub fn world_to_viewport_offset(&self, key: &PartitionKey, span_px: i64) -> (i64, i64) {
        (&key.pixel_origin(span_px) - &self.position).saturating_i64()
    }

    /// Phase of the camera within one background tile, each axis in `[0, tile_px)`.
    pub fn background_offset(&self, tile_px: i64) -> (i64, i64) {
        self.position.mod_floor(tile_px).saturating_i64()
    }

    /// Exact world pixel under a screen point, given the stage pivot.
    pub fn screen_to_world(&self, screen: Point, pivot: (i64, i64)) -> Coordinate {
        let sx = screen.x.floor() as i64 - pivot.0;
        let sy = screen.y.floor() as i64 - pivot.1;
        self.position.offset(sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_geom::num_bigint::BigInt;

    fn huge() -> Coordinate {
        Coordinate::from_decimal("123456789012345678901234567890", "-98765432109876543210987654321")
            .unwrap()
    }

    #[test]
    fn pan_then_inverse_restores_huge_position() {
        let mut cam = Camera::at(huge(), 128);
        cam.pan(37.4, -1024.6);
        assert_ne!(cam.position, huge());
        cam.pan(-37.4, 1024.6);
        assert_eq!(cam.position, huge());
    }

    #[test]
    fn pan_moves_against_drag() {
        let mut cam = Camera::new(128);
        cam.pan(10.0, -3.0);
        assert_eq!(cam.position, Coordinate::new(-10, 3));
    }

    #[test]
    fn report_fires_at_threshold_on_either_axis() {
        let mut cam = Camera::new(128);
        cam.pan(-127.0, -127.0);
        assert_eq!(cam.maybe_report_position(), None);
        cam.pan(-1.0, 0.0);
        assert_eq!(cam.maybe_report_position(), Some(Coordinate::new(128, 127)));
        assert_eq!(cam.last_reported, Coordinate::new(128, 127));
        assert_eq!(cam.maybe_report_position(), None);
        cam.pan(0.0, 128.0);
        assert_eq!(cam.maybe_report_position(), Some(Coordinate::new(128, -1)));
    }

    #[test]
    fn report_delta_saturates_for_teleports() {
        let mut cam = Camera::new(128);
        cam.position = huge();
        assert_eq!(cam.maybe_report_position(), Some(huge()));
    }

    #[test]
    fn viewport_offset_is_exact_near_huge_positions() {
        let base = huge();
        let span = 512;
        let key = PartitionKey::containing(&base, span);
        let cam = Camera::at(base.offset(10, -20), 128);
        let (ox, oy) = cam.world_to_viewport_offset(&key, span);
        let origin = key.pixel_origin(span);
        assert_eq!(BigInt::from(ox), &origin.x - &cam.position.x);
        assert_eq!(BigInt::from(oy), &origin.y - &cam.position.y);
        assert!((-span - 20..=0).contains(&ox));
    }

    #[test]
    fn far_partitions_saturate_instead_of_wrapping() {
        let cam = Camera::at(huge(), 128);
        let (ox, oy) = cam.world_to_viewport_offset(&PartitionKey::new(0, 0), 512);
        assert_eq!((ox, oy), (i64::MIN, i64::MAX));
    }

    #[test]
    fn background_offset_uses_floor_modulo() {
        let cam = Camera::at(Coordinate::new(-5, 70), 128);
        assert_eq!(cam.background_offset(32), (27, 6));
    }

    #[test]
    fn screen_to_world_accounts_for_pivot() {
        let cam = Camera::at(Coordinate::new(1000, -1000), 128);
        let w = cam.screen_to_world(Point::new(400.7, 300.2), (400, 300));
        assert_eq!(w, Coordinate::new(1000, -1000));
        let w = cam.screen_to_world(Point::new(0.0, 0.0), (400, 300));
        assert_eq!(w, Coordinate::new(600, -1300));
    }
}
