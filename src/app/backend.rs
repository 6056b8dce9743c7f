use sweep_chunk::{TileGrid, Tint};
use sweep_pool::SlotId;
use sweep_protocol::Outbound;

use crate::tileset::AtlasRect;
use crate::viewport::BackgroundLayout;

/// Drawing surface. Slot and background positions are in stage space; the
/// stage itself sits at the pivot on screen.
pub trait RenderBackend {
    /// Current surface size in pixels. May be zero or negative while the host
    /// is minimised or not yet laid out.
    fn viewport_size(&self) -> (i32, i32);
    /// Atlas source rectangles, indexed by `TileRef`. Sent once at startup.
    fn load_atlas(&mut self, rects: &[AtlasRect]);
    fn upload_slot(&mut self, slot: SlotId, tiles: &TileGrid);
    fn set_tints(&mut self, slot: SlotId, tints: &[Tint]);
    fn place_slot(&mut self, slot: SlotId, x: i64, y: i64, visible: bool);
    fn set_label(&mut self, slot: SlotId, label: Option<&str>);
    fn place_background(&mut self, layout: BackgroundLayout);
    fn set_pivot(&mut self, x: i64, y: i64);
}

/// Outbound channel to the authority.
pub trait Transport {
    fn send(&mut self, msg: &Outbound);
}

impl Transport for Vec<Outbound> {
    fn send(&mut self, msg: &Outbound) {
        self.push(msg.clone());
    }
}
