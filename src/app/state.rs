use hashbrown::HashMap;
use sweep_fade::FadeController;
use sweep_input::GestureRecognizer;
use sweep_pool::{ChunkSlotPool, SlotId};

use super::backend::{RenderBackend, Transport};
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::event::EventQueue;
use crate::tileset::Tileset;
use crate::viewport::ViewportSync;

/// Chunk under a press, pinned to the slot generation seen at press time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TapTarget {
    pub slot: SlotId,
    pub generation: u64,
}

pub struct App<B, T> {
    pub cfg: EngineConfig,
    pub queue: EventQueue,
    pub camera: Camera,
    pub pool: ChunkSlotPool,
    pub fades: FadeController<SlotId>,
    pub gestures: GestureRecognizer<TapTarget>,
    pub viewport: ViewportSync,
    pub tileset: Tileset,
    pub backend: B,
    pub transport: T,
    pub stats: FrameStats,
    pub(crate) now_ms: u64,
    pub(crate) pivot: Option<(i64, i64)>,
    // Slot generation last pushed to the backend, by slot index.
    pub(crate) synced_generation: Vec<Option<u64>>,
    pub(crate) evt_processed_by: HashMap<&'static str, usize>,
}

#[derive(Default, Debug, Clone)]
pub struct FrameStats {
    pub frames: u64,
    pub actions_applied: usize,
    pub actions_rejected: usize,
    pub taps_dropped: usize,
    pub messages_sent: usize,
    pub events_processed: usize,
    pub slot_uploads: usize,
}

impl<B: RenderBackend, T: Transport> App<B, T> {
    pub fn new(cfg: EngineConfig, tileset: Tileset, mut backend: B, transport: T) -> Self {
        let pool = ChunkSlotPool::new(cfg.partition_size, cfg.pool_soft_cap);
        log::info!(
            target: "events",
            "engine: {}px tiles, {}x{} partitions, report every {}px",
            cfg.tile_px(),
            cfg.partition_size,
            cfg.partition_size,
            cfg.report_threshold_px()
        );
        backend.load_atlas(tileset.rects());
        Self {
            camera: Camera::new(cfg.report_threshold_px()),
            fades: FadeController::new(cfg.fade()),
            gestures: GestureRecognizer::new(cfg.gesture()),
            queue: EventQueue::new(),
            pool,
            viewport: ViewportSync::new(),
            tileset,
            backend,
            transport,
            stats: FrameStats::default(),
            now_ms: 0,
            pivot: None,
            synced_generation: Vec::new(),
            evt_processed_by: HashMap::new(),
            cfg,
        }
    }

    /// Processed event counts by label, most frequent first.
    pub fn events_by_label(&self) -> Vec<(&'static str, usize)> {
        let mut rows: Vec<_> = self.evt_processed_by.iter().map(|(k, v)| (*k, *v)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        rows
    }
}
