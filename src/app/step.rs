use sweep_pool::SlotId;
use sweep_protocol::Outbound;

use super::App;
use super::backend::{RenderBackend, Transport};
use crate::event::Event;

impl<B: RenderBackend, T: Transport> App<B, T> {
    /// Queues an event for the next frame.
    pub fn push(&mut self, kind: Event) {
        self.queue.emit(kind);
    }

    /// Runs one display frame at `now_ms`.
    pub fn frame(&mut self, now_ms: u64) {
        self.now_ms = now_ms;

        // Everything received since the last frame applies before anything is drawn.
        while let Some(env) = self.queue.pop_ready() {
            *self.evt_processed_by.entry(env.kind.label()).or_insert(0) += 1;
            self.stats.events_processed += 1;
            self.handle_event(env);
        }

        self.fades.advance(now_ms, &mut self.pool);

        if let Some(pos) = self.camera.maybe_report_position() {
            self.send(Outbound::camera(&pos));
        }

        self.sync_viewport();
        self.sync_slots();

        self.stats.frames += 1;
        self.queue.advance_tick();
    }

    fn sync_viewport(&mut self) {
        if let Some((width, height)) = self.viewport.sync(self.backend.viewport_size()) {
            self.send(Outbound::Resize { width, height });
        }
        let pivot = self.viewport.pivot();
        if self.pivot != Some(pivot) {
            self.backend.set_pivot(pivot.0, pivot.1);
            self.pivot = Some(pivot);
        }
        let layout =
            self.viewport
                .background_layout(&self.camera, self.cfg.tile_px(), self.cfg.tile_scale);
        self.backend.place_background(layout);
    }

    /// Pushes dirty slot content to the backend and positions every bound slot.
    fn sync_slots(&mut self) {
        let span = self.cfg.partition_span_px();
        let allocated = self.pool.stats().allocated;
        if self.synced_generation.len() < allocated {
            self.synced_generation.resize(allocated, None);
        }
        for i in 0..allocated {
            let id = SlotId(i);
            let Some(slot) = self.pool.slot_mut(id) else {
                continue;
            };
            let (tiles_dirty, tints_dirty) = slot.take_dirty();
            let rebound = self.synced_generation[i] != Some(slot.generation());
            if tiles_dirty {
                self.backend.upload_slot(id, slot.tiles());
                self.stats.slot_uploads += 1;
            }
            if tints_dirty {
                self.backend.set_tints(id, slot.tints());
            }
            if rebound {
                self.backend.set_label(id, slot.label());
                self.synced_generation[i] = Some(slot.generation());
            }
            match slot.key() {
                Some(key) => {
                    let (x, y) = self.camera.world_to_viewport_offset(key, span);
                    self.backend.place_slot(id, x, y, true);
                }
                None if rebound => self.backend.place_slot(id, 0, 0, false),
                None => {}
            }
        }
    }
}
