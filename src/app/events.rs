use sweep_geom::{Coordinate, PartitionKey};
use sweep_input::{GestureEvent, Point};
use sweep_pool::ApplyOutcome;
use sweep_protocol::{Action, Outbound};

use super::App;
use super::backend::{RenderBackend, Transport};
use super::state::TapTarget;
use crate::event::{Event, EventEnvelope, PointerInput};

impl<B: RenderBackend, T: Transport> App<B, T> {
    pub(super) fn handle_event(&mut self, env: EventEnvelope) {
        Self::log_event(env.tick, &env.kind);
        match env.kind {
            Event::ActionsReceived { actions, rejected } => {
                self.stats.actions_rejected += rejected;
                self.apply_actions(&actions);
            }
            Event::Connected => self.announce(),
            Event::Pointer { input, time_ms } => self.handle_pointer(input, time_ms),
        }
    }

    /// Applies a batch in order. A failing action is logged and skipped; the
    /// rest of the batch still applies.
    pub(crate) fn apply_actions(&mut self, actions: &[Action]) {
        for action in actions {
            match self.pool.apply_action(action, &self.tileset) {
                Ok(ApplyOutcome::Bound { slot, .. }) | Ok(ApplyOutcome::Released { slot }) => {
                    self.fades.cancel_slot(slot);
                    self.stats.actions_applied += 1;
                }
                Ok(ApplyOutcome::Updated { slot, changed, color }) => {
                    match color {
                        Some(color) => {
                            self.fades.start(slot, changed, color, self.now_ms, &mut self.pool);
                        }
                        None => {
                            self.fades.cancel_tiles(slot, changed, &mut self.pool);
                        }
                    }
                    self.stats.actions_applied += 1;
                }
                Err(e) => {
                    log::warn!(target: "stream", "skipping {} action: {}", action.kind().as_str(), e);
                    self.stats.actions_rejected += 1;
                }
            }
        }
    }

    /// Sends the current size and camera, as the authority expects on (re)connect.
    pub(crate) fn announce(&mut self) {
        self.viewport.sync(self.backend.viewport_size());
        if let Some((width, height)) = self.viewport.size() {
            self.send(Outbound::Resize { width, height });
        }
        let pos = self.camera.force_report();
        self.send(Outbound::camera(&pos));
    }

    pub(crate) fn send(&mut self, msg: Outbound) {
        log::debug!(target: "events", "send {}", msg.name());
        self.transport.send(&msg);
        self.stats.messages_sent += 1;
    }

    fn handle_pointer(&mut self, input: PointerInput, time_ms: u64) {
        let ev = match input {
            PointerInput::Down { pos, button } => {
                let target = self.hit_test(pos);
                self.gestures.pointer_down(pos, time_ms, button, target)
            }
            PointerInput::Move { pos } => self.gestures.pointer_move(pos, time_ms),
            PointerInput::Up { pos } => self.gestures.pointer_up(pos, time_ms),
            PointerInput::Cancel => {
                self.gestures.cancel();
                None
            }
            PointerInput::Wheel { dx, dy } => self.gestures.wheel(dx, dy),
            PointerInput::TouchStart { id, pos } => {
                let target = self.hit_test(pos);
                self.gestures.touch_start(id, pos, time_ms, target)
            }
            PointerInput::TouchMove { id, pos } => self.gestures.touch_move(id, pos, time_ms),
            PointerInput::TouchEnd { id, pos } => self.gestures.touch_end(id, pos, time_ms),
            PointerInput::TouchCancel { id } => {
                self.gestures.touch_cancel(id);
                None
            }
        };
        if let Some(ev) = ev {
            self.apply_gesture(ev);
        }
    }

    fn apply_gesture(&mut self, ev: GestureEvent<TapTarget>) {
        match ev {
            GestureEvent::Pan { dx, dy } => self.camera.pan(dx, dy),
            GestureEvent::Tap { target, pos } => {
                if let Some(tile) = self.tile_under(target, pos) {
                    log::info!(target: "input", "reveal ({})", tile);
                    self.send(Outbound::reveal(&tile));
                }
            }
            GestureEvent::SecondaryTap { target, pos } => {
                if let Some(tile) = self.tile_under(target, pos) {
                    log::info!(target: "input", "flag ({})", tile);
                    self.send(Outbound::flag(&tile));
                }
            }
        }
    }

    /// Bound chunk under a screen point, if any.
    pub(crate) fn hit_test(&self, pos: Point) -> Option<TapTarget> {
        let world = self.camera.screen_to_world(pos, self.viewport.pivot());
        let key = PartitionKey::containing(&world, self.cfg.partition_span_px());
        let slot = self.pool.find(&key)?;
        let generation = self.pool.slot(slot)?.generation();
        Some(TapTarget { slot, generation })
    }

    /// Absolute tile coordinate under `pos` within the pressed chunk. `None`
    /// when the chunk was released or rebound since the press.
    fn tile_under(&mut self, target: TapTarget, pos: Point) -> Option<Coordinate> {
        let slot = self.pool.slot(target.slot)?;
        let key = match slot.key() {
            Some(key) if slot.generation() == target.generation => key,
            _ => {
                log::debug!(target: "input", "dropping tap on {:?}: chunk changed under the press", target.slot);
                self.stats.taps_dropped += 1;
                return None;
            }
        };
        let world = self.camera.screen_to_world(pos, self.viewport.pivot());
        let local = &world - &key.pixel_origin(self.cfg.partition_span_px());
        let (cx, cy) = local.div_floor(self.cfg.tile_px()).saturating_i64();
        Some(key.tile_at(self.cfg.partition_size, cx, cy))
    }

    fn log_event(tick: u64, ev: &Event) {
        match ev {
            Event::ActionsReceived { actions, rejected } => {
                log::debug!(target: "events", "[tick {}] ActionsReceived n={} rejected={}",
                    tick, actions.len(), rejected);
            }
            Event::Connected => {
                log::info!(target: "events", "[tick {}] Connected", tick);
            }
            Event::Pointer { input, time_ms } => {
                log::trace!(target: "events", "[tick {}] Pointer {:?} t={}ms", tick, input, time_ms);
            }
        }
    }
}
