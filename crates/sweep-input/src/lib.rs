//! Pointer gesture recognition for a pannable surface of clickable chunks.
#![forbid(unsafe_code)]

pub const DEFAULT_DEADZONE_PX: f64 = 4.0;
pub const DEFAULT_LONG_PRESS_MS: u64 = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    pub deadzone_px: f64,
    pub long_press_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            deadzone_px: DEFAULT_DEADZONE_PX,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent<T> {
    /// Screen-space drag delta; the view follows the pointer.
    Pan { dx: f64, dy: f64 },
    Tap { target: T, pos: Point },
    SecondaryTap { target: T, pos: Point },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum GestureState<T> {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    PressedOnChunk {
        start_pos: Point,
        start_time: u64,
        target: T,
        last: Point,
        left_deadzone: bool,
        secondary: bool,
    },
}

/// Single-pointer recogniser. `T` identifies the chunk under the press.
pub struct GestureRecognizer<T> {
    cfg: GestureConfig,
    state: GestureState<T>,
    primary_touch: Option<u64>,
}

impl<T: Clone + std::fmt::Debug> GestureRecognizer<T> {
    pub fn new(cfg: GestureConfig) -> Self {
        Self {
            cfg,
            state: GestureState::Idle,
            primary_touch: None,
        }
    }

    #[inline]
    pub fn config(&self) -> GestureConfig {
        self.cfg
    }

    #[inline]
    pub fn state(&self) -> &GestureState<T> {
        &self.state
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn pointer_down(
        &mut self,
        pos: Point,
        time_ms: u64,
        button: PointerButton,
        target: Option<T>,
    ) -> Option<GestureEvent<T>> {
        if !self.is_idle() {
            // A second button while already pressed does not restart the gesture.
            return None;
        }
        self.state = match (target, button) {
            (Some(target), PointerButton::Primary | PointerButton::Secondary) => {
                GestureState::PressedOnChunk {
                    start_pos: pos,
                    start_time: time_ms,
                    target,
                    last: pos,
                    left_deadzone: false,
                    secondary: button == PointerButton::Secondary,
                }
            }
            _ => GestureState::Panning { last: pos },
        };
        log::trace!(target: "input", "down {:?} at ({}, {}) -> {:?}", button, pos.x, pos.y, self.state);
        None
    }

    pub fn pointer_move(&mut self, pos: Point, _time_ms: u64) -> Option<GestureEvent<T>> {
        let deadzone = self.cfg.deadzone_px;
        let last = match &mut self.state {
            GestureState::Idle => return None,
            GestureState::Panning { last } => last,
            GestureState::PressedOnChunk {
                start_pos,
                last,
                left_deadzone,
                ..
            } => {
                if !*left_deadzone && start_pos.distance(pos) >= deadzone {
                    *left_deadzone = true;
                    log::trace!(target: "input", "press left deadzone");
                }
                last
            }
        };
        let (dx, dy) = (pos.x - last.x, pos.y - last.y);
        *last = pos;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(GestureEvent::Pan { dx, dy })
    }

    pub fn pointer_up(&mut self, pos: Point, time_ms: u64) -> Option<GestureEvent<T>> {
        let deadzone = self.cfg.deadzone_px;
        match std::mem::take(&mut self.state) {
            GestureState::PressedOnChunk {
                start_pos,
                start_time,
                target,
                left_deadzone,
                secondary,
                ..
            } => {
                if left_deadzone || start_pos.distance(pos) >= deadzone {
                    log::trace!(target: "input", "release after drag, no intent");
                    return None;
                }
                let held = time_ms.saturating_sub(start_time);
                let ev = if secondary || held >= self.cfg.long_press_ms {
                    GestureEvent::SecondaryTap { target, pos }
                } else {
                    GestureEvent::Tap { target, pos }
                };
                log::debug!(target: "input", "{:?} after {}ms", ev, held);
                Some(ev)
            }
            GestureState::Panning { .. } | GestureState::Idle => None,
        }
    }

    /// Pointer cancel, leaving the surface, or focus loss.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::trace!(target: "input", "gesture cancelled");
        }
        self.state = GestureState::Idle;
        self.primary_touch = None;
    }

    /// Wheel scroll pans the view by the wheel delta, leaving any press intact.
    pub fn wheel(&mut self, dx: f64, dy: f64) -> Option<GestureEvent<T>> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        Some(GestureEvent::Pan { dx: -dx, dy: -dy })
    }

    pub fn touch_start(
        &mut self,
        id: u64,
        pos: Point,
        time_ms: u64,
        target: Option<T>,
    ) -> Option<GestureEvent<T>> {
        if self.primary_touch.is_some() || !self.is_idle() {
            return None;
        }
        self.primary_touch = Some(id);
        self.pointer_down(pos, time_ms, PointerButton::Primary, target)
    }

    pub fn touch_move(&mut self, id: u64, pos: Point, time_ms: u64) -> Option<GestureEvent<T>> {
        if self.primary_touch != Some(id) {
            return None;
        }
        self.pointer_move(pos, time_ms)
    }

    pub fn touch_end(&mut self, id: u64, pos: Point, time_ms: u64) -> Option<GestureEvent<T>> {
        if self.primary_touch != Some(id) {
            return None;
        }
        self.primary_touch = None;
        self.pointer_up(pos, time_ms)
    }

    pub fn touch_cancel(&mut self, id: u64) {
        if self.primary_touch == Some(id) {
            self.cancel();
        }
    }
}

impl<T: Clone + std::fmt::Debug> Default for GestureRecognizer<T> {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
