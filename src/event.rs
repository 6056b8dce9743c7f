use std::collections::VecDeque;

use sweep_input::{Point, PointerButton};
use sweep_protocol::Action;

#[derive(Clone, Debug, PartialEq)]
pub enum PointerInput {
    Down { pos: Point, button: PointerButton },
    Move { pos: Point },
    Up { pos: Point },
    /// Cancel, pointer leaving the surface, or focus loss.
    Cancel,
    Wheel { dx: f64, dy: f64 },
    TouchStart { id: u64, pos: Point },
    TouchMove { id: u64, pos: Point },
    TouchEnd { id: u64, pos: Point },
    TouchCancel { id: u64 },
}

pub enum Event {
    // Stream
    /// One decoded inbound batch; `rejected` entries failed to decode and were dropped.
    ActionsReceived { actions: Vec<Action>, rejected: usize },
    /// Transport (re)connected; the authority needs camera and size again.
    Connected,

    // Input
    Pointer { input: PointerInput, time_ms: u64 },
}

impl Event {
    pub fn label(&self) -> &'static str {
        match self {
            Event::ActionsReceived { .. } => "ActionsReceived",
            Event::Connected => "Connected",
            Event::Pointer { .. } => "Pointer",
        }
    }
}

pub struct EventEnvelope {
    /// Frame the event was queued for.
    pub tick: u64,
    pub kind: Event,
}

/// Events received between frames, drained in arrival order by the next frame.
#[derive(Default)]
pub struct EventQueue {
    pending: VecDeque<EventEnvelope>,
    pub now: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: Event) {
        let tick = self.now;
        self.pending.push_back(EventEnvelope { tick, kind });
    }

    pub fn pop_ready(&mut self) -> Option<EventEnvelope> {
        self.pending.pop_front()
    }

    pub fn advance_tick(&mut self) {
        self.now = self.now.wrapping_add(1);
    }
}
