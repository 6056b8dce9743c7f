use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Deserialize;
use sweep_chunk::{TileGrid, TileRef, Tint};
use sweep_input::{Point, PointerButton};
use sweep_pool::SlotId;
use sweep_protocol::{Action, Outbound, ProtocolError, decode_batch};

use crate::app::{RenderBackend, Transport};
use crate::event::PointerInput;
use crate::tileset::AtlasRect;
use crate::viewport::BackgroundLayout;

/// What the backend last received for one slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotView {
    pub tiles: Vec<TileRef>,
    pub tints: Vec<Tint>,
    pub x: i64,
    pub y: i64,
    pub visible: bool,
    pub label: Option<String>,
}

/// Render backend that records instead of drawing.
pub struct HeadlessBackend {
    size: (i32, i32),
    pub atlas: Vec<AtlasRect>,
    pub slots: BTreeMap<SlotId, SlotView>,
    pub pivot: (i64, i64),
    pub background: Option<BackgroundLayout>,
    pub uploads: usize,
}

impl HeadlessBackend {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: (width, height),
            atlas: Vec::new(),
            slots: BTreeMap::new(),
            pivot: (0, 0),
            background: None,
            uploads: 0,
        }
    }

    pub fn set_size(&mut self, width: i32, height: i32) {
        self.size = (width, height);
    }

    pub fn visible_labels(&self) -> Vec<&str> {
        self.slots
            .values()
            .filter(|s| s.visible)
            .filter_map(|s| s.label.as_deref())
            .collect()
    }

    /// Logs what a real surface would currently show.
    pub fn log_summary(&self) {
        log::debug!(
            target: "events",
            "surface {:?}: {} atlas rects, {} uploads, pivot {:?}, background {:?}",
            self.size,
            self.atlas.len(),
            self.uploads,
            self.pivot,
            self.background
        );
        for (id, view) in self.slots.iter().filter(|(_, v)| v.visible) {
            let tinted = view.tints.iter().filter(|t| !t.is_neutral()).count();
            log::debug!(
                target: "events",
                "{:?} ({}) at {}, {}: {} tiles, {} tinted",
                id,
                view.label.as_deref().unwrap_or("?"),
                view.x,
                view.y,
                view.tiles.len(),
                tinted
            );
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn viewport_size(&self) -> (i32, i32) {
        self.size
    }

    fn load_atlas(&mut self, rects: &[AtlasRect]) {
        self.atlas = rects.to_vec();
    }

    fn upload_slot(&mut self, slot: SlotId, tiles: &TileGrid) {
        let view = self.slots.entry(slot).or_default();
        view.tiles.clear();
        view.tiles.extend_from_slice(tiles.as_slice());
        self.uploads += 1;
    }

    fn set_tints(&mut self, slot: SlotId, tints: &[Tint]) {
        let view = self.slots.entry(slot).or_default();
        view.tints.clear();
        view.tints.extend_from_slice(tints);
    }

    fn place_slot(&mut self, slot: SlotId, x: i64, y: i64, visible: bool) {
        let view = self.slots.entry(slot).or_default();
        view.x = x;
        view.y = y;
        view.visible = visible;
    }

    fn set_label(&mut self, slot: SlotId, label: Option<&str>) {
        self.slots.entry(slot).or_default().label = label.map(str::to_string);
    }

    fn place_background(&mut self, layout: BackgroundLayout) {
        self.background = Some(layout);
    }

    fn set_pivot(&mut self, x: i64, y: i64) {
        self.pivot = (x, y);
    }
}

/// Writes each outbound message as one JSON line.
pub struct JsonLinesTransport<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesTransport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Transport for JsonLinesTransport<W> {
    fn send(&mut self, msg: &Outbound) {
        let res = msg
            .to_json()
            .map_err(io::Error::from)
            .and_then(|line| writeln!(self.out, "{}", line))
            .and_then(|_| self.out.flush());
        if let Err(e) = res {
            log::warn!(target: "events", "failed to write {} message: {}", msg.name(), e);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("bad script op: {0}")]
    Op(#[from] serde_json::Error),
}

/// One line of a replay script.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptMsg {
    Batch { actions: Vec<Action>, rejected: usize },
    Pointer(PointerInput),
    Resize { width: i32, height: i32 },
    Connect,
    /// Let this much virtual time pass.
    Wait { ms: u64 },
}

#[derive(Deserialize, Clone, Copy, Debug, Default)]
#[serde(rename_all = "lowercase")]
enum ScriptButton {
    #[default]
    Primary,
    Secondary,
    Auxiliary,
}

impl From<ScriptButton> for PointerButton {
    fn from(b: ScriptButton) -> Self {
        match b {
            ScriptButton::Primary => PointerButton::Primary,
            ScriptButton::Secondary => PointerButton::Secondary,
            ScriptButton::Auxiliary => PointerButton::Auxiliary,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ScriptOp {
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: ScriptButton,
    },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Cancel,
    Wheel { dx: f64, dy: f64 },
    TouchStart { id: u64, x: f64, y: f64 },
    TouchMove { id: u64, x: f64, y: f64 },
    TouchEnd { id: u64, x: f64, y: f64 },
    TouchCancel { id: u64 },
    Resize { width: i32, height: i32 },
    Connect,
    Wait { ms: u64 },
}

/// Parses one replay line: a JSON array is an inbound action batch, an object
/// with an `op` tag is input or timing. Blank lines and `#` comments yield `None`.
pub fn parse_script_line(line: &str) -> Result<Option<ScriptMsg>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.starts_with('[') {
        let mut actions = Vec::new();
        let mut rejected = 0;
        for (i, entry) in decode_batch(line)?.into_iter().enumerate() {
            match entry {
                Ok(a) => actions.push(a),
                Err(e) => {
                    log::warn!(target: "stream", "dropping batch entry {}: {}", i, e);
                    rejected += 1;
                }
            }
        }
        return Ok(Some(ScriptMsg::Batch { actions, rejected }));
    }
    let p = |x, y| Point::new(x, y);
    let msg = match serde_json::from_str::<ScriptOp>(line)? {
        ScriptOp::Down { x, y, button } => ScriptMsg::Pointer(PointerInput::Down {
            pos: p(x, y),
            button: button.into(),
        }),
        ScriptOp::Move { x, y } => ScriptMsg::Pointer(PointerInput::Move { pos: p(x, y) }),
        ScriptOp::Up { x, y } => ScriptMsg::Pointer(PointerInput::Up { pos: p(x, y) }),
        ScriptOp::Cancel => ScriptMsg::Pointer(PointerInput::Cancel),
        ScriptOp::Wheel { dx, dy } => ScriptMsg::Pointer(PointerInput::Wheel { dx, dy }),
        ScriptOp::TouchStart { id, x, y } => {
            ScriptMsg::Pointer(PointerInput::TouchStart { id, pos: p(x, y) })
        }
        ScriptOp::TouchMove { id, x, y } => {
            ScriptMsg::Pointer(PointerInput::TouchMove { id, pos: p(x, y) })
        }
        ScriptOp::TouchEnd { id, x, y } => {
            ScriptMsg::Pointer(PointerInput::TouchEnd { id, pos: p(x, y) })
        }
        ScriptOp::TouchCancel { id } => ScriptMsg::Pointer(PointerInput::TouchCancel { id }),
        ScriptOp::Resize { width, height } => ScriptMsg::Resize { width, height },
        ScriptOp::Connect => ScriptMsg::Connect,
        ScriptOp::Wait { ms } => ScriptMsg::Wait { ms },
    };
    Ok(Some(msg))
}
