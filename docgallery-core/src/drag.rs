//! Pointer and keyboard drag sensors over an ordered list of drag ids.

use log::debug;

use crate::keyboard::Key;

/// Distance in pixels the pointer must travel before a press becomes a drag.
pub const ACTIVATION_DISTANCE: f32 = 8.0;

/// Emitted when a drag completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub active: String,
    pub over: Option<String>,
}

impl DragEnd {
    /// True when dropping moved the item somewhere else.
    pub fn is_move(&self) -> bool {
        self.over.as_deref().is_some_and(|over| over != self.active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What part of a card a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    DragHandle,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
enum Session {
    Idle,
    Pressed { id: String, origin: Point },
    PointerDrag { id: String, over: Option<String> },
    KeyboardDrag { id: String, over: usize },
}

/// Tracks one drag at a time across the sortable items.
#[derive(Debug, Clone)]
pub struct SortableContext {
    items: Vec<String>,
    session: Session,
}

impl SortableContext {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            session: Session::Idle,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Replaces the item order, cancelling a drag whose item disappeared.
    pub fn set_items(&mut self, items: Vec<String>) {
        let still_present = self
            .active()
            .is_none_or(|active| items.iter().any(|id| id == active));
        if !still_present {
            self.session = Session::Idle;
        }
        self.items = items;
    }

    pub fn active(&self) -> Option<&str> {
        match &self.session {
            Session::PointerDrag { id, .. } | Session::KeyboardDrag { id, .. } => Some(id),
            Session::Idle | Session::Pressed { .. } => None,
        }
    }

    pub fn over(&self) -> Option<&str> {
        match &self.session {
            Session::PointerDrag { over, .. } => over.as_deref(),
            Session::KeyboardDrag { over, .. } => self.items.get(*over).map(String::as_str),
            Session::Idle | Session::Pressed { .. } => None,
        }
    }

    /// Only presses on the drag handle arm the pointer sensor.
    pub fn pointer_down(&mut self, id: &str, target: PressTarget, at: Point) {
        if target != PressTarget::DragHandle || !self.items.iter().any(|item| item == id) {
            return;
        }
        self.session = Session::Pressed {
            id: id.to_string(),
            origin: at,
        };
    }

    pub fn pointer_move(&mut self, at: Point, over: Option<&str>) {
        match &mut self.session {
            Session::Pressed { id, origin } => {
                if origin.distance(at) >= ACTIVATION_DISTANCE {
                    debug!("Drag started for {id}");
                    self.session = Session::PointerDrag {
                        id: std::mem::take(id),
                        over: over.map(str::to_string),
                    };
                }
            }
            Session::PointerDrag { over: current, .. } => {
                *current = over.map(str::to_string);
            }
            Session::Idle | Session::KeyboardDrag { .. } => {}
        }
    }

    /// Returns the drag end if the press had become a drag.
    pub fn pointer_up(&mut self) -> Option<DragEnd> {
        if matches!(self.session, Session::KeyboardDrag { .. }) {
            return None;
        }
        match std::mem::replace(&mut self.session, Session::Idle) {
            Session::PointerDrag { id, over } => Some(DragEnd { active: id, over }),
            _ => None,
        }
    }

    /// Feeds a key pressed while `focused` has focus.
    pub fn key_down(&mut self, focused: &str, key: Key) -> Option<DragEnd> {
        match &mut self.session {
            Session::Idle => {
                if matches!(key, Key::Space | Key::Enter) {
                    if let Some(index) = self.items.iter().position(|id| id == focused) {
                        debug!("Keyboard drag started for {focused}");
                        self.session = Session::KeyboardDrag {
                            id: focused.to_string(),
                            over: index,
                        };
                    }
                }
                None
            }
            Session::KeyboardDrag { id, over } => match key {
                Key::ArrowLeft | Key::ArrowUp => {
                    *over = over.saturating_sub(1);
                    None
                }
                Key::ArrowRight | Key::ArrowDown => {
                    *over = (*over + 1).min(self.items.len().saturating_sub(1));
                    None
                }
                Key::Space | Key::Enter => {
                    let end = DragEnd {
                        active: std::mem::take(id),
                        over: self.items.get(*over).cloned(),
                    };
                    self.session = Session::Idle;
                    Some(end)
                }
                Key::Escape => {
                    debug!("Keyboard drag cancelled");
                    self.session = Session::Idle;
                    None
                }
                Key::Other => None,
            },
            Session::Pressed { .. } | Session::PointerDrag { .. } => None,
        }
    }
}
