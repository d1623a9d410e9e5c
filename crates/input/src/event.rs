//! Raw touch input delivered by the host platform

/// Phase of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchAction {
    /// First pointer touched down
    Down,
    /// One or more pointers moved
    Move,
    /// Last pointer lifted
    Up,
    /// Gesture aborted by the platform
    Cancel,
    /// An additional pointer touched down
    PointerDown,
    /// A non-last pointer lifted
    PointerUp,
}

/// One touching pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    pub fn distance_to(&self, other: &Pointer) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A touch event with every pointer touching at the time of the event
///
/// For `Up` and `PointerUp` the lifting pointer is still listed.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub action: TouchAction,
    pub pointers: Vec<Pointer>,

    /// Event time in milliseconds on a monotonic clock
    pub time_ms: u64,
}

impl InputEvent {
    pub fn new(action: TouchAction, pointers: Vec<Pointer>, time_ms: u64) -> Self {
        Self {
            action,
            pointers,
            time_ms,
        }
    }

    /// Single-pointer event
    pub fn single(action: TouchAction, x: f32, y: f32, time_ms: u64) -> Self {
        Self::new(action, vec![Pointer::new(0, x, y)], time_ms)
    }

    /// Position of the primary pointer
    pub fn position(&self) -> Option<(f32, f32)> {
        self.pointers.first().map(|p| (p.x, p.y))
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Distance between the first two pointers, if there are two
    pub fn span(&self) -> Option<f32> {
        match self.pointers.as_slice() {
            [a, b, ..] => Some(a.distance_to(b)),
            _ => None,
        }
    }
}

/// Hardware keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    DpadUp,
    DpadDown,
    VolumeUp,
    VolumeDown,
    /// Any other key, by platform key code
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Down,
    Up,
}

/// A key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Down,
        }
    }

    pub fn up(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Up,
        }
    }
}
