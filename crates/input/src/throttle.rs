//! Rate limiting of touch input
//!
//! Drag events arrive faster than the display refreshes. Each layout pass they
//! trigger is costly, so move events closer together than one frame are
//! coalesced: the throttle admits at most one move per interval and holds back
//! the latest of the rest. Other events always pass. A pointer lifting first
//! flushes the held move, so a gesture always ends where the fingers were.

use std::time::Duration;

use crate::event::{InputEvent, TouchAction};

/// One frame at 60 Hz (16.67ms)
pub const INPUT_INTERVAL_60HZ: Duration = Duration::from_micros(16_667);

/// Non-blocking input throttle
#[derive(Debug, Clone)]
pub struct InputThrottle {
    interval: Duration,

    /// Time of the last admitted move
    last_move_ms: Option<u64>,

    /// Latest move dropped since the last admitted one
    pending: Option<InputEvent>,

    /// Moves dropped since creation
    coalesced: u64,
}

impl Default for InputThrottle {
    fn default() -> Self {
        Self::new(INPUT_INTERVAL_60HZ)
    }
}

impl InputThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_move_ms: None,
            pending: None,
            coalesced: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Returns true if the event should be processed
    pub fn admit(&mut self, event: &InputEvent) -> bool {
        if event.action != TouchAction::Move {
            if matches!(event.action, TouchAction::Down | TouchAction::Cancel) {
                self.last_move_ms = None;
                self.pending = None;
            }
            return true;
        }

        if let Some(last) = self.last_move_ms {
            let elapsed = Duration::from_millis(event.time_ms.saturating_sub(last));
            if elapsed < self.interval {
                self.coalesced += 1;
                self.pending = Some(event.clone());
                return false;
            }
        }
        self.last_move_ms = Some(event.time_ms);
        self.pending = None;
        true
    }

    /// Move held back by the throttle that must run before `event`
    ///
    /// A pointer lifting ends the positions it reported; the last of them has to
    /// be processed first or the gesture ends one frame short.
    pub fn flush_before(&mut self, event: &InputEvent) -> Option<InputEvent> {
        if !matches!(event.action, TouchAction::PointerUp | TouchAction::Up) {
            return None;
        }
        let pending = self.pending.take()?;
        self.last_move_ms = Some(pending.time_ms);
        Some(pending)
    }
}
