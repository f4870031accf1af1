use std::sync::Arc;
use tracing::trace;

use crate::events::{Event, EventEmitter};
use crate::utils::{OverlayError, OverlayResult};

pub const CHANGE: &str = "change";
pub const DRAG_START: &str = "dragstart";
pub const DRAG_END: &str = "dragend";

/// Number of steps covered by PageUp/PageDown
const PAGE_STEPS: f64 = 10.0;

/// Capability interface shared by range controls (seek bars, volume).
pub trait ValueControl {
    fn value(&self) -> f64;
    fn min_value(&self) -> f64;
    fn max_value(&self) -> f64;

    /// Returns whether the value changed. Out-of-range values are rejected
    /// with [`OverlayError::RangeViolation`].
    fn set_value(&mut self, value: f64) -> OverlayResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderKey {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliderEvent {
    Change { value: f64 },
    DragStart,
    DragEnd { value: f64 },
}

impl Event for SliderEvent {
    fn event_name(&self) -> &str {
        match self {
            SliderEvent::Change { .. } => CHANGE,
            SliderEvent::DragStart => DRAG_START,
            SliderEvent::DragEnd { .. } => DRAG_END,
        }
    }
}

/// Maps pointer and keyboard input onto a bounded, stepped value.
///
/// Pointer positions are in pixels relative to the start of the track.
#[derive(Debug)]
pub struct SliderInput {
    min: f64,
    max: f64,
    step: f64,
    value: f64,
    track_width: f64,
    drag: DragState,
    events: Arc<EventEmitter<SliderEvent>>,
}

impl SliderInput {
    pub fn new(min: f64, max: f64, step: f64) -> OverlayResult<Self> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(OverlayError::Configuration(format!(
                "slider bounds [{}, {}] are not a valid range",
                min, max
            )));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(OverlayError::Configuration(format!(
                "slider step must be positive, got {}",
                step
            )));
        }

        Ok(Self {
            min,
            max,
            step,
            value: min,
            track_width: 0.0,
            drag: DragState::Idle,
            events: Arc::new(EventEmitter::new()),
        })
    }

    /// Listeners attach here, usually through an `EventHandler`
    pub fn events(&self) -> &Arc<EventEmitter<SliderEvent>> {
        &self.events
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn set_track_width(&mut self, width: f64) {
        self.track_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    /// Value a pointer at `x` maps to. A zero-width track maps everything to
    /// the minimum.
    pub fn value_at(&self, x: f64) -> f64 {
        if self.track_width <= 0.0 || !x.is_finite() {
            return self.min;
        }
        let ratio = (x / self.track_width).clamp(0.0, 1.0);
        self.snap(self.min + ratio * (self.max - self.min))
    }

    pub fn pointer_down(&mut self, x: f64) {
        if self.drag == DragState::Idle {
            self.drag = DragState::Dragging;
            self.events.emit(&SliderEvent::DragStart);
        }
        self.update(self.value_at(x));
    }

    pub fn pointer_move(&mut self, x: f64) {
        if self.drag == DragState::Dragging {
            self.update(self.value_at(x));
        }
    }

    pub fn pointer_up(&mut self, x: f64) {
        if self.drag != DragState::Dragging {
            return;
        }
        self.update(self.value_at(x));
        self.drag = DragState::Idle;
        self.events.emit(&SliderEvent::DragEnd { value: self.value });
    }

    /// Returns whether the key changed the value
    pub fn key_press(&mut self, key: SliderKey) -> bool {
        let target = match key {
            SliderKey::Left | SliderKey::Down => self.value - self.step,
            SliderKey::Right | SliderKey::Up => self.value + self.step,
            SliderKey::PageDown => self.value - self.step * PAGE_STEPS,
            SliderKey::PageUp => self.value + self.step * PAGE_STEPS,
            SliderKey::Home => self.min,
            SliderKey::End => self.max,
        };
        self.update(self.snap(target))
    }

    fn snap(&self, value: f64) -> f64 {
        let steps = ((value - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    fn update(&mut self, value: f64) -> bool {
        if value == self.value {
            return false;
        }
        trace!("Slider value {} -> {}", self.value, value);
        self.value = value;
        self.events.emit(&SliderEvent::Change { value });
        true
    }
}

impl ValueControl for SliderInput {
    fn value(&self) -> f64 {
        self.value
    }

    fn min_value(&self) -> f64 {
        self.min
    }

    fn max_value(&self) -> f64 {
        self.max
    }

    fn set_value(&mut self, value: f64) -> OverlayResult<bool> {
        if !(value >= self.min && value <= self.max) {
            return Err(OverlayError::RangeViolation {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(self.update(value))
    }
}
