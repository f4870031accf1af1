pub mod slider;

pub use slider::{DragState, SliderEvent, SliderInput, SliderKey, ValueControl};
