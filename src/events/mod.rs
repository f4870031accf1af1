pub mod emitter;
pub mod handler;
pub mod player;

pub use emitter::{Event, EventEmitter, EventSource, ListenOptions, Listener, ListenerId};
pub use handler::EventHandler;
pub use player::{NextVideoRequest, PlayerEvent};
