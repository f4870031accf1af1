pub mod identifiers;
pub mod media;
pub mod player_config;

pub use identifiers::{EncodeId, MediaId};
pub use media::{Media, MediaMetadata, StreamInfo, Subtitle};
pub use player_config::{NextVideoDescriptor, PlayerConfig, VideoDuration};
