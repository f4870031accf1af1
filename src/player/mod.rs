pub mod orchestrator;
pub mod progress_tracker;
pub mod traits;


pub use orchestrator::{
    OrchestratorHandle, OrchestratorOptions, OrchestratorSnapshot, PlaybackOrchestrator, Services,
    TransitionState,
};
pub use progress_tracker::{ProgressTracker, TrackerSettings};
pub use traits::{PlaybackState, VideoPlayer};
