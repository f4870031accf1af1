pub mod fragment;
pub mod progress_reporter;
pub mod traits;

pub use fragment::{HttpFragmentFetcher, load_next_video, parse_next_video};
pub use progress_reporter::{DEFAULT_REQUEST_TAG, HttpProgressReporter, ProgressReport};
pub use traits::{
    ErrorReporter, FragmentFetcher, LayoutMode, MediaResolver, PageAccessor, ProgressReporter,
    QualityPreference, ResolveOptions, TracingErrorReporter,
};
