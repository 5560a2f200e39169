pub mod cache;
pub mod clock;
pub mod key;
pub mod metrics;
pub mod pipeline;
pub mod projection;
pub mod sample;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use key::{Projection, ProjectionKey};
pub use pipeline::{FeedPipeline, FeedPipelineBuilder, PostBatch, RuleSet};
pub use projection::{filter_feed, preview_feed, score_feed, FeedPreview, PreviewStats};
pub use sample::{builtin_sample, load_sample};
pub use session::{FeedSession, FeedSnapshot};
