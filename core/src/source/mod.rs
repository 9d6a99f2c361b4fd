pub mod job;
pub mod query;
pub mod traits;
pub mod types;

pub use job::{JobRunner, JobState};
pub use query::{LogQuery, LogRows};
pub use traits::{FrameLogSource, JobId, JobStatus};
pub use types::*;
