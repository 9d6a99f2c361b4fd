pub mod encode;
pub mod matcher;
pub mod types;

pub use encode::{encode_runs, group_entity_logs, EntityLog};
pub use matcher::{candidate_chains, covers_vocabulary_frames, SequenceMatcher};
pub use types::{Chain, Run, SequenceSpec, SequenceStep};
