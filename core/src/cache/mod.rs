pub mod key;
pub mod refresh;
pub mod traits;

pub use key::{param_hash, CacheKey};
pub use refresh::BackgroundTasks;
pub use traits::{CacheEntry, ResultCache};
