pub mod enrich;
pub mod key;
pub mod traits;

pub use enrich::TagEnricher;
pub use key::{tag_attribute, TagKey, BUGGED_TAG};
pub use traits::TagStore;
