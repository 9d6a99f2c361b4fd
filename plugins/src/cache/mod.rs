pub mod fs;
pub mod memory;

pub use fs::FsResultCache;
pub use memory::MemoryResultCache;
