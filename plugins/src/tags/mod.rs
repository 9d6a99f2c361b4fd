pub mod file;
pub mod memory;

pub use file::FileTagStore;
pub use memory::MemoryTagStore;
