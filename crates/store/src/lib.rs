pub mod memory;
pub mod store;
pub mod testing;

pub use memory::MemoryContentStore;
pub use store::ContentStore;
