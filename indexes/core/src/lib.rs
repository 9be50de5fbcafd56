pub mod api;
pub mod errors;
pub mod memory;

pub use api::{DynIndexer, IndexerApi};
pub use errors::{IndexError, IndexResult};
pub use memory::MemoryIndexer;

pub const IDENT: &str = "Indexer";
