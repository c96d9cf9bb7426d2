//! Vector index backends.
//!
//! LanceDB is the persistent backend; the in-memory index serves ephemeral
//! runs. Both keep one index per embedding dimension.

pub mod index;
pub mod lance;
pub mod memory;
pub mod schema;

pub use index::LanceVectorIndex;
pub use lance::LanceVectorStore;
pub use memory::InMemoryVectorIndex;
