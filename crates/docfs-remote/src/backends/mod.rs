pub mod http;
pub mod memory;

pub use http::{HttpStore, CONNECTION_HEADER};
pub use memory::{MemoryStore, PLACEHOLDER_COLLECTION};
