pub mod backends;
pub mod router;
pub mod vfs;

pub use backends::{HttpStore, MemoryStore, CONNECTION_HEADER, PLACEHOLDER_COLLECTION};
pub use router::{Mount, Router};
pub use vfs::DocVfs;
