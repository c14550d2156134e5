//! Category persistence: id allocation, timestamps and the repository.

mod allocator;
mod repository;
mod timestamp;

pub use allocator::*;
pub use repository::*;
pub use timestamp::*;
