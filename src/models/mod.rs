//! Data models for the catalog admin backend.

mod category;
mod job;

pub use category::*;
pub use job::*;
