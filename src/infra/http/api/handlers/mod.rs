//! API handlers organized by resource type.

mod cache;
mod meta;
mod records;

pub use cache::*;
pub use meta::*;
pub use records::*;
