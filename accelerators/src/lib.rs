//! Accelerators

#[macro_use]
extern crate log;

mod index_bvh;
mod octree;

// Re-export
pub use index_bvh::*;
pub use octree::*;
