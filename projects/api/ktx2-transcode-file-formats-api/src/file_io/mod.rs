//! Writing containers to disk.
//!
//! Output goes through a preallocated memory mapping using `lightweight-mmap`.

mod error;
pub use error::*;

mod lightweight_mmap_impl;
pub use lightweight_mmap_impl::*;
