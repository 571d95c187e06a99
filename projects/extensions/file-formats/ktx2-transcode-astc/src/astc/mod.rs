//! Reading and writing of single-image `.astc` files.

pub mod constants;
mod parse_astc;
mod write_astc;

pub use constants::{ASTC_BLOCK_SIZE, ASTC_HEADER_SIZE, ASTC_MAGIC, MAX_IMAGE_DIM};
pub use parse_astc::*;
pub use write_astc::*;
