//! Utility modules.

pub mod fs;

pub use fs::{atomic_write, copy_dir, ensure_dir, move_path, remove_path};
