//! File system helpers shared by the installer, backup and metadata code.
//!
//! - [`atomic`]: temp-file-and-rename writes for records that must never be
//!   observed half-written.
//! - [`dirs`]: directory creation, recursive copy, move with copy fallback,
//!   and tolerant removal.

pub mod atomic;
pub mod dirs;

pub use atomic::{atomic_write, set_private_permissions};
pub use dirs::{copy_dir, ensure_dir, move_path, remove_dir_if_empty, remove_path};
