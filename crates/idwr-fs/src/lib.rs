//! Filesystem primitives that never expose half-written state.
//!
//! - [`atomic_write`] writes through a temporary sibling and renames it.
//! - [`StagedFile`] reserves a sibling path for streaming writes and removes it
//!   unless committed.
//! - [`ensure_dir`] / [`remove_dir_all_if_exists`] are idempotent directory helpers.

mod dir;
mod error;
mod staged;
mod write;

pub use dir::{ensure_dir, remove_dir_all_if_exists};
pub use error::{Error, Result};
pub use staged::StagedFile;
pub use write::{AtomicWriteOptions, atomic_write};
