//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, in-memory natively)
//! - Pointer/touch input mapping
//! - Haptics

pub mod haptics;
pub mod input;
pub mod storage;

pub use haptics::vibrate;
pub use input::{drag_target, in_hold_band, normalized_pointer};
pub use storage::{KeyValueStore, MemoryStorage, StorageError, open_default_store};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
