pub mod backend;
pub mod shortcuts;

pub use backend::{JsonFileStore, KeyValueStore, MemoryStore};
pub use shortcuts::{ShortcutStore, DEFAULT_SHORTCUTS, SHORTCUTS_KEY};
