//! Knowledge store implementations.

pub mod memory;

pub use memory::{calculate_hash, KnowledgeEntry, MemoryKnowledgeStore};
