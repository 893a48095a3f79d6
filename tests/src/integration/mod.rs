//! Cross-crate flows driven through the task queue.

pub mod delivery;
pub mod failures;
