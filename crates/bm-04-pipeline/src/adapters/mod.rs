//! Port implementations: in-memory store and relay, relay fail-over, signals

pub mod memory_relay;
pub mod memory_store;
pub mod relay_pool;
pub mod signals;

pub use memory_relay::MemoryRelay;
pub use memory_store::InMemoryRepository;
pub use relay_pool::{RelayPool, ServerRotation};
pub use signals::{CountingNotifier, LogNotifier, StaticConnectivity};
