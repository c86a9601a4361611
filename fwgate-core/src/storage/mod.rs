//! Storage modules for Fwgate
//!
//! In-memory update channels and the deferred DFU table.

pub mod channel_store;
pub mod pending_store;

pub use channel_store::ChannelStore;
pub use pending_store::PendingDfuStore;
