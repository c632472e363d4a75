//! Stroke synchronization through the remote store.
//!
//! | Module | Direction |
//! |--------|-----------|
//! | [`store`] | The store seam and the in-memory store |
//! | [`writer`] | Ordered background writes |
//! | [`publisher`] | Outbound: create, rate-limited growth, clears, undo plans |
//! | [`listener`] | Inbound: subscription to merged collections |

pub mod listener;
pub mod publisher;
pub mod store;
pub mod writer;

pub use listener::spawn_listener;
pub use publisher::SyncPublisher;
pub use store::{MemoryStore, RemoteStore, StoreError, Subscription, room_lines_path};
pub use writer::{StoreWriter, WriteOp, spawn_writer};
