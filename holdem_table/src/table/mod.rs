//! Table module wrapping the engine in an async actor.
//!
//! This module implements:
//! - TableActor: the single writer for one table, fed by an mpsc inbox
//! - EventSequencer: sequence numbers, replay buffer, and resync decisions
//! - TableRepository: pluggable sink for events and snapshots
//! - Table configuration
//!
//! ## Architecture
//!
//! Each table runs in its own Tokio task. Requests, action timeouts, and
//! reads are handled one at a time, so every read observes the latest
//! accepted mutation. Events fan out to subscribers without blocking and
//! are persisted from a separate task.
//!
//! ## Example
//!
//! ```ignore
//! use holdem_table::table::{InMemoryTableRepository, TableActor, TableConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TableConfig::default();
//!     let repository = Arc::new(InMemoryTableRepository::new(config.replay_capacity));
//!     let (actor, handle) = TableActor::new(1, config, repository);
//!
//!     tokio::spawn(actor.run());
//!
//!     // handle.sit_down(&player, "Alice", 0, 1000).await;
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;
pub mod repository;
pub mod sequencer;

pub use actor::{TableActor, TableClosed, TableHandle};
pub use config::{ConfigError, TableConfig, TableId};
pub use messages::{Resync, TableMessage, TableResponse};
pub use repository::{InMemoryTableRepository, RepositoryError, TableRepository};
pub use sequencer::{EventSequencer, Sequenced, TableSnapshot};
