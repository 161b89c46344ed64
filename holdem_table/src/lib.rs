//! # Hold'em Table
//!
//! A single no-limit Texas Hold'em table: seats, hand lifecycle, betting
//! validation, side pots, showdown settlement, and an ordered, replayable
//! event feed so clients can rebuild table state after a disconnect.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, hand evaluation, legal actions, pots, and the
//!   [`TableEngine`] state machine
//! - [`table`]: the async [`TableActor`] that serializes every request,
//!   timer, and read for one table, plus event sequencing and persistence
//!
//! ## Example
//!
//! ```
//! use holdem_table::{GameSettings, TableEngine, entities::PlayerId};
//!
//! let mut engine = TableEngine::with_seed(GameSettings::default(), 42);
//! engine.sit_down(&PlayerId::new("alice"), "Alice", 0, 1000).unwrap();
//! engine.sit_down(&PlayerId::new("bob"), "Bob", 1, 1000).unwrap();
//! assert_eq!(engine.hand_id(), Some(1));
//! ```

/// Core game logic, entities, and the table state machine.
pub mod game;
pub use game::{
    GameSettings, TableEngine, UserError,
    constants::{self, MAX_SEATS},
    entities, events, functional, pots, rules,
};

/// Async table actor, event sequencing, and persistence sink.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle};
