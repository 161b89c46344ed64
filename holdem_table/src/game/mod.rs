//! Poker rules and the single-table state machine.
//!
//! - `entities`: cards, seeded deck, seats, and client-facing views
//! - `functional`: seven-card hand evaluation
//! - `rules`: legal-action calculation
//! - `pots`: main and side pot layering
//! - `events`: outbound table events
//! - `engine`: the table state machine driving hands end to end

pub mod constants;
pub mod engine;
pub mod entities;
pub mod events;
pub mod functional;
pub mod pots;
pub mod rules;

pub use engine::{GameSettings, TableEngine, UserError, Wakeup, WakeupKind};
