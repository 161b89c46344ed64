//! Table-wide limits.

use super::entities::Chips;

/// Most seats a single deck supports: 23 players * 2 hole cards + 5 board
/// cards + 1 spare.
pub const MAX_SEATS: usize = 23;

pub const DEFAULT_MAX_SEATS: usize = 9;

pub const DEFAULT_SMALL_BLIND: Chips = 50;

pub const DEFAULT_BIG_BLIND: Chips = 100;

/// Largest single buy-in; with every seat at this cap the table total still
/// fits in [`Chips`].
pub const DEFAULT_MAX_BUY_IN: Chips = 1_000_000;

pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_CLEANUP_DELAY_MS: u64 = 1000;

pub const MAX_PLAYER_ID_LENGTH: usize = 32;
