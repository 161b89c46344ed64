//! Table actor message types.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use super::sequencer::{Sequenced, TableSnapshot};
use crate::game::{
    UserError,
    entities::{ActionType, Chips, HandId, PlayerId, SeatIndex},
    events::TableEvent,
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Take a seat with a buy-in
    SitDown {
        player_id: PlayerId,
        name: String,
        seat: SeatIndex,
        buy_in: Chips,
        response: oneshot::Sender<TableResponse>,
    },

    /// Leave the seat, folding any live hand
    StandUp {
        player_id: PlayerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Player action (fold, check, call, bet, raise, all-in)
    TakeAction {
        player_id: PlayerId,
        hand_id: HandId,
        action: ActionType,
        amount: Option<Chips>,
        response: oneshot::Sender<TableResponse>,
    },

    /// Catch up after a disconnect
    Resync {
        player_id: Option<PlayerId>,
        last_seq: u64,
        response: oneshot::Sender<Resync>,
    },

    /// Current state as seen by `player_id`
    GetSnapshot {
        player_id: Option<PlayerId>,
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Start receiving sequenced events addressed to this player
    Subscribe {
        player_id: PlayerId,
        name: String,
        sender: mpsc::Sender<Sequenced<TableEvent>>,
    },

    /// Stop receiving events
    Unsubscribe { player_id: PlayerId },

    /// Stop the actor
    Close {
        response: oneshot::Sender<TableResponse>,
    },
}

/// Response from table operations
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Request turned away without touching the table
    Rejected(UserError),

    /// The actor has shut down
    TableClosed,
}

impl TableResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, TableResponse::Success)
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Success => None,
            TableResponse::Rejected(error) => Some(error.to_string()),
            TableResponse::TableClosed => Some("Table is closed".to_string()),
        }
    }
}

impl From<Result<(), UserError>> for TableResponse {
    fn from(result: Result<(), UserError>) -> Self {
        match result {
            Ok(()) => TableResponse::Success,
            Err(error) => TableResponse::Rejected(error),
        }
    }
}

/// What a reconnecting client receives.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Resync {
    /// Every missed event the client may see, in order
    Replay(Vec<Sequenced<TableEvent>>),
    /// Full state; the client discards what it had
    Snapshot(TableSnapshot),
}
