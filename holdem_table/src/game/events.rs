//! Outbound table events and how they are addressed.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::{
    entities::{ActionType, Card, Chips, HandId, PlayerId, SeatIndex, Street},
    pots::Pot,
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Reveal {
    pub seat: SeatIndex,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PotAward {
    pub pot_index: usize,
    pub amount: Chips,
    pub winners: Vec<SeatIndex>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableEvent {
    PlayerJoin {
        player_id: PlayerId,
        name: String,
    },
    PlayerLeave {
        player_id: PlayerId,
    },
    PlayerSit {
        seat: SeatIndex,
        player_id: PlayerId,
        name: String,
        buy_in: Chips,
    },
    PlayerStand {
        seat: SeatIndex,
        player_id: PlayerId,
    },
    HandStart {
        hand_id: HandId,
        button_seat: SeatIndex,
        small_blind_seat: SeatIndex,
        big_blind_seat: SeatIndex,
        small_blind: Chips,
        big_blind: Chips,
    },
    /// Only ever delivered to the seat's owner.
    DealHole {
        hand_id: HandId,
        seat: SeatIndex,
        cards: Vec<Card>,
    },
    StreetStart {
        hand_id: HandId,
        street: Street,
    },
    /// The whole board so far, not just the new cards.
    BoardReveal {
        hand_id: HandId,
        cards: Vec<Card>,
    },
    ActionAvailable {
        hand_id: HandId,
        seat: SeatIndex,
        options: Vec<ActionType>,
        min_raise_to: Chips,
        call_amount: Chips,
        pot: Chips,
        time_left_secs: u64,
    },
    PlayerAction {
        hand_id: HandId,
        seat: SeatIndex,
        action: ActionType,
        /// Chips moved from the stack into the pot by this action.
        amount: Chips,
        to_call: Chips,
        pot_after: Chips,
    },
    PotsUpdate {
        hand_id: HandId,
        main_pot: Chips,
        side_pots: Vec<Pot>,
    },
    Showdown {
        hand_id: HandId,
        reveals: Vec<Reveal>,
        winners_by_pot: Vec<PotAward>,
    },
    HandEnd {
        hand_id: HandId,
        /// Chips won per winning seat.
        deltas: BTreeMap<SeatIndex, Chips>,
        /// Stack of every occupied seat after settlement.
        stacks: BTreeMap<SeatIndex, Chips>,
    },
}

impl TableEvent {
    #[must_use]
    pub fn hand_id(&self) -> Option<HandId> {
        match self {
            Self::PlayerJoin { .. }
            | Self::PlayerLeave { .. }
            | Self::PlayerSit { .. }
            | Self::PlayerStand { .. } => None,
            Self::HandStart { hand_id, .. }
            | Self::DealHole { hand_id, .. }
            | Self::StreetStart { hand_id, .. }
            | Self::BoardReveal { hand_id, .. }
            | Self::ActionAvailable { hand_id, .. }
            | Self::PlayerAction { hand_id, .. }
            | Self::PotsUpdate { hand_id, .. }
            | Self::Showdown { hand_id, .. }
            | Self::HandEnd { hand_id, .. } => Some(*hand_id),
        }
    }
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerJoin { player_id, .. } => write!(f, "{player_id} joined the table"),
            Self::PlayerLeave { player_id } => write!(f, "{player_id} left the table"),
            Self::PlayerSit {
                seat,
                player_id,
                buy_in,
                ..
            } => write!(f, "{player_id} sat down at seat {seat} with {buy_in}"),
            Self::PlayerStand { seat, player_id } => {
                write!(f, "{player_id} stood up from seat {seat}")
            }
            Self::HandStart {
                hand_id,
                button_seat,
                small_blind,
                big_blind,
                ..
            } => write!(
                f,
                "hand #{hand_id} started, button at seat {button_seat}, blinds {small_blind}/{big_blind}"
            ),
            Self::DealHole { seat, cards, .. } => {
                write!(f, "seat {seat} was dealt {}", join_cards(cards))
            }
            Self::StreetStart { street, .. } => write!(f, "{street}"),
            Self::BoardReveal { cards, .. } => write!(f, "board: {}", join_cards(cards)),
            Self::ActionAvailable {
                seat, call_amount, ..
            } => write!(f, "seat {seat} to act, {call_amount} to call"),
            Self::PlayerAction {
                seat,
                action,
                amount,
                ..
            } => match action {
                ActionType::Fold | ActionType::Check => write!(f, "seat {seat} {action}"),
                _ => write!(f, "seat {seat} {action} {amount}"),
            },
            Self::PotsUpdate {
                main_pot,
                side_pots,
                ..
            } => write!(f, "main pot {main_pot}, {} side pot(s)", side_pots.len()),
            Self::Showdown { winners_by_pot, .. } => {
                let awards = winners_by_pot
                    .iter()
                    .map(|award| format!("pot {}: {} to {:?}", award.pot_index, award.amount, award.winners))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "showdown, {awards}")
            }
            Self::HandEnd { hand_id, .. } => write!(f, "hand #{hand_id} ended"),
        }
    }
}

/// Who an event is addressed to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "to", content = "player_id", rename_all = "snake_case")]
pub enum Delivery {
    Broadcast,
    Private(PlayerId),
}

impl Delivery {
    /// Whether `viewer` may see an event with this delivery.
    #[must_use]
    pub fn is_visible_to(&self, viewer: Option<&PlayerId>) -> bool {
        match self {
            Self::Broadcast => true,
            Self::Private(owner) => viewer == Some(owner),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub delivery: Delivery,
    pub event: TableEvent,
}

impl Notification {
    #[must_use]
    pub fn broadcast(event: TableEvent) -> Self {
        Self {
            delivery: Delivery::Broadcast,
            event,
        }
    }

    #[must_use]
    pub fn private(to: PlayerId, event: TableEvent) -> Self {
        Self {
            delivery: Delivery::Private(to),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = TableEvent::StreetStart {
            hand_id: 3,
            street: Street::Flop,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "STREET_START");
        assert_eq!(json["street"], "FLOP");
        assert_eq!(json["hand_id"], 3);
    }

    #[test]
    fn test_action_type_serializes_screaming() {
        let event = TableEvent::PlayerAction {
            hand_id: 1,
            seat: 2,
            action: ActionType::AllIn,
            amount: 500,
            to_call: 0,
            pot_after: 650,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PLAYER_ACTION");
        assert_eq!(json["action"], "ALL_IN");
    }

    #[test]
    fn test_event_json_round_trip() {
        let event = TableEvent::DealHole {
            hand_id: 9,
            seat: 1,
            cards: vec![Card(14, Suit::Spade), Card(2, Suit::Heart)],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TableEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_private_delivery_visibility() {
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        let private = Delivery::Private(alice.clone());
        assert!(private.is_visible_to(Some(&alice)));
        assert!(!private.is_visible_to(Some(&bob)));
        assert!(!private.is_visible_to(None));
        assert!(Delivery::Broadcast.is_visible_to(None));
    }

    #[test]
    fn test_hand_id_accessor() {
        let join = TableEvent::PlayerJoin {
            player_id: PlayerId::new("a"),
            name: "a".to_string(),
        };
        assert_eq!(join.hand_id(), None);
        let end = TableEvent::HandEnd {
            hand_id: 4,
            deltas: BTreeMap::new(),
            stacks: BTreeMap::new(),
        };
        assert_eq!(end.hand_id(), Some(4));
    }

    #[test]
    fn test_display_player_action() {
        let event = TableEvent::PlayerAction {
            hand_id: 1,
            seat: 0,
            action: ActionType::Raise,
            amount: 300,
            to_call: 100,
            pot_after: 450,
        };
        assert_eq!(event.to_string(), "seat 0 raises 300");
    }
}
