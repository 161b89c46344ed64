use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::{constants, pots::Pot};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

/// Suits in deck construction order.
pub const SUITS: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

/// A card is a tuple of a rank (2u8 ... ace=14u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn rank(&self) -> Value {
        self.0
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            13 => "K",
            12 => "Q",
            11 => "J",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// Hand categories, weakest first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// Strength of a best five-card hand. Ordering is lexicographic over the
/// category and then the tie-break values, so equal values mean a split.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandValue {
    pub rank: Rank,
    pub values: Vec<Value>,
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self
            .values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{} [{values}]", self.rank)
    }
}

/// Remaining cards of a hand. Cards are dealt from the back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A fresh deck shuffled by a reproducible generator: the same seed
    /// always yields the same card order.
    #[must_use]
    pub fn shuffled(seed: u64) -> Self {
        let mut deck = Self::default();
        let mut rng = StdRng::seed_from_u64(seed);
        deck.cards.shuffle(&mut rng);
        deck
    }

    /// # Panics
    ///
    /// Panics when the deck is exhausted. Table config validation caps the
    /// seat count so a hand can never deal more than 52 cards.
    pub fn deal_card(&mut self) -> Card {
        self.cards
            .pop()
            .expect("seat cap keeps every hand within one deck")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = Vec::with_capacity(52);
        for value in 2u8..=14 {
            for suit in SUITS {
                cards.push(Card(value, suit));
            }
        }
        Self { cards }
    }
}

/// Type alias for whole chips. Stacks, bets, and pots are all counted in
/// whole chips.
pub type Chips = u32;

/// Type alias for seat positions at the table.
pub type SeatIndex = usize;

/// Monotonic hand counter. The first hand dealt at a table is hand 1.
pub type HandId = u64;

/// Identity of a player or observer, as authenticated by the session layer.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        let mut id: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        id.truncate(constants::MAX_PLAYER_ID_LENGTH);
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folds",
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Bet => "bets",
            Self::Raise => "raises",
            Self::AllIn => "goes all-in",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// Empty, busted, or waiting for the next hand.
    #[default]
    Out,
    Active,
    Folded,
    /// Whole stack committed; no more decisions this hand.
    AllIn,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Out => "out",
            Self::Active => "active",
            Self::Folded => "folded",
            Self::AllIn => "all-in",
        };
        write!(f, "{repr:7}")
    }
}

/// Betting rounds, plus the post-river showdown.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    /// The street that follows this one and how many board cards it deals.
    #[must_use]
    pub const fn next(self) -> Option<(Self, usize)> {
        match self {
            Self::Preflop => Some((Self::Flop, 3)),
            Self::Flop => Some((Self::Turn, 1)),
            Self::Turn => Some((Self::River, 1)),
            Self::River | Self::Showdown => None,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "phase", content = "street", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TablePhase {
    #[default]
    WaitingForPlayers,
    InHand(Street),
    /// Results are out; the next hand starts after the cleanup delay.
    Cleanup,
}

impl TablePhase {
    #[must_use]
    pub const fn street(&self) -> Option<Street> {
        match self {
            Self::InHand(street) => Some(*street),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_hand_running(&self) -> bool {
        matches!(self, Self::InHand(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Seat {
    pub occupant: Option<PlayerId>,
    pub display_name: Option<String>,
    pub stack: Chips,
    pub status: SeatStatus,
    /// Chips committed on the current street.
    pub current_bet: Chips,
    pub street_contribution: Chips,
    /// Chips committed across the whole hand.
    pub total_contribution: Chips,
    pub(crate) hole_cards: Vec<Card>,
    pub acted_this_street: bool,
}

impl Seat {
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Occupied and still holding a claim on the pot.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_occupied() && matches!(self.status, SeatStatus::Active | SeatStatus::AllIn)
    }

    #[must_use]
    pub fn hole_cards(&self) -> &[Card] {
        &self.hole_cards
    }

    pub(crate) fn commit(&mut self, amount: Chips) {
        debug_assert!(amount <= self.stack, "committing more than the stack");
        self.stack -= amount;
        self.current_bet += amount;
        self.street_contribution += amount;
        self.total_contribution += amount;
        if self.stack == 0 && self.status == SeatStatus::Active {
            self.status = SeatStatus::AllIn;
        }
    }

    pub(crate) fn reset_street(&mut self) {
        self.current_bet = 0;
        self.street_contribution = 0;
        self.acted_this_street = self.status != SeatStatus::Active;
    }

    /// Clear per-hand state and derive the status from the stack.
    pub(crate) fn reset_hand(&mut self) {
        self.current_bet = 0;
        self.street_contribution = 0;
        self.total_contribution = 0;
        self.hole_cards.clear();
        self.acted_this_street = false;
        self.status = if self.is_occupied() && self.stack > 0 {
            SeatStatus::Active
        } else {
            SeatStatus::Out
        };
    }

    pub(crate) fn vacate(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub seat: SeatIndex,
    pub player_id: Option<PlayerId>,
    pub name: Option<String>,
    pub stack: Chips,
    pub status: SeatStatus,
    pub current_bet: Chips,
    pub street_contribution: Chips,
    pub total_contribution: Chips,
    /// Whether the seat holds cards, without revealing them.
    pub has_cards: bool,
}

impl SeatView {
    pub(crate) fn new(seat: SeatIndex, s: &Seat) -> Self {
        Self {
            seat,
            player_id: s.occupant.clone(),
            name: s.display_name.clone(),
            stack: s.stack,
            status: s.status,
            current_bet: s.current_bet,
            street_contribution: s.street_contribution,
            total_contribution: s.total_contribution,
            has_cards: !s.hole_cards.is_empty(),
        }
    }
}

/// The decision currently offered to the acting seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LegalActionView {
    pub seat: SeatIndex,
    pub options: Vec<ActionType>,
    pub min_raise_to: Chips,
    pub call_amount: Chips,
    pub pot: Chips,
    pub time_left_secs: u64,
}

/// Full table state as one viewer may see it. Only the viewer's own hole
/// cards are ever included.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableView {
    pub hand_id: Option<HandId>,
    pub button_seat: Option<SeatIndex>,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub phase: TablePhase,
    pub acting_seat: Option<SeatIndex>,
    pub board: Vec<Card>,
    pub seats: Vec<SeatView>,
    pub main_pot: Chips,
    pub side_pots: Vec<Pot>,
    pub legal_action: Option<LegalActionView>,
    pub hero_seat: Option<SeatIndex>,
    pub hero_hole_cards: Option<Vec<Card>>,
}
