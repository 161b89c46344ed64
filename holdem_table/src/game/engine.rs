//! The table state machine: seats, hand lifecycle, betting, and settlement.
//!
//! All mutation goes through [`TableEngine`]. Requests are validated in full
//! before anything changes, so a rejected request leaves no trace. Accepted
//! mutations queue [`Notification`]s that the owner drains and sequences.
//!
//! Time is never read here. Instead the engine exposes at most one pending
//! [`Wakeup`] (an action timeout or the delay before the next hand) that the
//! owner schedules and hands back through [`TableEngine::fire_wakeup`].

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    time::Duration,
};
use thiserror::Error;

use super::{
    constants::{
        DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_CLEANUP_DELAY_MS,
        DEFAULT_MAX_BUY_IN, DEFAULT_MAX_SEATS, DEFAULT_SMALL_BLIND,
    },
    entities::{
        ActionType, Card, Chips, Deck, HandId, LegalActionView, PlayerId, Seat, SeatIndex,
        SeatStatus, SeatView, Street, TablePhase, TableView,
    },
    events::{Notification, PotAward, Reveal, TableEvent},
    functional::{argmax, evaluate},
    pots::{Pot, build_pots, split_pot},
    rules::{LegalOptions, legal_options},
};

/// Reasons a request is turned away. A rejected request never mutates the
/// table.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("invalid seat {0}")]
    InvalidSeat(SeatIndex),
    #[error("already seated")]
    AlreadySeated,
    #[error("seat occupied")]
    SeatOccupied,
    #[error("invalid buy-in")]
    InvalidBuyIn,
    #[error("not seated")]
    NotSeated,
    #[error("hand mismatch")]
    HandMismatch,
    #[error("not your turn")]
    OutOfTurn,
    #[error("seat not active")]
    SeatNotActive,
    #[error("illegal action")]
    IllegalAction,
    #[error("amount required")]
    AmountRequired,
    #[error("raise below minimum of {min}")]
    BelowMinimum { min: Chips },
    #[error("insufficient stack")]
    InsufficientStack,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_seats: usize,
    pub max_buy_in: Chips,
    pub action_timeout: Duration,
    pub cleanup_delay: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            max_seats: DEFAULT_MAX_SEATS,
            max_buy_in: DEFAULT_MAX_BUY_IN,
            action_timeout: Duration::from_secs(DEFAULT_ACTION_TIMEOUT_SECS),
            cleanup_delay: Duration::from_millis(DEFAULT_CLEANUP_DELAY_MS),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WakeupKind {
    /// Auto-act for `seat` if it is still its turn in `hand_id`.
    ActionTimeout { hand_id: HandId, seat: SeatIndex },
    /// Try to deal the next hand.
    NextHand,
}

/// A scheduled callback. Every arm gets a fresh token, so firing a token
/// that has since been replaced or cancelled does nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Wakeup {
    pub token: u64,
    pub kind: WakeupKind,
    pub delay: Duration,
}

#[derive(Debug)]
pub struct TableEngine {
    settings: GameSettings,
    seats: Vec<Seat>,
    button_seat: Option<SeatIndex>,
    hand_id: Option<HandId>,
    phase: TablePhase,
    board: Vec<Card>,
    deck: Deck,
    current_bet: Chips,
    min_raise: Chips,
    acting_seat: Option<SeatIndex>,
    /// Contributions of seats vacated mid-hand. The chips stay in the pot.
    forfeited: BTreeMap<SeatIndex, Chips>,
    wakeup: Option<Wakeup>,
    next_token: u64,
    seed_base: u64,
    seed_counter: u64,
    /// Chips owned by seated players, including whatever they have in the
    /// pot. Only buy-ins and departures change it.
    chips_in_play: u64,
    notifications: VecDeque<Notification>,
}

impl TableEngine {
    /// Deck seeds derive from the current time plus a per-hand counter.
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        let now = chrono::Utc::now().timestamp_millis().unsigned_abs();
        Self::with_seed(settings, now)
    }

    /// Pin the seed sequence: hand `n` is shuffled with `seed + n`.
    #[must_use]
    pub fn with_seed(settings: GameSettings, seed: u64) -> Self {
        Self {
            seats: vec![Seat::default(); settings.max_seats],
            button_seat: None,
            hand_id: None,
            phase: TablePhase::WaitingForPlayers,
            board: Vec::with_capacity(5),
            deck: Deck::default(),
            current_bet: 0,
            min_raise: settings.big_blind,
            acting_seat: None,
            forfeited: BTreeMap::new(),
            wakeup: None,
            next_token: 1,
            seed_base: seed,
            seed_counter: 0,
            chips_in_play: 0,
            notifications: VecDeque::new(),
            settings,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> TablePhase {
        self.phase
    }

    /// Id of the running hand, or of the last one dealt.
    #[must_use]
    pub fn hand_id(&self) -> Option<HandId> {
        self.hand_id
    }

    #[must_use]
    pub fn button_seat(&self) -> Option<SeatIndex> {
        self.button_seat
    }

    #[must_use]
    pub fn acting_seat(&self) -> Option<SeatIndex> {
        self.acting_seat
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    #[must_use]
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    #[must_use]
    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    #[must_use]
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }

    #[must_use]
    pub fn wakeup(&self) -> Option<&Wakeup> {
        self.wakeup.as_ref()
    }

    #[must_use]
    pub fn seat_of(&self, player: &PlayerId) -> Option<SeatIndex> {
        self.seats
            .iter()
            .position(|s| s.occupant.as_ref() == Some(player))
    }

    /// Every chip committed this hand, including forfeited ones.
    #[must_use]
    pub fn total_pot(&self) -> Chips {
        self.seats.iter().map(|s| s.total_contribution).sum::<Chips>()
            + self.forfeited.values().sum::<Chips>()
    }

    /// Chips currently at the table: stacks plus everything in the pot.
    #[must_use]
    pub fn chips_on_table(&self) -> u64 {
        self.seats.iter().map(|s| u64::from(s.stack)).sum::<u64>() + u64::from(self.total_pot())
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    // === Seat Management ===

    pub fn sit_down(
        &mut self,
        player: &PlayerId,
        name: &str,
        seat: SeatIndex,
        buy_in: Chips,
    ) -> Result<(), UserError> {
        if seat >= self.seats.len() {
            return Err(UserError::InvalidSeat(seat));
        }
        if self.seat_of(player).is_some() {
            return Err(UserError::AlreadySeated);
        }
        if self.seats[seat].is_occupied() {
            return Err(UserError::SeatOccupied);
        }
        // Every table total (pots, stacks, bet targets) must fit in `Chips`.
        if buy_in == 0
            || buy_in > self.settings.max_buy_in
            || self.chips_in_play + u64::from(buy_in) > u64::from(Chips::MAX)
        {
            return Err(UserError::InvalidBuyIn);
        }

        let s = &mut self.seats[seat];
        s.occupant = Some(player.clone());
        s.display_name = Some(name.to_string());
        s.stack = buy_in;
        // Players joining mid-hand wait for the next deal.
        s.status = if self.phase.is_hand_running() {
            SeatStatus::Out
        } else {
            SeatStatus::Active
        };
        self.chips_in_play += u64::from(buy_in);
        info!("{player} sat down at seat {seat} with {buy_in}");
        self.broadcast(TableEvent::PlayerSit {
            seat,
            player_id: player.clone(),
            name: name.to_string(),
            buy_in,
        });

        if self.phase == TablePhase::WaitingForPlayers {
            self.try_start_hand();
        }
        self.debug_check_chips();
        Ok(())
    }

    pub fn stand_up(&mut self, player: &PlayerId) -> Result<(), UserError> {
        let seat = self.seat_of(player).ok_or(UserError::NotSeated)?;
        let hand_running = self.phase.is_hand_running();
        let was_live = self.seats[seat].is_live();
        let was_acting = self.acting_seat == Some(seat);
        let contribution = self.seats[seat].total_contribution;
        let to_call = self.current_bet.saturating_sub(self.seats[seat].current_bet);

        if hand_running && contribution > 0 {
            *self.forfeited.entry(seat).or_default() += contribution;
        }
        self.chips_in_play -= u64::from(self.seats[seat].stack);
        self.seats[seat].vacate();
        info!("{player} stood up from seat {seat}");

        let hand_id = self.hand_id.unwrap_or_default();
        if hand_running && was_live {
            self.broadcast(TableEvent::PlayerAction {
                hand_id,
                seat,
                action: ActionType::Fold,
                amount: 0,
                to_call,
                pot_after: self.total_pot(),
            });
        }
        self.broadcast(TableEvent::PlayerStand {
            seat,
            player_id: player.clone(),
        });

        if hand_running && was_live {
            if was_acting {
                self.cancel_wakeup();
                self.acting_seat = None;
            }
            self.broadcast_pots();
            self.advance(seat);
        }
        self.debug_check_chips();
        Ok(())
    }

    // === Betting ===

    /// The legal options for `seat` as things stand. A seat pushed back into
    /// the action by an all-in short of a full raise may not reraise.
    #[must_use]
    pub fn legal_options_for(&self, seat: SeatIndex) -> LegalOptions {
        let s = &self.seats[seat];
        let legal = legal_options(s.stack, s.current_bet, self.current_bet, self.min_raise);
        if s.acted_this_street && s.current_bet < self.current_bet {
            legal.without_reraise(s.stack)
        } else {
            legal
        }
    }

    pub fn request_action(
        &mut self,
        player: &PlayerId,
        hand_id: HandId,
        action: ActionType,
        amount: Option<Chips>,
    ) -> Result<(), UserError> {
        if !self.phase.is_hand_running() || self.hand_id != Some(hand_id) {
            return Err(UserError::HandMismatch);
        }
        let seat = self.seat_of(player).ok_or(UserError::NotSeated)?;
        if self.acting_seat != Some(seat) {
            return Err(UserError::OutOfTurn);
        }
        if self.seats[seat].status != SeatStatus::Active {
            return Err(UserError::SeatNotActive);
        }
        let legal = self.legal_options_for(seat);
        if !legal.allows(action) {
            return Err(UserError::IllegalAction);
        }

        let s = &self.seats[seat];
        let to_call = self.current_bet.saturating_sub(s.current_bet);
        // Chips to move and the street total they reach.
        let (put, target) = match action {
            ActionType::Fold | ActionType::Check => (0, s.current_bet),
            ActionType::Call => (legal.call_amount, s.current_bet + legal.call_amount),
            ActionType::AllIn => (s.stack, s.current_bet + s.stack),
            ActionType::Bet | ActionType::Raise => {
                let amount = amount.ok_or(UserError::AmountRequired)?;
                let all_in_target = s.current_bet + s.stack;
                let min_target = if action == ActionType::Bet {
                    self.min_raise
                } else {
                    legal.min_raise_to
                };
                if amount < min_target && amount != all_in_target {
                    return Err(UserError::BelowMinimum { min: min_target });
                }
                let target = amount.max(self.current_bet);
                let need = target - s.current_bet;
                if need > s.stack {
                    return Err(UserError::InsufficientStack);
                }
                (need, target)
            }
        };

        self.cancel_wakeup();
        let s = &mut self.seats[seat];
        s.acted_this_street = true;
        match action {
            ActionType::Fold => s.status = SeatStatus::Folded,
            ActionType::Check => {}
            ActionType::Call => s.commit(put),
            ActionType::Bet | ActionType::Raise | ActionType::AllIn => {
                s.commit(put);
                self.raise_to(seat, target);
            }
        }
        debug!("hand #{hand_id}: seat {seat} {action} {put}");

        self.broadcast(TableEvent::PlayerAction {
            hand_id,
            seat,
            action,
            amount: put,
            to_call,
            pot_after: self.total_pot(),
        });
        self.broadcast_pots();
        self.acting_seat = None;
        self.advance(seat);
        self.debug_check_chips();
        Ok(())
    }

    fn raise_to(&mut self, seat: SeatIndex, target: Chips) {
        if target <= self.current_bet {
            return;
        }
        let increment = target - self.current_bet;
        self.current_bet = target;
        // Only a full raise reopens the action.
        if increment >= self.min_raise {
            self.min_raise = increment;
            for (idx, s) in self.seats.iter_mut().enumerate() {
                if idx != seat && s.status == SeatStatus::Active {
                    s.acted_this_street = false;
                }
            }
        }
    }

    // === Wakeups ===

    /// Handle a wakeup the owner scheduled. Returns `false` for stale tokens.
    pub fn fire_wakeup(&mut self, token: u64) -> bool {
        let wakeup = match self.wakeup {
            Some(wakeup) if wakeup.token == token => wakeup,
            _ => return false,
        };
        self.wakeup = None;

        match wakeup.kind {
            WakeupKind::ActionTimeout { hand_id, seat } => {
                if self.hand_id != Some(hand_id) || self.acting_seat != Some(seat) {
                    return false;
                }
                let Some(player) = self.seats[seat].occupant.clone() else {
                    return false;
                };
                let action = if self.seats[seat].current_bet == self.current_bet {
                    ActionType::Check
                } else {
                    ActionType::Fold
                };
                info!("hand #{hand_id}: seat {seat} timed out and {action}");
                if let Err(error) = self.request_action(&player, hand_id, action, None) {
                    warn!("hand #{hand_id}: timeout action for seat {seat} rejected: {error}");
                }
            }
            WakeupKind::NextHand => {
                if self.phase == TablePhase::Cleanup {
                    self.phase = TablePhase::WaitingForPlayers;
                    self.try_start_hand();
                }
            }
        }
        true
    }

    fn arm_wakeup(&mut self, kind: WakeupKind, delay: Duration) {
        let token = self.next_token;
        self.next_token += 1;
        self.wakeup = Some(Wakeup { token, kind, delay });
    }

    fn cancel_wakeup(&mut self) {
        self.wakeup = None;
    }

    // === Hand Lifecycle ===

    fn next_funded_seat(&self, after: Option<SeatIndex>) -> Option<SeatIndex> {
        let n = self.seats.len();
        let start = after.unwrap_or(n - 1);
        (1..=n)
            .map(|step| (start + step) % n)
            .find(|&idx| self.seats[idx].is_occupied() && self.seats[idx].stack > 0)
    }

    fn try_start_hand(&mut self) -> bool {
        if self.phase.is_hand_running() {
            return false;
        }
        let funded: Vec<SeatIndex> = (0..self.seats.len())
            .filter(|&idx| self.seats[idx].is_occupied() && self.seats[idx].stack > 0)
            .collect();
        if funded.len() < 2 {
            self.phase = TablePhase::WaitingForPlayers;
            return false;
        }

        let hand_id = self.hand_id.map_or(1, |id| id + 1);
        self.hand_id = Some(hand_id);
        self.seed_counter += 1;
        self.deck = Deck::shuffled(self.seed_base.wrapping_add(self.seed_counter));
        self.board.clear();
        self.forfeited.clear();
        for s in &mut self.seats {
            s.reset_hand();
        }

        let Some(button) = self.next_funded_seat(self.button_seat) else {
            return false;
        };
        // Heads-up the button posts the small blind and acts first preflop.
        let small_blind_seat = if funded.len() == 2 {
            button
        } else {
            self.next_funded_seat(Some(button)).unwrap_or(button)
        };
        let big_blind_seat = self
            .next_funded_seat(Some(small_blind_seat))
            .unwrap_or(small_blind_seat);

        self.button_seat = Some(button);
        self.phase = TablePhase::InHand(Street::Preflop);
        self.current_bet = 0;
        self.min_raise = self.settings.big_blind;
        self.acting_seat = None;

        let small_blind = self.settings.small_blind;
        let big_blind = self.settings.big_blind;
        self.post_blind(small_blind_seat, small_blind);
        self.post_blind(big_blind_seat, big_blind);
        self.current_bet = self.seats[small_blind_seat]
            .current_bet
            .max(self.seats[big_blind_seat].current_bet);

        info!("hand #{hand_id} started with {} players, button at seat {button}", funded.len());
        self.broadcast(TableEvent::HandStart {
            hand_id,
            button_seat: button,
            small_blind_seat,
            big_blind_seat,
            small_blind,
            big_blind,
        });

        for &seat in &funded {
            let cards = vec![self.deck.deal_card(), self.deck.deal_card()];
            self.seats[seat].hole_cards.clone_from(&cards);
            if let Some(owner) = self.seats[seat].occupant.clone() {
                self.notifications.push_back(Notification::private(
                    owner,
                    TableEvent::DealHole {
                        hand_id,
                        seat,
                        cards,
                    },
                ));
            }
        }

        self.broadcast(TableEvent::StreetStart {
            hand_id,
            street: Street::Preflop,
        });
        self.broadcast_pots();
        self.advance(big_blind_seat);
        true
    }

    fn post_blind(&mut self, seat: SeatIndex, amount: Chips) {
        let s = &mut self.seats[seat];
        let blind = amount.min(s.stack);
        s.commit(blind);
    }

    fn live_seats(&self) -> Vec<SeatIndex> {
        (0..self.seats.len())
            .filter(|&idx| self.seats[idx].is_live())
            .collect()
    }

    fn needs_action(&self, seat: &Seat) -> bool {
        seat.is_occupied()
            && seat.status == SeatStatus::Active
            && (!seat.acted_this_street || seat.current_bet != self.current_bet)
    }

    fn is_street_complete(&self) -> bool {
        !self.seats.iter().any(|s| self.needs_action(s))
    }

    /// Nobody is left to bet against: at most one seat can still act and it
    /// already matches the bet.
    fn is_betting_closed(&self) -> bool {
        let mut active = self
            .seats
            .iter()
            .filter(|s| s.is_occupied() && s.status == SeatStatus::Active);
        match (active.next(), active.next()) {
            (None, _) => true,
            (Some(only), None) => only.current_bet >= self.current_bet,
            _ => false,
        }
    }

    fn next_to_act(&self, after: SeatIndex) -> Option<SeatIndex> {
        let n = self.seats.len();
        (1..=n)
            .map(|step| (after + step) % n)
            .find(|&idx| self.needs_action(&self.seats[idx]))
    }

    /// Move the hand forward after a change, starting the search for the
    /// next actor clockwise from `anchor`.
    fn advance(&mut self, mut anchor: SeatIndex) {
        loop {
            let live = self.live_seats();
            if live.len() <= 1 {
                self.finish_uncontested(live.first().copied());
                return;
            }

            if !self.is_street_complete() && !self.is_betting_closed() {
                if let Some(acting) = self.acting_seat {
                    if self.needs_action(&self.seats[acting]) {
                        return;
                    }
                }
                if let Some(next) = self.next_to_act(anchor) {
                    self.give_turn(next);
                    return;
                }
            }

            let Some(street) = self.phase.street() else {
                return;
            };
            let Some((next_street, count)) = street.next() else {
                self.showdown();
                return;
            };
            self.deal_street(next_street, count);
            anchor = self.button_seat.unwrap_or(0);
        }
    }

    fn give_turn(&mut self, seat: SeatIndex) {
        let hand_id = self.hand_id.unwrap_or_default();
        let legal = self.legal_options_for(seat);
        self.acting_seat = Some(seat);
        self.arm_wakeup(
            WakeupKind::ActionTimeout { hand_id, seat },
            self.settings.action_timeout,
        );
        self.broadcast(TableEvent::ActionAvailable {
            hand_id,
            seat,
            options: legal.options,
            min_raise_to: legal.min_raise_to,
            call_amount: legal.call_amount,
            pot: self.total_pot(),
            time_left_secs: self.settings.action_timeout.as_secs(),
        });
    }

    fn deal_street(&mut self, street: Street, count: usize) {
        let hand_id = self.hand_id.unwrap_or_default();
        for _ in 0..count {
            let card = self.deck.deal_card();
            self.board.push(card);
        }
        self.phase = TablePhase::InHand(street);
        self.current_bet = 0;
        self.min_raise = self.settings.big_blind;
        self.acting_seat = None;
        self.cancel_wakeup();
        for s in &mut self.seats {
            s.reset_street();
        }
        debug!("hand #{hand_id}: {street} dealt");
        self.broadcast(TableEvent::StreetStart { hand_id, street });
        self.broadcast(TableEvent::BoardReveal {
            hand_id,
            cards: self.board.clone(),
        });
    }

    /// Layered pots for the current contributions. Chips in a layer nobody
    /// can win (left behind by a seat vacated mid-hand) join the last pot
    /// that has eligible seats.
    #[must_use]
    pub fn pots(&self) -> Vec<Pot> {
        let mut contributions: BTreeMap<SeatIndex, Chips> = BTreeMap::new();
        for (idx, s) in self.seats.iter().enumerate() {
            if s.total_contribution > 0 {
                contributions.insert(idx, s.total_contribution);
            }
        }
        for (&idx, &chips) in &self.forfeited {
            *contributions.entry(idx).or_default() += chips;
        }
        let contenders: BTreeSet<SeatIndex> = self.live_seats().into_iter().collect();

        let mut pots = build_pots(&contributions, &contenders);
        let orphaned = self.total_pot() - pots.iter().map(|p| p.amount).sum::<Chips>();
        if orphaned > 0 {
            if let Some(last) = pots.last_mut() {
                last.amount += orphaned;
            }
        }
        pots
    }

    fn broadcast_pots(&mut self) {
        let hand_id = self.hand_id.unwrap_or_default();
        let mut pots = self.pots().into_iter();
        let main_pot = pots.next().map_or(0, |p| p.amount);
        self.broadcast(TableEvent::PotsUpdate {
            hand_id,
            main_pot,
            side_pots: pots.collect(),
        });
    }

    fn finish_uncontested(&mut self, winner: Option<SeatIndex>) {
        let hand_id = self.hand_id.unwrap_or_default();
        let pot = self.total_pot();
        let mut winnings = BTreeMap::new();
        let mut unclaimed = 0;
        match winner {
            Some(seat) => {
                self.seats[seat].stack += pot;
                winnings.insert(seat, pot);
                info!("hand #{hand_id}: seat {seat} wins {pot} uncontested");
                self.broadcast(TableEvent::Showdown {
                    hand_id,
                    reveals: Vec::new(),
                    winners_by_pot: vec![PotAward {
                        pot_index: 0,
                        amount: pot,
                        winners: vec![seat],
                    }],
                });
            }
            None => {
                // Every contender left. Seated players get their own chips
                // back; forfeited chips leave with their owners.
                for s in &mut self.seats {
                    s.stack += s.total_contribution;
                }
                unclaimed = self.forfeited.values().map(|c| u64::from(*c)).sum();
                warn!("hand #{hand_id}: no contender left, {unclaimed} forfeited chips unclaimed");
            }
        }
        self.finish_hand(winnings, unclaimed);
    }

    fn showdown(&mut self) {
        let hand_id = self.hand_id.unwrap_or_default();
        self.phase = TablePhase::InHand(Street::Showdown);
        self.acting_seat = None;
        self.cancel_wakeup();

        let contenders = self.live_seats();
        let values: BTreeMap<SeatIndex, _> = contenders
            .iter()
            .map(|&seat| {
                let mut cards = self.seats[seat].hole_cards.clone();
                cards.extend_from_slice(&self.board);
                (seat, evaluate(&cards))
            })
            .collect();

        let mut winnings: BTreeMap<SeatIndex, Chips> = BTreeMap::new();
        let mut winners_by_pot = Vec::new();
        for (pot_index, pot) in self.pots().into_iter().enumerate() {
            let hands: Vec<_> = pot.eligible_seats.iter().map(|seat| &values[seat]).collect();
            let winners: Vec<SeatIndex> = argmax(&hands)
                .into_iter()
                .map(|i| pot.eligible_seats[i])
                .collect();
            for (seat, share) in split_pot(pot.amount, &winners) {
                self.seats[seat].stack += share;
                *winnings.entry(seat).or_default() += share;
            }
            debug!("hand #{hand_id}: pot {pot_index} of {} to {winners:?}", pot.amount);
            winners_by_pot.push(PotAward {
                pot_index,
                amount: pot.amount,
                winners,
            });
        }

        let reveals = contenders
            .iter()
            .map(|&seat| Reveal {
                seat,
                cards: self.seats[seat].hole_cards.clone(),
            })
            .collect();
        self.broadcast(TableEvent::Showdown {
            hand_id,
            reveals,
            winners_by_pot,
        });
        self.finish_hand(winnings, 0);
    }

    fn finish_hand(&mut self, winnings: BTreeMap<SeatIndex, Chips>, unclaimed: u64) {
        let hand_id = self.hand_id.unwrap_or_default();
        for s in &mut self.seats {
            s.total_contribution = 0;
            s.current_bet = 0;
            s.street_contribution = 0;
        }
        self.forfeited.clear();
        self.chips_in_play -= unclaimed;
        assert_eq!(
            self.chips_on_table(),
            self.chips_in_play,
            "chips created or destroyed in hand #{hand_id}"
        );

        let stacks = self
            .seats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_occupied())
            .map(|(idx, s)| (idx, s.stack))
            .collect();
        self.broadcast(TableEvent::HandEnd {
            hand_id,
            deltas: winnings,
            stacks,
        });
        info!("hand #{hand_id} ended");

        self.phase = TablePhase::Cleanup;
        self.acting_seat = None;
        self.current_bet = 0;
        self.min_raise = self.settings.big_blind;
        self.board.clear();
        self.deck.clear();
        for s in &mut self.seats {
            s.reset_hand();
        }
        self.arm_wakeup(WakeupKind::NextHand, self.settings.cleanup_delay);
    }

    // === Views ===

    /// Public table state plus the viewer's own seat and hole cards.
    #[must_use]
    pub fn table_view(&self, viewer: Option<&PlayerId>) -> TableView {
        let mut pots = self.pots().into_iter();
        let main_pot = pots.next().map_or(0, |p| p.amount);
        let legal_action = self.acting_seat.map(|seat| {
            let legal = self.legal_options_for(seat);
            LegalActionView {
                seat,
                options: legal.options,
                min_raise_to: legal.min_raise_to,
                call_amount: legal.call_amount,
                pot: self.total_pot(),
                time_left_secs: self.settings.action_timeout.as_secs(),
            }
        });
        let hero_seat = viewer.and_then(|player| self.seat_of(player));
        let hero_hole_cards = hero_seat
            .map(|seat| self.seats[seat].hole_cards.clone())
            .filter(|cards| cards.len() == 2);

        TableView {
            hand_id: self.hand_id,
            button_seat: self.button_seat,
            small_blind: self.settings.small_blind,
            big_blind: self.settings.big_blind,
            phase: self.phase,
            acting_seat: self.acting_seat,
            board: self.board.clone(),
            seats: self
                .seats
                .iter()
                .enumerate()
                .map(|(idx, s)| SeatView::new(idx, s))
                .collect(),
            main_pot,
            side_pots: pots.collect(),
            legal_action,
            hero_seat,
            hero_hole_cards,
        }
    }

    fn broadcast(&mut self, event: TableEvent) {
        self.notifications.push_back(Notification::broadcast(event));
    }

    fn debug_check_chips(&self) {
        debug_assert_eq!(
            self.chips_on_table(),
            self.chips_in_play,
            "chip conservation violated"
        );
    }
}
