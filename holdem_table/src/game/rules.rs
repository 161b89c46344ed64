//! Legal-action calculation.

use serde::{Deserialize, Serialize};

use super::entities::{ActionType, Chips};

/// Everything a seat may do at its turn, and the amounts involved.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LegalOptions {
    pub options: Vec<ActionType>,
    /// Chips the seat would put in by calling, capped at its stack.
    pub call_amount: Chips,
    /// Smallest total street bet a RAISE may target; for an unopened
    /// decision, the smallest BET.
    pub min_raise_to: Chips,
}

impl LegalOptions {
    #[must_use]
    pub fn allows(&self, action: ActionType) -> bool {
        self.options.contains(&action)
    }

    /// Narrow the options for a seat that already acted this street and was
    /// only pushed back into the action by an all-in smaller than a full
    /// raise. Such a seat may call or fold but never reraise.
    #[must_use]
    pub fn without_reraise(mut self, stack: Chips) -> Self {
        let call_amount = self.call_amount;
        self.options.retain(|action| match action {
            ActionType::Bet | ActionType::Raise => false,
            ActionType::AllIn => stack <= call_amount,
            _ => true,
        });
        self
    }
}

/// Legal actions for a seat holding `stack` behind, having put `seat_bet`
/// in on this street, facing `table_current_bet` with a minimum raise
/// increment of `min_raise`.
#[must_use]
pub fn legal_options(
    stack: Chips,
    seat_bet: Chips,
    table_current_bet: Chips,
    min_raise: Chips,
) -> LegalOptions {
    let to_call = table_current_bet.saturating_sub(seat_bet);
    let raise_to = table_current_bet.saturating_add(min_raise);
    let mut options = vec![ActionType::Fold];

    if stack == 0 {
        return LegalOptions {
            options,
            call_amount: 0,
            min_raise_to: raise_to,
        };
    }

    if to_call == 0 {
        options.extend([ActionType::Check, ActionType::Bet, ActionType::AllIn]);
        return LegalOptions {
            options,
            call_amount: 0,
            min_raise_to: min_raise,
        };
    }

    options.push(ActionType::Call);
    if u64::from(seat_bet) + u64::from(stack) >= u64::from(raise_to) {
        options.push(ActionType::Raise);
    }
    options.push(ActionType::AllIn);
    LegalOptions {
        options,
        call_amount: to_call.min(stack),
        min_raise_to: raise_to,
    }
}
