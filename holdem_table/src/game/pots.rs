//! Main and side pot construction.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::entities::{Chips, SeatIndex};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    /// Seats that may win this pot, ascending.
    pub eligible_seats: Vec<SeatIndex>,
}

/// Partition hand contributions into layered pots. Layer 0 is the main pot.
///
/// Every distinct positive contribution level closes a layer holding
/// `(level - previous) * contributors_at_or_above_level` chips. Only
/// `contenders` (seats still live in the hand) are eligible. Layers nobody
/// can win are dropped, but the next layer still starts from their level.
#[must_use]
pub fn build_pots(
    contributions: &BTreeMap<SeatIndex, Chips>,
    contenders: &BTreeSet<SeatIndex>,
) -> Vec<Pot> {
    let levels: BTreeSet<Chips> = contributions.values().copied().filter(|c| *c > 0).collect();

    let mut pots = Vec::with_capacity(levels.len());
    let mut previous = 0;
    for level in levels {
        let layer: Vec<SeatIndex> = contributions
            .iter()
            .filter(|(_, c)| **c >= level)
            .map(|(seat, _)| *seat)
            .collect();
        let amount = (level - previous) * layer.len() as Chips;
        let eligible_seats: Vec<SeatIndex> = layer
            .into_iter()
            .filter(|seat| contenders.contains(seat))
            .collect();
        previous = level;
        if amount == 0 || eligible_seats.is_empty() {
            continue;
        }
        pots.push(Pot {
            amount,
            eligible_seats,
        });
    }
    pots
}

/// Split `amount` evenly between `winners`; leftover chips go one at a time
/// to winners in ascending seat order.
#[must_use]
pub fn split_pot(amount: Chips, winners: &[SeatIndex]) -> BTreeMap<SeatIndex, Chips> {
    let mut shares = BTreeMap::new();
    if winners.is_empty() {
        return shares;
    }
    let mut ordered = winners.to_vec();
    ordered.sort_unstable();
    let count = ordered.len() as Chips;
    let share = amount / count;
    let remainder = (amount % count) as usize;
    for (i, seat) in ordered.into_iter().enumerate() {
        let extra = Chips::from(i < remainder);
        *shares.entry(seat).or_default() += share + extra;
    }
    shares
}
