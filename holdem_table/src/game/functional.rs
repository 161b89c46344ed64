//! Hand evaluation. Pure functions over cards; nothing here touches table
//! state.

use std::cmp::Ordering;

use super::entities::{Card, HandValue, Rank, SUITS, Value};

/// Bitmask with bit `v` set for every rank `v` present. Aces also set bit 1
/// so the wheel reads as a five-high straight.
fn rank_mask(values: impl IntoIterator<Item = Value>) -> u16 {
    values.into_iter().fold(0u16, |mask, v| {
        let mask = mask | (1 << v);
        if v == 14 { mask | (1 << 1) } else { mask }
    })
}

/// Top card of the best straight in the mask.
fn straight_high(mask: u16) -> Option<Value> {
    (5u8..=14)
        .rev()
        .find(|&high| (high - 4..=high).all(|v| mask & (1 << v) != 0))
}

/// Ranks present in the cards, highest first, skipping `exclude`.
fn kickers(counts: &[u8; 15], exclude: &[Value], n: usize) -> Vec<Value> {
    (2u8..=14)
        .rev()
        .filter(|v| counts[*v as usize] > 0 && !exclude.contains(v))
        .take(n)
        .collect()
}

/// Rank the best five-card hand contained in `cards` (normally seven: two
/// hole cards plus the board).
#[must_use]
pub fn evaluate(cards: &[Card]) -> HandValue {
    let mut counts = [0u8; 15];
    for card in cards {
        counts[card.rank() as usize] += 1;
    }

    let flush_values = SUITS.iter().find_map(|suit| {
        let mut values: Vec<Value> = cards
            .iter()
            .filter(|c| c.suit() == *suit)
            .map(Card::rank)
            .collect();
        (values.len() >= 5).then(|| {
            values.sort_unstable_by(|a, b| b.cmp(a));
            values
        })
    });

    if let Some(values) = &flush_values {
        if let Some(high) = straight_high(rank_mask(values.iter().copied())) {
            return HandValue {
                rank: Rank::StraightFlush,
                values: vec![high],
            };
        }
    }

    // Ranks grouped by multiplicity, highest rank first within each group.
    let of_count = |n: u8| -> Vec<Value> {
        (2u8..=14)
            .rev()
            .filter(|v| counts[*v as usize] == n)
            .collect()
    };
    let quads = of_count(4);
    let trips = of_count(3);
    let pairs = of_count(2);

    if let Some(&quad) = quads.first() {
        let mut values = vec![quad];
        values.extend(kickers(&counts, &[quad], 1));
        return HandValue {
            rank: Rank::FourOfAKind,
            values,
        };
    }

    if let Some(&trip) = trips.first() {
        let pair = trips
            .iter()
            .skip(1)
            .chain(pairs.iter())
            .copied()
            .max();
        if let Some(pair) = pair {
            return HandValue {
                rank: Rank::FullHouse,
                values: vec![trip, pair],
            };
        }
    }

    if let Some(mut values) = flush_values {
        values.truncate(5);
        return HandValue {
            rank: Rank::Flush,
            values,
        };
    }

    if let Some(high) = straight_high(rank_mask(cards.iter().map(Card::rank))) {
        return HandValue {
            rank: Rank::Straight,
            values: vec![high],
        };
    }

    if let Some(&trip) = trips.first() {
        let mut values = vec![trip];
        values.extend(kickers(&counts, &[trip], 2));
        return HandValue {
            rank: Rank::ThreeOfAKind,
            values,
        };
    }

    match pairs.as_slice() {
        [hi, lo, ..] => {
            let mut values = vec![*hi, *lo];
            // A third pair can play as the kicker.
            values.extend(kickers(&counts, &[*hi, *lo], 1));
            HandValue {
                rank: Rank::TwoPair,
                values,
            }
        }
        [pair] => {
            let mut values = vec![*pair];
            values.extend(kickers(&counts, &[*pair], 3));
            HandValue {
                rank: Rank::OnePair,
                values,
            }
        }
        [] => HandValue {
            rank: Rank::HighCard,
            values: kickers(&counts, &[], 5),
        },
    }
}

#[must_use]
pub fn compare(a: &HandValue, b: &HandValue) -> Ordering {
    a.cmp(b)
}

/// Indices of every maximal value, ascending. Empty input gives an empty
/// result.
#[must_use]
pub fn argmax<T: Ord>(values: &[T]) -> Vec<usize> {
    let Some(best) = values.iter().max() else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| *v == best)
        .map(|(i, _)| i)
        .collect()
}
