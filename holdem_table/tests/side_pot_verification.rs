//! Side pot calculation tests using property-based testing
//!
//! These tests verify that pot layering works correctly in all scenarios:
//! - Multiple all-ins at different amounts
//! - Folded players contribute but can't win
//! - Correct distribution of remainder chips
//! - Side pot eligibility based on contribution levels

use holdem_table::game::{
    entities::{Chips, SeatIndex},
    pots::{Pot, build_pots, split_pot},
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn pot(amount: Chips, eligible_seats: &[SeatIndex]) -> Pot {
    Pot {
        amount,
        eligible_seats: eligible_seats.to_vec(),
    }
}

#[test]
fn test_short_all_in_three_players() {
    // Seat 2 all-in for 300, seats 0 and 1 put in 1000 each.
    let contributions = BTreeMap::from([(0, 1000), (1, 1000), (2, 300)]);
    let contenders = BTreeSet::from([0, 1, 2]);
    assert_eq!(
        build_pots(&contributions, &contenders),
        vec![pot(900, &[0, 1, 2]), pot(1400, &[0, 1])]
    );
}

#[test]
fn test_multiple_side_pots_four_players() {
    // Scenario: 4 players at different stack sizes
    // Seat 0: All-in 25
    // Seat 1: All-in 75
    // Seat 2: All-in 150
    // Seat 3: Calls 150
    //
    // Expected pots:
    // - Main pot: 100 (25 x 4, all 4 eligible)
    // - Side pot 1: 150 (50 x 3, seats 1/2/3 eligible)
    // - Side pot 2: 150 (75 x 2, seats 2/3 eligible)
    let contributions = BTreeMap::from([(0, 25), (1, 75), (2, 150), (3, 150)]);
    let contenders = BTreeSet::from([0, 1, 2, 3]);
    assert_eq!(
        build_pots(&contributions, &contenders),
        vec![pot(100, &[0, 1, 2, 3]), pot(150, &[1, 2, 3]), pot(150, &[2, 3])]
    );
}

#[test]
fn test_folded_big_contributor_layer_dropped() {
    // Seat 1 bet 400 and folded; its extra chips above the callers' level
    // form a layer no contender can win.
    let contributions = BTreeMap::from([(0, 200), (1, 400), (2, 200)]);
    let contenders = BTreeSet::from([0, 2]);
    let pots = build_pots(&contributions, &contenders);
    assert_eq!(pots, vec![pot(600, &[0, 2])]);
}

#[test]
fn test_remainder_goes_to_lowest_seats() {
    let shares = split_pot(10, &[5, 2, 7]);
    assert_eq!(shares, BTreeMap::from([(2, 4), (5, 3), (7, 3)]));
}

fn contributions_strategy() -> impl Strategy<Value = BTreeMap<SeatIndex, Chips>> {
    prop::collection::btree_map(0usize..9, 0u32..5000, 2..9)
}

proptest! {
    #[test]
    fn test_pots_conserve_chips_when_everyone_contends(
        contributions in contributions_strategy(),
    ) {
        let contenders: BTreeSet<SeatIndex> = contributions.keys().copied().collect();
        let pots = build_pots(&contributions, &contenders);
        let total: Chips = contributions.values().sum();
        prop_assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), total);
    }

    #[test]
    fn test_pots_never_exceed_contributions(
        contributions in contributions_strategy(),
        folded_mask in any::<u16>(),
    ) {
        let contenders: BTreeSet<SeatIndex> = contributions
            .keys()
            .copied()
            .filter(|seat| folded_mask & (1 << seat) == 0)
            .collect();
        let pots = build_pots(&contributions, &contenders);
        let total: Chips = contributions.values().sum();
        prop_assert!(pots.iter().map(|p| p.amount).sum::<Chips>() <= total);
        for p in &pots {
            prop_assert!(p.amount > 0);
            prop_assert!(!p.eligible_seats.is_empty());
            prop_assert!(p.eligible_seats.iter().all(|s| contenders.contains(s)));
        }
    }

    #[test]
    fn test_eligibility_narrows_layer_by_layer(
        contributions in contributions_strategy(),
    ) {
        let contenders: BTreeSet<SeatIndex> = contributions.keys().copied().collect();
        let pots = build_pots(&contributions, &contenders);
        for pair in pots.windows(2) {
            let outer: BTreeSet<_> = pair[0].eligible_seats.iter().collect();
            prop_assert!(pair[1].eligible_seats.iter().all(|s| outer.contains(s)));
            prop_assert!(pair[1].eligible_seats.len() < pair[0].eligible_seats.len());
        }
        for p in &pots {
            let mut sorted = p.eligible_seats.clone();
            sorted.sort_unstable();
            prop_assert_eq!(&sorted, &p.eligible_seats);
        }
    }

    #[test]
    fn test_split_conserves_and_is_fair(
        amount in 0u32..100_000,
        winners in prop::collection::btree_set(0usize..9, 1..6),
    ) {
        let winners: Vec<SeatIndex> = winners.into_iter().collect();
        let shares = split_pot(amount, &winners);
        prop_assert_eq!(shares.values().sum::<Chips>(), amount);
        let max = shares.values().max().copied().unwrap_or(0);
        let min = shares.values().min().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
        // Larger shares go to lower seats.
        let ordered: Vec<Chips> = shares.values().copied().collect();
        prop_assert!(ordered.windows(2).all(|w| w[0] >= w[1]));
    }
}
