//! Event sequencing and the reconnect feed.
//!
//! Every notification leaving a table gets the next sequence number and a
//! place in a bounded replay buffer. A reconnecting client reports the last
//! sequence number it saw and receives either the events it missed or a
//! full snapshot when replay isn't possible.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::config::TableId;
use crate::game::{
    entities::{PlayerId, TableView},
    events::{Notification, TableEvent},
};

/// Sequence number decorator around any payload.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Sequenced<T> {
    pub seq: u64,
    #[serde(flatten)]
    pub inner: T,
}

/// Table state at a given sequence number, as one viewer may see it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub seq: u64,
    pub table_id: TableId,
    #[serde(flatten)]
    pub view: TableView,
}

#[derive(Debug)]
pub struct EventSequencer {
    capacity: usize,
    replay_threshold: usize,
    seq: u64,
    buffer: VecDeque<Sequenced<Notification>>,
}

impl EventSequencer {
    #[must_use]
    pub fn new(capacity: usize, replay_threshold: usize) -> Self {
        Self {
            capacity,
            replay_threshold,
            seq: 0,
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Last sequence number handed out; 0 before any event.
    #[must_use]
    pub fn current_seq(&self) -> u64 {
        self.seq
    }

    /// Oldest sequence number still retained.
    #[must_use]
    pub fn oldest_retained(&self) -> Option<u64> {
        self.buffer.front().map(|entry| entry.seq)
    }

    /// Assign the next sequence number and retain the notification for
    /// replay, evicting the oldest entry once full.
    pub fn stamp(&mut self, notification: Notification) -> Sequenced<Notification> {
        self.seq += 1;
        let entry = Sequenced {
            seq: self.seq,
            inner: notification,
        };
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(entry.clone());
        entry
    }

    /// Events after `last_seq` that `viewer` may see, or `None` when the
    /// client should be sent a snapshot instead: the gap is larger than the
    /// replay threshold, part of it has been evicted, or `last_seq` is ahead
    /// of the table.
    #[must_use]
    pub fn replay_for(
        &self,
        viewer: Option<&PlayerId>,
        last_seq: u64,
    ) -> Option<Vec<Sequenced<TableEvent>>> {
        if last_seq > self.seq {
            return None;
        }
        let missing = self.seq - last_seq;
        if missing == 0 {
            return Some(Vec::new());
        }
        if missing > self.replay_threshold as u64 {
            return None;
        }
        match self.oldest_retained() {
            Some(oldest) if oldest <= last_seq + 1 => {}
            _ => return None,
        }

        Some(
            self.buffer
                .iter()
                .filter(|entry| entry.seq > last_seq)
                .filter(|entry| entry.inner.delivery.is_visible_to(viewer))
                .map(|entry| Sequenced {
                    seq: entry.seq,
                    inner: entry.inner.event.clone(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(name: &str) -> Notification {
        Notification::broadcast(TableEvent::PlayerJoin {
            player_id: PlayerId::new(name),
            name: name.to_string(),
        })
    }

    fn filled(count: usize, capacity: usize, threshold: usize) -> EventSequencer {
        let mut sequencer = EventSequencer::new(capacity, threshold);
        for i in 0..count {
            sequencer.stamp(join(&format!("p{i}")));
        }
        sequencer
    }

    #[test]
    fn test_sequence_numbers_strictly_increase() {
        let mut sequencer = EventSequencer::new(10, 5);
        let a = sequencer.stamp(join("a"));
        let b = sequencer.stamp(join("b"));
        assert_eq!(a.seq, 1);
        assert_eq!(b.seq, 2);
        assert_eq!(sequencer.current_seq(), 2);
    }

    #[test]
    fn test_buffer_is_bounded() {
        let sequencer = filled(25, 10, 5);
        assert_eq!(sequencer.oldest_retained(), Some(16));
        assert_eq!(sequencer.current_seq(), 25);
    }

    #[test]
    fn test_replay_within_threshold() {
        let sequencer = filled(100, 5000, 200);
        let replay = sequencer.replay_for(None, 50).unwrap();
        assert_eq!(replay.len(), 50);
        assert_eq!(replay.first().map(|e| e.seq), Some(51));
        assert_eq!(replay.last().map(|e| e.seq), Some(100));
    }

    #[test]
    fn test_up_to_date_client_gets_empty_replay() {
        let sequencer = filled(10, 100, 50);
        assert_eq!(sequencer.replay_for(None, 10), Some(Vec::new()));
    }

    #[test]
    fn test_gap_over_threshold_needs_snapshot() {
        let sequencer = filled(300, 5000, 200);
        assert!(sequencer.replay_for(None, 99).is_none());
        assert!(sequencer.replay_for(None, 100).is_some());
    }

    #[test]
    fn test_evicted_gap_needs_snapshot() {
        let sequencer = filled(30, 10, 20);
        // Events 1..=20 are gone.
        assert!(sequencer.replay_for(None, 15).is_none());
        assert_eq!(sequencer.replay_for(None, 20).map(|r| r.len()), Some(10));
    }

    #[test]
    fn test_future_seq_needs_snapshot() {
        let sequencer = filled(5, 10, 10);
        assert!(sequencer.replay_for(None, 6).is_none());
    }

    #[test]
    fn test_replay_hides_other_players_private_events() {
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        let mut sequencer = EventSequencer::new(10, 10);
        sequencer.stamp(join("alice"));
        for (owner, seat) in [(&alice, 0), (&bob, 1)] {
            sequencer.stamp(Notification::private(
                owner.clone(),
                TableEvent::DealHole {
                    hand_id: 1,
                    seat,
                    cards: Vec::new(),
                },
            ));
        }

        let for_alice = sequencer.replay_for(Some(&alice), 0).unwrap();
        assert_eq!(for_alice.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![1, 2]);
        let for_observer = sequencer.replay_for(None, 0).unwrap();
        assert_eq!(for_observer.len(), 1);
    }

    #[test]
    fn test_sequenced_event_flattens_into_json() {
        let entry = Sequenced {
            seq: 7,
            inner: TableEvent::PlayerLeave {
                player_id: PlayerId::new("bob"),
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["seq"], 7);
        assert_eq!(json["type"], "PLAYER_LEAVE");
        assert_eq!(json["player_id"], "bob");
    }
}
