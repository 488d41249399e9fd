use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use crate::game::PlayerId;

#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub sequence: u64,
    pub data: Vec<u8>,
    pub last_sent: Instant,
}

/// Ack-required datagrams per destination, retransmitted every `interval`
/// until acknowledged or until the peer is dropped.
#[derive(Debug)]
pub struct ResendQueue {
    peers: BTreeMap<PlayerId, VecDeque<PendingMessage>>,
    interval: Duration,
}

impl ResendQueue {
    pub fn new(interval: Duration) -> Self {
        Self {
            peers: BTreeMap::new(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn enqueue(&mut self, peer: PlayerId, sequence: u64, data: Vec<u8>, now: Instant) {
        self.peers.entry(peer).or_default().push_back(PendingMessage {
            sequence,
            data,
            last_sent: now,
        });
    }

    /// Removes the entry matching both `peer` and `sequence`. Returns `false`
    /// for duplicate or unknown acks.
    pub fn acknowledge(&mut self, peer: PlayerId, sequence: u64) -> bool {
        let Some(queue) = self.peers.get_mut(&peer) else {
            return false;
        };
        let Some(index) = queue.iter().position(|m| m.sequence == sequence) else {
            return false;
        };
        queue.remove(index);
        if queue.is_empty() {
            self.peers.remove(&peer);
        }
        true
    }

    /// Entries whose interval elapsed, stamped as sent at `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<(PlayerId, Vec<u8>)> {
        let interval = self.interval;
        let mut due = Vec::new();
        for (peer, queue) in self.peers.iter_mut() {
            for pending in queue.iter_mut() {
                if now.saturating_duration_since(pending.last_sent) >= interval {
                    pending.last_sent = now;
                    due.push((*peer, pending.data.clone()));
                }
            }
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.peers
            .values()
            .flat_map(|queue| queue.iter())
            .map(|pending| pending.last_sent + self.interval)
            .min()
    }

    pub fn drop_peer(&mut self, peer: PlayerId) -> usize {
        self.peers.remove(&peer).map_or(0, |queue| queue.len())
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    pub fn pending_for(&self, peer: PlayerId) -> usize {
        self.peers.get(&peer).map_or(0, |queue| queue.len())
    }

    pub fn len(&self) -> usize {
        self.peers.values().map(|queue| queue.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
