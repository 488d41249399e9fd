use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::game::PlayerId;

#[derive(Debug, Clone)]
pub struct PeerLiveness {
    pub id: PlayerId,
    pub addr: SocketAddr,
    pub last_sent: Instant,
    pub last_received: Instant,
}

impl PeerLiveness {
    pub fn new(id: PlayerId, addr: SocketAddr, now: Instant) -> Self {
        Self {
            id,
            addr,
            last_sent: now,
            last_received: now,
        }
    }

    pub fn is_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_received) > timeout
    }

    pub fn needs_ping(&self, now: Instant, ping_delay: Duration) -> bool {
        now.saturating_duration_since(self.last_sent) >= ping_delay
    }
}

/// Who we talk to and when we last heard from / wrote to each of them.
#[derive(Debug)]
pub struct PeerTable {
    peers: BTreeMap<PlayerId, PeerLiveness>,
    ping_delay: Duration,
    node_timeout: Duration,
}

impl PeerTable {
    pub fn new(ping_delay: Duration, node_timeout: Duration) -> Self {
        Self {
            peers: BTreeMap::new(),
            ping_delay,
            node_timeout,
        }
    }

    pub fn set_timings(&mut self, ping_delay: Duration, node_timeout: Duration) {
        self.ping_delay = ping_delay;
        self.node_timeout = node_timeout;
    }

    pub fn insert(&mut self, id: PlayerId, addr: SocketAddr, now: Instant) {
        self.peers.insert(id, PeerLiveness::new(id, addr, now));
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<PeerLiveness> {
        self.peers.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&PeerLiveness> {
        self.peers.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.peers.contains_key(&id)
    }

    pub fn addr(&self, id: PlayerId) -> Option<SocketAddr> {
        self.peers.get(&id).map(|p| p.addr)
    }

    pub fn id_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.peers.values().find(|p| p.addr == addr).map(|p| p.id)
    }

    pub fn touch_sent(&mut self, id: PlayerId, now: Instant) {
        if let Some(peer) = self.peers.get_mut(&id) {
            peer.last_sent = now;
        }
    }

    pub fn touch_received(&mut self, id: PlayerId, now: Instant) {
        if let Some(peer) = self.peers.get_mut(&id) {
            peer.last_received = now;
        }
    }

    pub fn pings_due(&self, now: Instant) -> Vec<PlayerId> {
        self.peers
            .values()
            .filter(|p| p.needs_ping(now, self.ping_delay))
            .map(|p| p.id)
            .collect()
    }

    pub fn timed_out(&self, now: Instant) -> Vec<PlayerId> {
        self.peers
            .values()
            .filter(|p| p.is_timed_out(now, self.node_timeout))
            .map(|p| p.id)
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.peers
            .values()
            .flat_map(|p| {
                [
                    p.last_sent + self.ping_delay,
                    // first instant at which `is_timed_out` holds
                    p.last_received + self.node_timeout + Duration::from_millis(1),
                ]
            })
            .min()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.peers.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerLiveness> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
