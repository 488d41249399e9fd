use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use rkyv::{Archive, Deserialize, Serialize};

pub type PlayerId = u32;

/// Placeholder id used before the master has assigned one.
pub const UNASSIGNED_ID: PlayerId = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum NodeRole {
    Master,
    Normal,
    Deputy,
    Viewer,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Master => "MASTER",
            NodeRole::Normal => "NORMAL",
            NodeRole::Deputy => "DEPUTY",
            NodeRole::Viewer => "VIEWER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PlayerType {
    Human,
    Robot,
}

/// IPv4 address + port as it travels inside roster snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct NetAddress {
    pub octets: [u8; 4],
    pub port: u16,
}

impl NetAddress {
    pub fn from_socket_addr(addr: SocketAddr) -> Option<Self> {
        match addr.ip() {
            IpAddr::V4(ip) => Some(Self {
                octets: ip.octets(),
                port: addr.port(),
            }),
            IpAddr::V6(ip) => ip.to_ipv4_mapped().map(|ip| Self {
                octets: ip.octets(),
                port: addr.port(),
            }),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::from(self.octets)), self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    /// `None` for the master's own entry; peers know it from the datagram source.
    pub address: Option<NetAddress>,
    pub role: NodeRole,
    pub player_type: PlayerType,
    pub score: u32,
}

impl PlayerInfo {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        address: Option<NetAddress>,
        role: NodeRole,
        player_type: PlayerType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address,
            role,
            player_type,
            score: 0,
        }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address.map(|a| a.socket_addr())
    }

    pub fn is_viewer(&self) -> bool {
        self.role == NodeRole::Viewer
    }

    pub fn increment_score(&mut self) {
        self.score = self.score.saturating_add(1);
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_address_roundtrip() {
        let addr: SocketAddr = "192.168.1.7:9000".parse().unwrap();
        let net = NetAddress::from_socket_addr(addr).unwrap();
        assert_eq!(net.octets, [192, 168, 1, 7]);
        assert_eq!(net.socket_addr(), addr);
    }

    #[test]
    fn test_v6_only_address_rejected() {
        let addr: SocketAddr = "[2001:db8::1]:9000".parse().unwrap();
        assert!(NetAddress::from_socket_addr(addr).is_none());

        let mapped: SocketAddr = "[::ffff:10.0.0.1]:9000".parse().unwrap();
        assert_eq!(
            NetAddress::from_socket_addr(mapped).unwrap().octets,
            [10, 0, 0, 1]
        );
    }

    #[test]
    fn test_score_adjustments() {
        let mut player = PlayerInfo::new(1, "p", None, NodeRole::Normal, PlayerType::Human);
        player.increment_score();
        player.increment_score();
        assert_eq!(player.score, 2);
        player.reset_score();
        assert_eq!(player.score, 0);
    }
}
