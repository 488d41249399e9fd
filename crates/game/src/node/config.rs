use std::net::SocketAddr;
use std::time::Duration;

use crate::game::PlayerType;
use crate::net::{PacketLossSimulation, multicast_addr};

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub player_name: String,
    pub player_type: PlayerType,
    /// How long a joiner waits for the master's Ack or Error.
    pub join_timeout: Duration,
    pub announce_interval: Duration,
    pub announce_target: SocketAddr,
    /// Upper bound on a single socket wait, so queued commands are not delayed.
    pub max_wait: Duration,
    pub packet_loss: Option<PacketLossSimulation>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            player_name: "player".to_string(),
            player_type: PlayerType::Human,
            join_timeout: Duration::from_millis(2000),
            announce_interval: Duration::from_millis(1000),
            announce_target: multicast_addr(),
            max_wait: Duration::from_millis(50),
            packet_loss: None,
        }
    }
}

impl NodeConfig {
    pub fn named(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }
}
