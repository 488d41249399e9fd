use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Subcommand};
use snakes::{GameConfig, NodeConfig, PacketLossSimulation, PlayerType};

#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    #[arg(long, default_value_t = 100)]
    pub width: i32,

    #[arg(long, default_value_t = 100)]
    pub height: i32,

    #[arg(long, default_value_t = 1)]
    pub food_static: u32,

    #[arg(long, default_value_t = 1.0)]
    pub food_per_player: f64,

    #[arg(long, default_value_t = 200, help = "Tick interval in ms")]
    pub iteration_delay_ms: u32,

    #[arg(long, default_value_t = 0.1, help = "Chance a dead snake cell turns into food")]
    pub dead_food_prob: f64,

    #[arg(long, default_value_t = 100)]
    pub ping_delay_ms: u32,

    #[arg(long, default_value_t = 800)]
    pub node_timeout_ms: u32,
}

impl HostArgs {
    pub fn game_config(&self) -> Result<GameConfig, snakes::ConfigError> {
        GameConfig::new(
            self.width,
            self.height,
            self.food_static,
            self.food_per_player,
            self.iteration_delay_ms,
            self.dead_food_prob,
            self.ping_delay_ms,
            self.node_timeout_ms,
        )
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a new game and act as its master
    Host(HostArgs),
    /// Join a running game
    Join {
        #[arg(long, help = "Master address; discovered via multicast when omitted")]
        master: Option<SocketAddr>,

        #[arg(long, help = "Watch without a snake")]
        view: bool,

        #[arg(long, default_value_t = 5000, help = "How long to look for a game, in ms")]
        discover_ms: u64,
    },
    /// Print the games announced on the local network
    List {
        #[arg(long, default_value_t = 3000)]
        wait_ms: u64,
    },
}

pub fn node_config(name: &str, robot: bool, loss_percent: f64) -> NodeConfig {
    NodeConfig {
        player_name: name.to_string(),
        player_type: if robot {
            PlayerType::Robot
        } else {
            PlayerType::Human
        },
        packet_loss: (loss_percent > 0.0).then(|| PacketLossSimulation::new(loss_percent / 100.0)),
        ..NodeConfig::default()
    }
}

pub fn discovery_wait(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
