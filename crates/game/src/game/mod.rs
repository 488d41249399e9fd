mod config;
mod player;
mod simulation;
mod snake;
mod state;

pub use config::{ConfigError, GameConfig};
pub use player::{NetAddress, NodeRole, PlayerId, PlayerInfo, PlayerType, UNASSIGNED_ID};
pub use simulation::{ROUND_RESTART_PAUSE, Simulation, TickOutcome};
pub use snake::{BodyCells, Coord, Direction, Snake, SnakeState};
pub use state::{GameState, Occupancy, SPAWN_CLEARANCE, StateError};
