pub mod game;
pub mod net;
pub mod node;
pub mod presentation;

pub use game::{
    ConfigError, Coord, Direction, GameConfig, GameState, NetAddress, NodeRole, PlayerId,
    PlayerInfo, PlayerType, Simulation, Snake, SnakeState, StateError, TickOutcome,
};
pub use net::{
    Announcement, CodecError, DiscoveryListener, Message, MessageHeader, MessagePayload,
    NetworkEndpoint, NetworkStats, PacketLossSimulation, PeerTable, ResendQueue,
};
pub use node::{MasterChange, NodeConfig, NodeController, NodeError, NodeEvent, NodeHandle};
pub use presentation::{JoinableGame, JoinableGames, Presenter};
