mod discovery;
mod endpoint;
mod liveness;
mod protocol;
mod resend;
mod stats;

pub use discovery::DiscoveryListener;
pub use endpoint::NetworkEndpoint;
pub use liveness::{PeerLiveness, PeerTable};
pub use protocol::{
    Announcement, CodecError, MAX_DATAGRAM_SIZE, MULTICAST_GROUP, MULTICAST_PORT, Message,
    MessageHeader, MessagePayload, PROTOCOL_MAGIC, PROTOCOL_VERSION, multicast_addr,
};
pub use resend::{PendingMessage, ResendQueue};
pub use stats::{NetworkStats, PacketLossSimulation};
