use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::game::{
    Direction, GameConfig, GameState, NodeRole, PlayerId, PlayerInfo, PlayerType, StateError,
};

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x534E_4B53;
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 192, 0, 4);
pub const MULTICAST_PORT: u16 = 9192;

pub fn multicast_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(MULTICAST_GROUP, MULTICAST_PORT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct MessageHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u64,
    pub sender_id: PlayerId,
    pub receiver_id: PlayerId,
}

impl MessageHeader {
    pub fn new(sequence: u64, sender_id: PlayerId, receiver_id: PlayerId) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
            sender_id,
            receiver_id,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

/// Periodic multicast advertisement of a running game.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Announcement {
    pub players: Vec<PlayerInfo>,
    pub config: GameConfig,
    pub can_join: bool,
}

impl Announcement {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            players: state.players.values().cloned().collect(),
            config: state.config,
            can_join: state.can_place_snake(),
        }
    }

    pub fn master(&self) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.role == NodeRole::Master)
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum MessagePayload {
    Join {
        player_type: PlayerType,
        only_view: bool,
        player_name: String,
    },
    /// Confirms `header.sequence`. The reply to a Join carries the assigned
    /// id in `header.receiver_id`.
    Ack,
    Announcement(Announcement),
    State(GameState),
    Steer {
        direction: Direction,
    },
    Ping,
    ChangeRole {
        sender_role: Option<NodeRole>,
        receiver_role: Option<NodeRole>,
    },
    Error {
        reason: String,
    },
}

impl MessagePayload {
    /// Messages kept in the resend queue until the peer acknowledges them.
    pub fn requires_ack(&self) -> bool {
        matches!(
            self,
            MessagePayload::Join { .. }
                | MessagePayload::State(_)
                | MessagePayload::Ping
                | MessagePayload::ChangeRole { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MessagePayload::Join { .. } => "Join",
            MessagePayload::Ack => "Ack",
            MessagePayload::Announcement(_) => "Announcement",
            MessagePayload::State(_) => "State",
            MessagePayload::Steer { .. } => "Steer",
            MessagePayload::Ping => "Ping",
            MessagePayload::ChangeRole { .. } => "ChangeRole",
            MessagePayload::Error { .. } => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Message {
    pub header: MessageHeader,
    pub payload: MessagePayload,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("datagram of {0} bytes exceeds the UDP payload limit")]
    TooLarge(usize),
    #[error("bad magic or protocol version")]
    BadHeader,
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] StateError),
}

impl Message {
    pub fn new(header: MessageHeader, payload: MessagePayload) -> Self {
        Self { header, payload }
    }

    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }

    pub fn sender_id(&self) -> PlayerId {
        self.header.sender_id
    }

    pub fn receiver_id(&self) -> PlayerId {
        self.header.receiver_id
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(CodecError::Serialize)?;
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(CodecError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    /// Validates and decodes one datagram. The receive buffer carries no
    /// alignment guarantee, so the bytes are copied into an aligned buffer first.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);
        let message =
            rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(CodecError::Deserialize)?;
        if !message.header.is_valid() {
            return Err(CodecError::BadHeader);
        }
        match &message.payload {
            MessagePayload::State(state) => state.validate()?,
            MessagePayload::Announcement(announcement) => announcement
                .config
                .validate()
                .map_err(StateError::from)?,
            _ => {}
        }
        Ok(message)
    }
}
