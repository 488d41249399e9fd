use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use crate::game::{ConfigError, PlayerId};
use crate::net::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("invalid game config: {0}")]
    Config(#[from] ConfigError),
    #[error("join rejected: {0}")]
    JoinRejected(String),
    #[error("no reply from {addr} within {timeout:?}")]
    JoinTimeout { addr: SocketAddr, timeout: Duration },
    #[error("player {id} at {addr} also claims to be master")]
    ConflictingMaster { id: PlayerId, addr: SocketAddr },
    #[error("master {master} is gone and no deputy can take over")]
    NoDeputy { master: PlayerId },
    #[error("cannot take over as master without a game snapshot")]
    NoSnapshot,
}
