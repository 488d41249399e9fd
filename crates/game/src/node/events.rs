use std::net::SocketAddr;

use crate::game::{NodeRole, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterChange {
    /// The new master told us with a ChangeRole.
    Announced,
    /// The old master timed out and we switched to its deputy.
    Timeout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    PlayerJoined {
        id: PlayerId,
        addr: SocketAddr,
        role: NodeRole,
    },
    JoinRejected {
        addr: SocketAddr,
        reason: String,
    },
    PeerTimedOut {
        id: PlayerId,
    },
    DeputyAssigned {
        id: PlayerId,
    },
    RoleChanged {
        from: NodeRole,
        to: NodeRole,
    },
    MasterChanged {
        id: PlayerId,
        addr: SocketAddr,
        cause: MasterChange,
    },
    RoundRestarted {
        round: u32,
    },
}
