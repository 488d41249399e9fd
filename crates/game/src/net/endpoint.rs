use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use log::trace;

use super::protocol::{MAX_DATAGRAM_SIZE, Message};
use super::stats::{NetworkStats, PacketLossSimulation};

/// Shortest read timeout handed to the socket; zero would mean "block forever".
const MIN_WAIT: Duration = Duration::from_millis(1);

pub struct NetworkEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    stats: NetworkStats,
    loss: PacketLossSimulation,
    recv_buffer: Box<[u8]>,
}

impl NetworkEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Self::from_socket(UdpSocket::bind(addr)?)
    }

    pub fn from_socket(socket: UdpSocket) -> io::Result<Self> {
        socket.set_nonblocking(false)?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            stats: NetworkStats::default(),
            loss: PacketLossSimulation::default(),
            recv_buffer: vec![0u8; MAX_DATAGRAM_SIZE + 1].into_boxed_slice(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn set_loss_simulation(&mut self, loss: PacketLossSimulation) {
        self.loss = loss;
    }

    pub fn record_retransmission(&mut self) {
        self.stats.retransmissions += 1;
    }

    pub fn send_to(&mut self, message: &Message, addr: SocketAddr) -> io::Result<Vec<u8>> {
        let data = message.encode().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )
        })?;
        self.send_raw(&data, addr)?;
        Ok(data)
    }

    /// Sends an already encoded datagram, as kept by the resend queue.
    pub fn send_raw(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        if self.loss.should_drop() {
            self.stats.simulated_losses += 1;
            trace!("Simulated loss of {} bytes to {}", data.len(), addr);
            return Ok(data.len());
        }

        let bytes = self.socket.send_to(data, addr)?;

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;

        Ok(bytes)
    }

    /// Blocks for at most `wait` and returns the next well-formed message.
    /// Timeouts and malformed datagrams both yield `Ok(None)`.
    pub fn receive_timeout(&mut self, wait: Duration) -> io::Result<Option<(Message, SocketAddr)>> {
        self.socket.set_read_timeout(Some(wait.max(MIN_WAIT)))?;

        let (size, addr) = match self.socket.recv_from(&mut self.recv_buffer) {
            Ok(received) => received,
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::Interrupted
                ) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match Message::decode(&self.recv_buffer[..size]) {
            Ok(message) => {
                self.stats.packets_received += 1;
                self.stats.bytes_received += size as u64;
                Ok(Some((message, addr)))
            }
            Err(e) => {
                self.stats.malformed_dropped += 1;
                trace!("Dropped {} byte datagram from {}: {}", size, addr, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, GameState, NodeRole, PlayerInfo, PlayerType};
    use crate::net::protocol::{MessageHeader, MessagePayload};

    fn loopback() -> NetworkEndpoint {
        NetworkEndpoint::bind("127.0.0.1:0").unwrap()
    }

    #[test]
    fn test_send_and_receive() {
        let mut a = loopback();
        let mut b = loopback();
        let message = Message::new(MessageHeader::new(5, 0, 1), MessagePayload::Ping);
        a.send_to(&message, b.local_addr()).unwrap();

        let (received, from) = b
            .receive_timeout(Duration::from_millis(500))
            .unwrap()
            .unwrap();
        assert_eq!(received, message);
        assert_eq!(from, a.local_addr());
        assert_eq!(a.stats().packets_sent, 1);
        assert_eq!(b.stats().packets_received, 1);
    }

    #[test]
    fn test_timeout_returns_none() {
        let mut a = loopback();
        assert!(a.receive_timeout(Duration::from_millis(10)).unwrap().is_none());
        assert!(a.receive_timeout(Duration::ZERO).unwrap().is_none());
    }

    #[test]
    fn test_malformed_datagram_is_counted() {
        let mut a = loopback();
        let raw = UdpSocket::bind("127.0.0.1:0").unwrap();
        raw.send_to(b"not a message", a.local_addr()).unwrap();

        assert!(a.receive_timeout(Duration::from_millis(500)).unwrap().is_none());
        assert_eq!(a.stats().malformed_dropped, 1);
        assert_eq!(a.stats().packets_received, 0);
    }

    #[test]
    fn test_unplayable_state_is_dropped_as_malformed() {
        let mut a = loopback();
        let mut b = loopback();
        let master = PlayerInfo::new(0, "host", None, NodeRole::Master, PlayerType::Human);
        let config = GameConfig {
            height: 0,
            ..GameConfig::default()
        };
        let message = Message::new(
            MessageHeader::new(2, 0, 1),
            MessagePayload::State(GameState::new(config, master)),
        );
        a.send_to(&message, b.local_addr()).unwrap();

        assert!(b.receive_timeout(Duration::from_millis(500)).unwrap().is_none());
        assert_eq!(b.stats().malformed_dropped, 1);
    }

    #[test]
    fn test_simulated_loss_drops_everything() {
        let mut a = loopback();
        let mut b = loopback();
        a.set_loss_simulation(PacketLossSimulation::new(1.0));
        let message = Message::new(MessageHeader::new(1, 0, 1), MessagePayload::Ping);
        a.send_to(&message, b.local_addr()).unwrap();

        assert!(b.receive_timeout(Duration::from_millis(50)).unwrap().is_none());
        assert_eq!(a.stats().simulated_losses, 1);
        assert_eq!(a.stats().packets_sent, 0);
    }
}
