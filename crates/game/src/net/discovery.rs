use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use super::endpoint::NetworkEndpoint;
use super::protocol::{MULTICAST_GROUP, MULTICAST_PORT, MessagePayload};
use crate::presentation::{OUTDATED_AFTER, Presenter};

/// Longest single socket wait, bounding how late a shutdown is noticed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Listens for multicast announcements and keeps the presenter's list of
/// joinable games current.
pub struct DiscoveryListener {
    endpoint: NetworkEndpoint,
    presenter: Arc<dyn Presenter>,
    running: Arc<AtomicBool>,
    prune_interval: Duration,
    last_prune: Instant,
}

impl DiscoveryListener {
    pub fn bind(presenter: Arc<dyn Presenter>) -> io::Result<Self> {
        Self::bind_group(MULTICAST_GROUP, MULTICAST_PORT, presenter)
    }

    pub fn bind_group(
        group: Ipv4Addr,
        port: u16,
        presenter: Arc<dyn Presenter>,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
        socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        info!("Listening for games on {}:{}", group, port);
        Ok(Self::from_endpoint(
            NetworkEndpoint::from_socket(socket)?,
            presenter,
        ))
    }

    /// Listener over an existing endpoint, e.g. a unicast loopback socket.
    pub fn from_endpoint(endpoint: NetworkEndpoint, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            endpoint,
            presenter,
            running: Arc::new(AtomicBool::new(true)),
            prune_interval: OUTDATED_AFTER,
            last_prune: Instant::now(),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn poll_once(&mut self) -> io::Result<()> {
        let prune_at = self.last_prune + self.prune_interval;
        let wait = prune_at
            .saturating_duration_since(Instant::now())
            .min(POLL_INTERVAL);

        if let Some((message, source)) = self.endpoint.receive_timeout(wait)? {
            match &message.payload {
                MessagePayload::Announcement(announcement) => {
                    trace!("Announcement from {}", source);
                    self.presenter.process_announcement(announcement, source);
                }
                other => debug!("Ignoring {} on discovery socket", other.kind()),
            }
        }

        if Instant::now() >= prune_at {
            self.presenter.remove_outdated_games();
            self.last_prune = Instant::now();
        }
        Ok(())
    }

    pub fn run(&mut self) -> io::Result<()> {
        let result = loop {
            if !self.running.load(Ordering::SeqCst) {
                break Ok(());
            }
            if let Err(e) = self.poll_once() {
                break Err(e);
            }
        };
        self.presenter.clear_joinable_games();
        result
    }

    pub fn spawn(mut self) -> io::Result<(Arc<AtomicBool>, JoinHandle<io::Result<()>>)> {
        let running = self.running();
        let handle = thread::Builder::new()
            .name("discovery".into())
            .spawn(move || self.run())?;
        Ok((running, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, GameState, NodeRole, PlayerInfo, PlayerType};
    use crate::net::protocol::{Announcement, Message, MessageHeader};
    use crate::presentation::JoinableGames;

    #[derive(Default)]
    struct ListPresenter {
        games: JoinableGames,
    }

    impl Presenter for ListPresenter {
        fn paint_state(&self, _state: GameState) {}

        fn show_error_message(&self, _reason: &str) {}

        fn process_announcement(&self, announcement: &Announcement, source: SocketAddr) {
            self.games.record(announcement, source);
        }

        fn remove_outdated_games(&self) {
            self.games.remove_outdated();
        }

        fn clear_joinable_games(&self) {
            self.games.clear();
        }
    }

    #[test]
    fn test_announcements_reach_presenter() {
        let presenter = Arc::new(ListPresenter::default());
        let endpoint = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let mut listener = DiscoveryListener::from_endpoint(endpoint, presenter.clone());

        let mut master = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let host = PlayerInfo::new(0, "host", None, NodeRole::Master, PlayerType::Human);
        let state = GameState::new(GameConfig::default(), host);
        let message = Message::new(
            MessageHeader::new(1, 0, 0),
            MessagePayload::Announcement(Announcement::from_state(&state)),
        );
        master.send_to(&message, listener.local_addr()).unwrap();

        listener.poll_once().unwrap();
        let games = presenter.games.list();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].source, master.local_addr());

        listener.shutdown();
        listener.run().unwrap();
        assert!(presenter.games.is_empty());
    }
}
