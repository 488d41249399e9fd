use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::game::GameState;
use crate::net::Announcement;

/// Games not announced for this long are dropped from the joinable list.
pub const OUTDATED_AFTER: Duration = Duration::from_millis(3000);

/// Sink for everything a node wants to show. Implementations are called from
/// the controller and discovery threads, each with its own copy of the data.
pub trait Presenter: Send + Sync {
    fn paint_state(&self, state: GameState);

    fn show_error_message(&self, reason: &str);

    fn process_announcement(&self, announcement: &Announcement, source: SocketAddr);

    fn remove_outdated_games(&self);

    fn clear_joinable_games(&self);
}

#[derive(Debug, Clone)]
pub struct JoinableGame {
    pub source: SocketAddr,
    pub announcement: Announcement,
    pub last_seen: Instant,
}

/// Joinable games keyed by the announcing master's address.
#[derive(Debug)]
pub struct JoinableGames {
    games: Mutex<BTreeMap<SocketAddr, JoinableGame>>,
    outdated_after: Duration,
}

impl Default for JoinableGames {
    fn default() -> Self {
        Self::new(OUTDATED_AFTER)
    }
}

impl JoinableGames {
    pub fn new(outdated_after: Duration) -> Self {
        Self {
            games: Mutex::new(BTreeMap::new()),
            outdated_after,
        }
    }

    fn games(&self) -> MutexGuard<'_, BTreeMap<SocketAddr, JoinableGame>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, announcement: &Announcement, source: SocketAddr) {
        self.record_at(announcement, source, Instant::now());
    }

    pub fn record_at(&self, announcement: &Announcement, source: SocketAddr, now: Instant) {
        self.games().insert(
            source,
            JoinableGame {
                source,
                announcement: announcement.clone(),
                last_seen: now,
            },
        );
    }

    pub fn remove_outdated(&self) -> usize {
        self.remove_outdated_at(Instant::now())
    }

    pub fn remove_outdated_at(&self, now: Instant) -> usize {
        let mut games = self.games();
        let before = games.len();
        games.retain(|_, game| now.saturating_duration_since(game.last_seen) <= self.outdated_after);
        before - games.len()
    }

    pub fn clear(&self) {
        self.games().clear();
    }

    pub fn list(&self) -> Vec<JoinableGame> {
        self.games().values().cloned().collect()
    }

    pub fn first_joinable(&self) -> Option<JoinableGame> {
        self.games()
            .values()
            .find(|game| game.announcement.can_join)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.games().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, NodeRole, PlayerInfo, PlayerType};

    fn announcement(can_join: bool) -> Announcement {
        Announcement {
            players: vec![PlayerInfo::new(
                0,
                "host",
                None,
                NodeRole::Master,
                PlayerType::Human,
            )],
            config: GameConfig::default(),
            can_join,
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 1], port))
    }

    #[test]
    fn test_record_replaces_by_source() {
        let games = JoinableGames::default();
        games.record(&announcement(false), addr(1));
        games.record(&announcement(true), addr(1));
        assert_eq!(games.len(), 1);
        assert!(games.list()[0].announcement.can_join);
    }

    #[test]
    fn test_outdated_games_are_pruned() {
        let start = Instant::now();
        let games = JoinableGames::default();
        games.record_at(&announcement(true), addr(1), start);
        games.record_at(&announcement(true), addr(2), start + Duration::from_millis(2000));

        assert_eq!(games.remove_outdated_at(start + Duration::from_millis(3000)), 0);
        assert_eq!(games.remove_outdated_at(start + Duration::from_millis(3001)), 1);
        assert_eq!(games.list()[0].source, addr(2));
    }

    #[test]
    fn test_first_joinable_skips_full_games() {
        let games = JoinableGames::default();
        games.record(&announcement(false), addr(1));
        assert!(games.first_joinable().is_none());
        games.record(&announcement(true), addr(2));
        assert_eq!(games.first_joinable().unwrap().source, addr(2));
        games.clear();
        assert!(games.is_empty());
    }
}
