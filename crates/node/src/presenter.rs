use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use log::{debug, error, info};
use snakes::{Announcement, GameState, JoinableGames, Presenter};

/// Headless presentation: keeps the latest snapshot and reports through the log.
#[derive(Default)]
pub struct LogPresenter {
    latest: Mutex<Option<GameState>>,
    games: JoinableGames,
}

impl LogPresenter {
    pub fn latest(&self) -> Option<GameState> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn games(&self) -> &JoinableGames {
        &self.games
    }
}

impl Presenter for LogPresenter {
    fn paint_state(&self, state: GameState) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.as_ref().is_none_or(|old| old.round != state.round) {
            info!(
                "Round {}: {} players, {} snakes",
                state.round,
                state.players.len(),
                state.snakes.len()
            );
        }
        debug!(
            "State {}: {} snakes, {} food, scores {:?}",
            state.state_id,
            state.snakes.len(),
            state.foods.len(),
            state
                .players
                .values()
                .map(|p| (p.name.as_str(), p.score))
                .collect::<Vec<_>>()
        );
        *latest = Some(state);
    }

    fn show_error_message(&self, reason: &str) {
        error!("{}", reason);
    }

    fn process_announcement(&self, announcement: &Announcement, source: SocketAddr) {
        if !self.games.list().iter().any(|g| g.source == source) {
            let host = announcement.master().map_or("?", |m| m.name.as_str());
            info!(
                "Found game by {} at {} ({}x{}, {} players{})",
                host,
                source,
                announcement.config.width,
                announcement.config.height,
                announcement.players.len(),
                if announcement.can_join { "" } else { ", full" }
            );
        }
        self.games.record(announcement, source);
    }

    fn remove_outdated_games(&self) {
        let removed = self.games.remove_outdated();
        if removed > 0 {
            debug!("Dropped {} silent games", removed);
        }
    }

    fn clear_joinable_games(&self) {
        self.games.clear();
    }
}
