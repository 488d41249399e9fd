use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::config::GameConfig;
use super::player::{PlayerId, PlayerInfo};
use super::snake::{Coord, Direction, Snake};
use super::state::GameState;

/// Grace period between the death of the last snake and the next round.
pub const ROUND_RESTART_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    /// Every snake died; the board was reset and all players respawned.
    RoundRestarted,
}

/// Owns the authoritative [`GameState`] on the master and advances it.
pub struct Simulation {
    state: GameState,
    rng: StdRng,
}

impl Simulation {
    /// Fresh game with the master's snake placed and food laid out.
    pub fn new(config: GameConfig, master: PlayerInfo) -> Self {
        Self::with_rng(config, master, StdRng::from_os_rng())
    }

    pub fn with_rng(config: GameConfig, master: PlayerInfo, rng: StdRng) -> Self {
        let master_id = master.id;
        let mut simulation = Self {
            state: GameState::new(config, master),
            rng,
        };
        simulation.spawn_snake(master_id);
        simulation.replenish_food();
        simulation
    }

    /// Takes over a replicated snapshot, e.g. after a deputy promotion.
    pub fn from_state(state: GameState) -> Self {
        Self::from_state_with_rng(state, StdRng::from_os_rng())
    }

    pub fn from_state_with_rng(state: GameState, rng: StdRng) -> Self {
        Self { state, rng }
    }

    pub fn seeded(config: GameConfig, master: PlayerInfo, seed: u64) -> Self {
        Self::with_rng(config, master, StdRng::seed_from_u64(seed))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Registers a player. Non-viewers get a snake; when no spawn cell exists
    /// nothing is changed and `false` is returned.
    pub fn add_player(&mut self, player: PlayerInfo) -> bool {
        let id = player.id;
        if player.is_viewer() {
            self.state.players.insert(id, player);
            return true;
        }
        let Some(snake) = self.place_snake(id) else {
            return false;
        };
        self.state.players.insert(id, player);
        self.state.snakes.insert(id, snake);
        true
    }

    pub fn spawn_snake(&mut self, player_id: PlayerId) -> bool {
        match self.place_snake(player_id) {
            Some(snake) => {
                self.state.snakes.insert(player_id, snake);
                true
            }
            None => false,
        }
    }

    fn place_snake(&mut self, player_id: PlayerId) -> Option<Snake> {
        let candidates = self.state.spawn_candidates();
        let head = *candidates.choose(&mut self.rng)?;
        let direction = *Direction::ALL.choose(&mut self.rng)?;
        Some(Snake::new(player_id, head, direction))
    }

    pub fn tick(&mut self) -> TickOutcome {
        let (width, height) = (self.state.config.width, self.state.config.height);
        self.state.state_id += 1;

        for snake in self.state.snakes.values_mut() {
            snake.advance(width, height);
        }

        let grown = self.consume_food();

        for (id, snake) in self.state.snakes.iter_mut() {
            if !grown.contains(id) {
                snake.retract_tail();
            }
        }

        let crashed = self.detect_collisions();
        for id in crashed {
            self.kill_snake(id);
        }

        if self.state.snakes.is_empty() {
            self.restart_round();
            return TickOutcome::RoundRestarted;
        }

        self.replenish_food();
        TickOutcome::Advanced
    }

    fn consume_food(&mut self) -> BTreeSet<PlayerId> {
        let heads: Vec<(PlayerId, Coord, bool)> = self
            .state
            .snakes
            .values()
            .map(|s| (s.player_id(), s.head(), s.is_alive()))
            .collect();

        let mut grown = BTreeSet::new();
        let players = &mut self.state.players;
        self.state.foods.retain(|food| {
            let mut eaten = false;
            for (id, head, alive) in &heads {
                if head != food {
                    continue;
                }
                eaten = true;
                grown.insert(*id);
                if *alive {
                    if let Some(player) = players.get_mut(id) {
                        player.increment_score();
                    }
                }
            }
            !eaten
        });
        grown
    }

    /// Heads are tested against every body, their own included. A snake that
    /// crashes credits the first living snake it ran into, in id order; two
    /// heads meeting credit each other.
    fn detect_collisions(&mut self) -> Vec<PlayerId> {
        let (width, height) = (self.state.config.width, self.state.config.height);
        let bodies: Vec<(PlayerId, Coord, bool, HashSet<Coord>)> = self
            .state
            .snakes
            .values()
            .map(|s| {
                (
                    s.player_id(),
                    s.head(),
                    s.is_alive(),
                    s.cells(width, height).skip(1).collect(),
                )
            })
            .collect();

        let mut crashed = Vec::new();
        let mut credited = Vec::new();
        for (id, head, _, _) in &bodies {
            for (other_id, other_head, other_alive, other_body) in &bodies {
                let hit = if id == other_id {
                    other_body.contains(head)
                } else {
                    other_head == head || other_body.contains(head)
                };
                if hit {
                    crashed.push(*id);
                    if id != other_id && *other_alive {
                        credited.push(*other_id);
                    }
                    break;
                }
            }
        }

        for id in credited {
            if let Some(player) = self.state.players.get_mut(&id) {
                player.increment_score();
            }
        }
        crashed
    }

    fn kill_snake(&mut self, id: PlayerId) {
        let Some(snake) = self.state.snakes.remove(&id) else {
            return;
        };
        let (width, height) = (self.state.config.width, self.state.config.height);
        let chance = self.state.config.dead_food_prob;
        for cell in snake.cells(width, height) {
            if self.rng.random_bool(chance) && !self.state.foods.contains(&cell) {
                self.state.foods.push(cell);
            }
        }
        if snake.is_alive() {
            if let Some(player) = self.state.players.get_mut(&id) {
                player.reset_score();
            }
        }
        debug!("Snake {} crashed", id);
    }

    fn restart_round(&mut self) {
        self.state.foods.clear();
        self.state.state_id = 0;
        self.state.round = self.state.round.wrapping_add(1);

        let ids: Vec<PlayerId> = self
            .state
            .players
            .values()
            .filter(|p| !p.is_viewer())
            .map(|p| p.id)
            .collect();
        for id in ids {
            if !self.spawn_snake(id) {
                debug!("No room to respawn player {}", id);
            }
        }
        self.replenish_food();
        info!(
            "Round {} started with {} snakes",
            self.state.round,
            self.state.snakes.len()
        );
    }

    pub fn replenish_food(&mut self) {
        let target = self.state.food_target();
        let current = self.state.foods.len();
        if current >= target {
            return;
        }
        let empty = self.state.empty_cells();
        let needed = (target - current).min(empty.len());
        let chosen: Vec<Coord> = empty.choose_multiple(&mut self.rng, needed).copied().collect();
        self.state.foods.extend(chosen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::{NodeRole, PlayerType};
    use crate::game::snake::SnakeState;

    fn config(width: i32, height: i32) -> GameConfig {
        GameConfig {
            width,
            height,
            food_static: 0,
            food_per_player: 0.0,
            dead_food_prob: 0.0,
            ..GameConfig::default()
        }
    }

    fn master() -> PlayerInfo {
        PlayerInfo::new(0, "master", None, NodeRole::Master, PlayerType::Human)
    }

    fn normal(id: PlayerId) -> PlayerInfo {
        PlayerInfo::new(id, format!("p{}", id), None, NodeRole::Normal, PlayerType::Human)
    }

    /// Simulation with hand-placed snakes and no food.
    fn arranged(config: GameConfig, snakes: Vec<Snake>) -> Simulation {
        let mut state = GameState::new(config, master());
        for snake in snakes {
            let id = snake.player_id();
            if id != 0 {
                state.players.insert(id, normal(id));
            }
            state.snakes.insert(id, snake);
        }
        Simulation::from_state_with_rng(state, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_new_game_spawns_master_and_food() {
        let config = GameConfig {
            food_static: 3,
            food_per_player: 2.0,
            ..GameConfig::default()
        };
        let sim = Simulation::seeded(config, master(), 1);
        assert_eq!(sim.state().snakes.len(), 1);
        assert_eq!(sim.state().foods.len(), 5);
        assert_eq!(sim.state().state_id, 0);
    }

    #[test]
    fn test_state_id_strictly_increases() {
        let mut sim = Simulation::seeded(GameConfig::default(), master(), 2);
        let mut last = sim.state().freshness();
        for _ in 0..50 {
            sim.tick();
            assert!(sim.state().freshness() > last);
            last = sim.state().freshness();
        }
    }

    #[test]
    fn test_head_wraps_left_edge() {
        let snake = Snake::new(0, Coord::new(0, 0), Direction::Left);
        let mut sim = arranged(config(10, 10), vec![snake]);
        sim.tick();
        assert_eq!(sim.state().snakes[&0].head(), Coord::new(9, 0));
    }

    #[test]
    fn test_heads_stay_on_board() {
        let mut sim = Simulation::seeded(config(7, 7), master(), 3);
        let directions = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];
        for step in 0..200 {
            sim.state_mut().steer(0, directions[step % 4]);
            sim.tick();
            for snake in sim.state().snakes.values() {
                let head = snake.head();
                assert!((0..7).contains(&head.x) && (0..7).contains(&head.y));
            }
        }
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let snake = Snake::new(0, Coord::new(5, 5), Direction::Right);
        let mut sim = arranged(config(20, 20), vec![snake]);
        sim.state_mut().foods.push(Coord::new(6, 5));
        sim.tick();

        let state = sim.state();
        assert!(state.foods.is_empty());
        assert_eq!(state.snakes[&0].length(), 3);
        assert_eq!(state.players[&0].score, 1);

        sim.tick();
        assert_eq!(sim.state().snakes[&0].length(), 3);
    }

    #[test]
    fn test_zombie_eats_without_score() {
        let mut sim = arranged(
            config(20, 20),
            vec![
                Snake::new(0, Coord::new(2, 2), Direction::Down),
                Snake::new(1, Coord::new(10, 10), Direction::Right),
            ],
        );
        sim.state_mut().remove_player(1);
        sim.state_mut().foods.push(Coord::new(11, 10));
        sim.tick();

        let zombie = &sim.state().snakes[&1];
        assert_eq!(zombie.state(), SnakeState::Zombie);
        assert_eq!(zombie.length(), 3);
        assert!(sim.state().foods.is_empty());
    }

    #[test]
    fn test_head_into_body_kills_and_credits_other() {
        // snake 1 runs up into the middle of snake 0's horizontal body
        let long = Snake::from_waypoints(0, Coord::new(10, 5), vec![Coord::new(-6, 0)], Direction::Right)
            .unwrap();
        let attacker = Snake::new(1, Coord::new(7, 6), Direction::Up);
        let mut sim = arranged(config(20, 20), vec![long, attacker]);
        sim.state_mut().player_mut(1).unwrap().score = 4;

        sim.tick();
        let state = sim.state();
        assert!(state.snakes.contains_key(&0));
        assert!(!state.snakes.contains_key(&1));
        assert_eq!(state.players[&0].score, 1);
        assert_eq!(state.players[&1].score, 0);
    }

    #[test]
    fn test_self_collision() {
        // a tight loop: head at (5,5) moving down into its own body at (5,6)
        let snake = Snake::from_waypoints(
            0,
            Coord::new(5, 5),
            vec![Coord::new(1, 0), Coord::new(0, 1), Coord::new(-1, 0), Coord::new(0, 1)],
            Direction::Down,
        )
        .unwrap();
        let other = Snake::new(1, Coord::new(15, 15), Direction::Up);
        let mut sim = arranged(config(20, 20), vec![snake, other]);
        sim.tick();
        assert!(!sim.state().snakes.contains_key(&0));
        assert!(sim.state().snakes.contains_key(&1));
    }

    #[test]
    fn test_head_to_head_kills_both() {
        let a = Snake::new(1, Coord::new(4, 5), Direction::Right);
        let b = Snake::new(2, Coord::new(6, 5), Direction::Left);
        let bystander = Snake::new(0, Coord::new(15, 15), Direction::Up);
        let mut sim = arranged(config(20, 20), vec![a, b, bystander]);
        sim.state_mut().player_mut(1).unwrap().score = 3;
        sim.state_mut().player_mut(2).unwrap().score = 2;

        assert_eq!(sim.tick(), TickOutcome::Advanced);
        let state = sim.state();
        assert_eq!(state.snakes.len(), 1);
        assert_eq!(state.players[&1].score, 0);
        assert_eq!(state.players[&2].score, 0);
    }

    #[test]
    fn test_dead_body_turns_into_food() {
        let a = Snake::from_waypoints(1, Coord::new(4, 5), vec![Coord::new(-3, 0)], Direction::Right)
            .unwrap();
        let b = Snake::new(2, Coord::new(6, 5), Direction::Left);
        let bystander = Snake::new(0, Coord::new(15, 15), Direction::Up);
        let mut cfg = config(20, 20);
        cfg.dead_food_prob = 1.0;
        let mut sim = arranged(cfg, vec![a, b, bystander]);

        sim.tick();
        // both bodies share the collision cell, which yields one food
        let foods = &sim.state().foods;
        assert_eq!(foods.len(), 4 + 2 - 1);
        assert!(foods.contains(&Coord::new(5, 5)));
        assert!(foods.contains(&Coord::new(2, 5)));
    }

    #[test]
    fn test_all_dead_restarts_round() {
        let a = Snake::new(1, Coord::new(4, 5), Direction::Right);
        let b = Snake::new(2, Coord::new(6, 5), Direction::Left);
        let mut cfg = config(30, 30);
        cfg.food_static = 2;
        cfg.food_per_player = 1.0;
        cfg.dead_food_prob = 1.0;
        let mut sim = arranged(cfg, vec![a, b]);
        sim.state_mut().remove_player(0);
        sim.state_mut().state_id = 41;

        assert_eq!(sim.tick(), TickOutcome::RoundRestarted);
        let state = sim.state();
        assert_eq!(state.state_id, 0);
        assert_eq!(state.round, 1);
        assert_eq!(state.snakes.len(), 2);
        assert!(state.snakes.values().all(|s| s.length() == 2));
        assert_eq!(state.foods.len(), state.food_target());
        assert_eq!(state.foods.len(), 4);
    }

    #[test]
    fn test_food_never_exceeds_empty_cells() {
        let mut cfg = config(5, 5);
        cfg.food_static = 300;
        let sim = Simulation::seeded(cfg, master(), 4);
        assert_eq!(sim.state().foods.len(), 23);
        assert!(sim.state().empty_cells().is_empty());
    }

    #[test]
    fn test_food_converges_to_target() {
        let mut cfg = config(40, 40);
        cfg.food_static = 5;
        cfg.food_per_player = 2.0;
        let mut sim = Simulation::seeded(cfg, master(), 5);
        for _ in 0..20 {
            sim.tick();
            let state = sim.state();
            assert_eq!(state.foods.len(), state.food_target());
        }
    }

    #[test]
    fn test_add_player_rejected_without_room() {
        let mut sim = Simulation::seeded(config(5, 5), master(), 6);
        let before = sim.snapshot();
        assert!(!sim.add_player(normal(1)));
        assert_eq!(sim.state(), &before);
    }

    #[test]
    fn test_viewer_gets_no_snake() {
        let mut sim = Simulation::seeded(config(5, 5), master(), 6);
        let viewer = PlayerInfo::new(1, "v", None, NodeRole::Viewer, PlayerType::Human);
        assert!(sim.add_player(viewer));
        assert!(sim.state().players.contains_key(&1));
        assert!(!sim.state().snakes.contains_key(&1));
    }
}
