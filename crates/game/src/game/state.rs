use std::collections::BTreeMap;

use rkyv::{Archive, Deserialize, Serialize};

use super::config::{ConfigError, GameConfig};
use super::player::{NodeRole, PlayerId, PlayerInfo};
use super::snake::{Coord, Direction, Snake};

/// Radius of the empty square required around a freshly spawned head.
pub const SPAWN_CLEARANCE: i32 = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("snake {0} has a malformed body")]
    MalformedSnake(PlayerId),
}

/// Authoritative world snapshot, replicated from the master to every peer.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct GameState {
    pub state_id: u64,
    /// Incremented on every round restart, when `state_id` goes back to zero.
    pub round: u32,
    pub players: BTreeMap<PlayerId, PlayerInfo>,
    pub snakes: BTreeMap<PlayerId, Snake>,
    pub foods: Vec<Coord>,
    pub config: GameConfig,
}

impl GameState {
    pub fn new(config: GameConfig, master: PlayerInfo) -> Self {
        let mut players = BTreeMap::new();
        players.insert(master.id, master);
        Self {
            state_id: 0,
            round: 0,
            players,
            snakes: BTreeMap::new(),
            foods: Vec::new(),
            config,
        }
    }

    /// Rejects snapshots the simulation cannot run on.
    pub fn validate(&self) -> Result<(), StateError> {
        self.config.validate()?;
        let (width, height) = (self.config.width, self.config.height);
        match self
            .snakes
            .iter()
            .find(|(_, snake)| !snake.is_well_formed(width, height))
        {
            Some((id, _)) => Err(StateError::MalformedSnake(*id)),
            None => Ok(()),
        }
    }

    /// Ordering key used to discard stale snapshots.
    pub fn freshness(&self) -> (u32, u64) {
        (self.round, self.state_id)
    }

    pub fn is_newer_than(&self, other: &GameState) -> bool {
        self.freshness() > other.freshness()
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerInfo> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerInfo> {
        self.players.get_mut(&id)
    }

    pub fn player_with_role(&self, role: NodeRole) -> Option<&PlayerInfo> {
        self.players.values().find(|p| p.role == role)
    }

    pub fn master(&self) -> Option<&PlayerInfo> {
        self.player_with_role(NodeRole::Master)
    }

    pub fn deputy(&self) -> Option<&PlayerInfo> {
        self.player_with_role(NodeRole::Deputy)
    }

    pub fn set_role(&mut self, id: PlayerId, role: NodeRole) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.role = role;
                true
            }
            None => false,
        }
    }

    /// Smallest id held by neither a player nor a (possibly zombie) snake.
    pub fn next_free_id(&self) -> PlayerId {
        (0..)
            .find(|id| !self.players.contains_key(id) && !self.snakes.contains_key(id))
            .unwrap_or(PlayerId::MAX)
    }

    pub fn alive_snake_count(&self) -> usize {
        self.snakes.values().filter(|s| s.is_alive()).count()
    }

    /// Drops the player from the roster. Its snake stays on the board as a zombie.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<PlayerInfo> {
        if let Some(snake) = self.snakes.get_mut(&id) {
            snake.make_zombie();
        }
        self.players.remove(&id)
    }

    pub fn steer(&mut self, id: PlayerId, direction: Direction) -> bool {
        match self.snakes.get_mut(&id) {
            Some(snake) if snake.is_alive() => snake.steer(direction),
            _ => false,
        }
    }

    pub fn occupancy(&self) -> Occupancy {
        let mut grid = Occupancy::new(self.config.width, self.config.height);
        for food in &self.foods {
            grid.mark(*food);
        }
        for snake in self.snakes.values() {
            for cell in snake.cells(self.config.width, self.config.height) {
                grid.mark(cell);
            }
        }
        grid
    }

    /// Cells holding neither food nor any snake segment.
    pub fn empty_cells(&self) -> Vec<Coord> {
        self.occupancy().free_cells().collect()
    }

    /// Empty cells whose whole 5×5 neighbourhood is empty as well.
    pub fn spawn_candidates(&self) -> Vec<Coord> {
        let grid = self.occupancy();
        grid.free_cells()
            .filter(|cell| grid.is_clear_around(*cell, SPAWN_CLEARANCE))
            .collect()
    }

    pub fn can_place_snake(&self) -> bool {
        let grid = self.occupancy();
        grid.free_cells()
            .any(|cell| grid.is_clear_around(cell, SPAWN_CLEARANCE))
    }

    pub fn food_target(&self) -> usize {
        self.config.food_static as usize
            + (self.alive_snake_count() as f64 * self.config.food_per_player) as usize
    }
}

/// Dense occupied-cell bitmap of a toroidal board.
pub struct Occupancy {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Occupancy {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    fn index(&self, cell: Coord) -> usize {
        let cell = cell.wrapped(self.width, self.height);
        cell.y as usize * self.width as usize + cell.x as usize
    }

    pub fn mark(&mut self, cell: Coord) {
        let index = self.index(cell);
        self.cells[index] = true;
    }

    pub fn is_occupied(&self, cell: Coord) -> bool {
        self.cells[self.index(cell)]
    }

    pub fn is_clear_around(&self, center: Coord, radius: i32) -> bool {
        (-radius..=radius).all(|dy| {
            (-radius..=radius)
                .all(|dx| !self.is_occupied(Coord::new(center.x + dx, center.y + dy)))
        })
    }

    pub fn free_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .map(move |(i, _)| Coord::new(i as i32 % width, i as i32 / width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::PlayerType;

    fn state(width: i32, height: i32) -> GameState {
        let config = GameConfig {
            width,
            height,
            ..GameConfig::default()
        };
        let master = PlayerInfo::new(0, "master", None, NodeRole::Master, PlayerType::Human);
        GameState::new(config, master)
    }

    #[test]
    fn test_validate_checks_config_and_snakes() {
        let mut s = state(10, 10);
        s.snakes
            .insert(0, Snake::new(0, Coord::new(4, 4), Direction::Up));
        assert_eq!(s.validate(), Ok(()));

        s.config.ping_delay_ms = 0;
        assert!(matches!(s.validate(), Err(StateError::Config(_))));
    }

    #[test]
    fn test_freshness_orders_round_before_state_id() {
        let mut a = state(10, 10);
        let mut b = state(10, 10);
        a.state_id = 50;
        b.round = 1;
        b.state_id = 0;
        assert!(b.is_newer_than(&a));
        assert!(!a.is_newer_than(&b));
        assert!(!a.is_newer_than(&a.clone()));
    }

    #[test]
    fn test_next_free_id_skips_zombie_snakes() {
        let mut s = state(10, 10);
        s.players.insert(
            1,
            PlayerInfo::new(1, "a", None, NodeRole::Normal, PlayerType::Human),
        );
        s.snakes
            .insert(2, Snake::new(2, Coord::new(5, 5), Direction::Up));
        assert_eq!(s.next_free_id(), 3);

        s.players.remove(&1);
        assert_eq!(s.next_free_id(), 1);
    }

    #[test]
    fn test_remove_player_leaves_zombie() {
        let mut s = state(10, 10);
        s.snakes
            .insert(0, Snake::new(0, Coord::new(5, 5), Direction::Up));
        let removed = s.remove_player(0).unwrap();
        assert_eq!(removed.id, 0);
        assert!(s.players.is_empty());
        assert!(!s.snakes[&0].is_alive());
    }

    #[test]
    fn test_empty_cells_exclude_food_and_bodies() {
        let mut s = state(5, 5);
        s.foods.push(Coord::new(0, 0));
        s.snakes
            .insert(0, Snake::new(0, Coord::new(2, 2), Direction::Right));
        let empty = s.empty_cells();
        assert_eq!(empty.len(), 25 - 3);
        assert!(!empty.contains(&Coord::new(0, 0)));
        assert!(!empty.contains(&Coord::new(1, 2)));
    }

    #[test]
    fn test_spawn_needs_clear_neighbourhood() {
        let mut s = state(5, 5);
        assert!(s.can_place_snake());
        assert_eq!(s.spawn_candidates().len(), 25);

        // on a 5x5 torus every neighbourhood covers the whole board
        s.foods.push(Coord::new(4, 4));
        assert!(!s.can_place_snake());
        assert!(s.spawn_candidates().is_empty());
    }

    #[test]
    fn test_neighbourhood_wraps() {
        let mut s = state(20, 20);
        s.foods.push(Coord::new(19, 19));
        let candidates = s.spawn_candidates();
        assert!(!candidates.contains(&Coord::new(0, 0)));
        assert!(!candidates.contains(&Coord::new(1, 1)));
        assert!(candidates.contains(&Coord::new(2, 2)));
    }

    #[test]
    fn test_food_target() {
        let mut s = state(10, 10);
        s.config.food_static = 2;
        s.config.food_per_player = 1.5;
        s.snakes
            .insert(0, Snake::new(0, Coord::new(1, 1), Direction::Up));
        s.snakes
            .insert(1, Snake::new(1, Coord::new(5, 5), Direction::Up));
        assert_eq!(s.food_target(), 5);
        s.snakes.get_mut(&1).unwrap().make_zombie();
        assert_eq!(s.food_target(), 3);
    }
}
