use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use snakes::{Direction, GameState, NodeHandle, PlayerId};

use crate::presenter::LogPresenter;

/// Signed shortest offset from `from` to `to` on a ring of `size` cells.
fn ring_offset(from: i32, to: i32, size: i32) -> i32 {
    let forward = (to - from).rem_euclid(size);
    if forward * 2 > size {
        forward - size
    } else {
        forward
    }
}

/// Heads for the closest food, never into an occupied cell when another way is free.
pub fn choose_direction(state: &GameState, me: PlayerId) -> Option<Direction> {
    let snake = state.snakes.get(&me).filter(|s| s.is_alive())?;
    let (width, height) = (state.config.width, state.config.height);
    let head = snake.head();
    let occupancy = state.occupancy();

    let target = state
        .foods
        .iter()
        .min_by_key(|food| {
            ring_offset(head.x, food.x, width).abs() + ring_offset(head.y, food.y, height).abs()
        })
        .copied();

    let neck = snake.neck_direction();
    let is_safe = |direction: Direction| {
        let next = head.step(direction).wrapped(width, height);
        !occupancy.is_occupied(next) || state.foods.contains(&next)
    };

    let mut preferred = Vec::new();
    if let Some(food) = target {
        let dx = ring_offset(head.x, food.x, width);
        let dy = ring_offset(head.y, food.y, height);
        if dx > 0 {
            preferred.push(Direction::Right);
        } else if dx < 0 {
            preferred.push(Direction::Left);
        }
        if dy > 0 {
            preferred.push(Direction::Down);
        } else if dy < 0 {
            preferred.push(Direction::Up);
        }
    }
    preferred.push(snake.direction());
    preferred.extend(Direction::ALL);

    preferred
        .into_iter()
        .filter(|d| *d != neck)
        .find(|d| is_safe(*d))
        .or(Some(snake.direction()))
}

pub fn spawn(
    presenter: Arc<LogPresenter>,
    handle: NodeHandle,
    me: PlayerId,
    period: Duration,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new().name("robot".into()).spawn(move || {
        while handle.is_running() {
            if let Some(direction) = presenter
                .latest()
                .and_then(|state| choose_direction(&state, me))
            {
                if !handle.steer(direction) {
                    break;
                }
            }
            thread::sleep(period);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snakes::{Coord, GameConfig, NodeRole, PlayerInfo, PlayerType, Snake};

    fn state_with(snake: Snake, foods: Vec<Coord>) -> GameState {
        let config = GameConfig {
            width: 10,
            height: 10,
            ..GameConfig::default()
        };
        let me = PlayerInfo::new(0, "bot", None, NodeRole::Master, PlayerType::Robot);
        let mut state = GameState::new(config, me);
        state.snakes.insert(0, snake);
        state.foods = foods;
        state
    }

    #[test]
    fn test_ring_offset_takes_short_way() {
        assert_eq!(ring_offset(1, 8, 10), -3);
        assert_eq!(ring_offset(8, 1, 10), 3);
        assert_eq!(ring_offset(2, 4, 10), 2);
    }

    #[test]
    fn test_heads_towards_food() {
        let snake = Snake::new(0, Coord::new(5, 5), Direction::Up);
        let state = state_with(snake, vec![Coord::new(8, 5)]);
        assert_eq!(choose_direction(&state, 0), Some(Direction::Right));
    }

    #[test]
    fn test_food_behind_does_not_reverse() {
        let snake = Snake::new(0, Coord::new(5, 5), Direction::Up);
        let state = state_with(snake, vec![Coord::new(5, 7)]);
        let direction = choose_direction(&state, 0).unwrap();
        assert_ne!(direction, Direction::Down);
    }

    #[test]
    fn test_no_snake_no_direction() {
        let snake = Snake::new(0, Coord::new(5, 5), Direction::Up);
        let state = state_with(snake, vec![]);
        assert!(choose_direction(&state, 3).is_none());
    }
}
