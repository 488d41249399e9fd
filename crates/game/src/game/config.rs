use std::time::Duration;

use rkyv::{Archive, Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Rules of a single game. Fixed once the game has started.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    pub food_static: u32,
    pub food_per_player: f64,
    pub iteration_delay_ms: u32,
    pub dead_food_prob: f64,
    pub ping_delay_ms: u32,
    pub node_timeout_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            food_static: 1,
            food_per_player: 1.0,
            iteration_delay_ms: 200,
            dead_food_prob: 0.1,
            ping_delay_ms: 100,
            node_timeout_ms: 800,
        }
    }
}

impl GameConfig {
    pub const MIN: GameConfig = GameConfig {
        width: 5,
        height: 5,
        food_static: 0,
        food_per_player: 0.0,
        iteration_delay_ms: 1,
        dead_food_prob: 0.0,
        ping_delay_ms: 1,
        node_timeout_ms: 1,
    };

    pub const MAX: GameConfig = GameConfig {
        width: 300,
        height: 300,
        food_static: 300,
        food_per_player: 300.0,
        iteration_delay_ms: 10_000,
        dead_food_prob: 1.0,
        ping_delay_ms: 10_000,
        node_timeout_ms: 10_000,
    };

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: i32,
        height: i32,
        food_static: u32,
        food_per_player: f64,
        iteration_delay_ms: u32,
        dead_food_prob: f64,
        ping_delay_ms: u32,
        node_timeout_ms: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            width,
            height,
            food_static,
            food_per_player,
            iteration_delay_ms,
            dead_food_prob,
            ping_delay_ms,
            node_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (&Self::MIN, &Self::MAX);
        check("width", self.width as f64, min.width as f64, max.width as f64)?;
        check(
            "height",
            self.height as f64,
            min.height as f64,
            max.height as f64,
        )?;
        check(
            "food_static",
            self.food_static as f64,
            min.food_static as f64,
            max.food_static as f64,
        )?;
        check(
            "food_per_player",
            self.food_per_player,
            min.food_per_player,
            max.food_per_player,
        )?;
        check(
            "iteration_delay_ms",
            self.iteration_delay_ms as f64,
            min.iteration_delay_ms as f64,
            max.iteration_delay_ms as f64,
        )?;
        check(
            "dead_food_prob",
            self.dead_food_prob,
            min.dead_food_prob,
            max.dead_food_prob,
        )?;
        check(
            "ping_delay_ms",
            self.ping_delay_ms as f64,
            min.ping_delay_ms as f64,
            max.ping_delay_ms as f64,
        )?;
        check(
            "node_timeout_ms",
            self.node_timeout_ms as f64,
            min.node_timeout_ms as f64,
            max.node_timeout_ms as f64,
        )
    }

    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms as u64)
    }

    pub fn ping_delay(&self) -> Duration {
        Duration::from_millis(self.ping_delay_ms as u64)
    }

    pub fn node_timeout(&self) -> Duration {
        Duration::from_millis(self.node_timeout_ms as u64)
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    // NaN fails both comparisons and is rejected here too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
