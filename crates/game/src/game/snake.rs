use rkyv::{Archive, Deserialize, Serialize};

use super::player::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn wrapped(self, width: i32, height: i32) -> Self {
        Self::new(self.x.rem_euclid(width), self.y.rem_euclid(height))
    }

    /// Direction of an axis-aligned relative offset.
    pub fn direction(self) -> Option<Direction> {
        match (self.x.signum(), self.y.signum()) {
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn manhattan(self) -> i32 {
        self.x.abs() + self.y.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn unit(self) -> Coord {
        let (dx, dy) = self.delta();
        Coord::new(dx, dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum SnakeState {
    Alive,
    Zombie,
}

/// Snake body stored as an absolute head plus turn-to-turn offsets.
///
/// `segments[0]` points from the head to the first turn point (or the tail),
/// each following entry from one turn point to the next. A straight run of any
/// length is a single entry. The list always holds at least one segment.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Snake {
    player_id: PlayerId,
    head: Coord,
    segments: Vec<Coord>,
    state: SnakeState,
    direction: Direction,
}

impl Snake {
    /// Two-cell snake heading `direction` with its tail right behind the head.
    pub fn new(player_id: PlayerId, head: Coord, direction: Direction) -> Self {
        Self {
            player_id,
            head,
            segments: vec![direction.opposite().unit()],
            state: SnakeState::Alive,
            direction,
        }
    }

    /// Builds a snake from explicit waypoints. Returns `None` when `segments`
    /// is empty or contains a zero-length or diagonal offset.
    pub fn from_waypoints(
        player_id: PlayerId,
        head: Coord,
        segments: Vec<Coord>,
        direction: Direction,
    ) -> Option<Self> {
        if segments.is_empty() || segments.iter().any(|s| s.direction().is_none()) {
            return None;
        }
        Some(Self {
            player_id,
            head,
            segments,
            state: SnakeState::Alive,
            direction,
        })
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn head(&self) -> Coord {
        self.head
    }

    pub fn segments(&self) -> &[Coord] {
        &self.segments
    }

    pub fn state(&self) -> SnakeState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == SnakeState::Alive
    }

    pub fn make_zombie(&mut self) {
        self.state = SnakeState::Zombie;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Body shape check for snakes received from the network: at least one
    /// segment, every segment axis-aligned, and the whole body fits the board.
    pub fn is_well_formed(&self, width: i32, height: i32) -> bool {
        let (width, height) = (width.unsigned_abs() as u64, height.unsigned_abs() as u64);
        if self.segments.is_empty() {
            return false;
        }
        let mut length = 1u64;
        for segment in &self.segments {
            let (dx, dy) = (segment.x.unsigned_abs() as u64, segment.y.unsigned_abs() as u64);
            if segment.direction().is_none() || dx > width || dy > height {
                return false;
            }
            length += dx + dy;
        }
        length <= width * height
    }

    pub fn length(&self) -> usize {
        1 + self.segments.iter().map(|s| s.manhattan() as usize).sum::<usize>()
    }

    /// Direction from the head towards the cell right behind it.
    pub fn neck_direction(&self) -> Direction {
        self.segments[0]
            .direction()
            .unwrap_or_else(|| self.direction.opposite())
    }

    /// Records the heading for the next move. Turning back into the neck is
    /// ignored, returning `false`.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if direction == self.neck_direction() {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Moves the head one cell. A pending heading that points into the neck is
    /// dropped and the snake keeps going straight.
    pub fn advance(&mut self, width: i32, height: i32) {
        let neck = self.neck_direction();
        let heading = if self.direction == neck {
            neck.opposite()
        } else {
            self.direction
        };
        self.direction = heading;

        if heading == neck.opposite() {
            let first = &mut self.segments[0];
            let unit = neck.unit();
            first.x += unit.x;
            first.y += unit.y;
        } else {
            self.segments.insert(0, heading.opposite().unit());
        }

        self.head = self.head.step(heading).wrapped(width, height);
    }

    /// Drops the last body cell.
    pub fn retract_tail(&mut self) {
        let Some(last) = self.segments.last_mut() else {
            return;
        };
        if last.manhattan() > 1 {
            last.x -= last.x.signum();
            last.y -= last.y.signum();
        } else if self.segments.len() > 1 {
            self.segments.pop();
        }
    }

    /// Every occupied cell, head first.
    pub fn cells(&self, width: i32, height: i32) -> BodyCells<'_> {
        BodyCells {
            segments: &self.segments,
            width,
            height,
            current: self.head,
            index: 0,
            remaining: 0,
            step: Coord::new(0, 0),
            started: false,
        }
    }
}

pub struct BodyCells<'a> {
    segments: &'a [Coord],
    width: i32,
    height: i32,
    current: Coord,
    index: usize,
    remaining: i32,
    step: Coord,
    started: bool,
}

impl Iterator for BodyCells<'_> {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if !self.started {
            self.started = true;
            return Some(self.current);
        }
        while self.remaining == 0 {
            let segment = *self.segments.get(self.index)?;
            self.index += 1;
            self.remaining = segment.manhattan();
            self.step = Coord::new(segment.x.signum(), segment.y.signum());
        }
        self.remaining -= 1;
        self.current = Coord::new(self.current.x + self.step.x, self.current.y + self.step.y)
            .wrapped(self.width, self.height);
        Some(self.current)
    }
}
