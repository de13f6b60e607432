use crate::constants::ARRIVAL_EPSILON;
use crate::movement::{is_step_legal, LevelGeometry};
use crate::types::{AxisInput, Direction, Position};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    pub position: Position,
    pub arrived: bool,
    pub redirected: bool,
}

/// Cell-by-cell motion for the controlled agent.
///
/// The agent always travels toward a grid-aligned destination. Direction changes are only
/// considered on arrival, so a buffered turn is taken at the first cell where it is legal.
#[derive(Clone, Debug)]
pub struct AgentMotionController {
    current: Position,
    destination: Position,
    committed: Direction,
    buffered: Direction,
    speed: f32,
}

impl AgentMotionController {
    pub fn new(spawn: Position, speed: f32) -> Self {
        Self {
            current: spawn,
            destination: spawn,
            committed: Direction::None,
            buffered: Direction::None,
            speed,
        }
    }

    pub fn position(&self) -> Position {
        self.current
    }

    pub fn destination(&self) -> Position {
        self.destination
    }

    pub fn committed_direction(&self) -> Direction {
        self.committed
    }

    pub fn buffered_direction(&self) -> Direction {
        self.buffered
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn add_speed(&mut self, bonus: f32) {
        self.speed += bonus;
    }

    pub fn reset_to(&mut self, spawn: Position) {
        self.current = spawn;
        self.destination = spawn;
        self.committed = Direction::None;
        self.buffered = Direction::None;
    }

    pub fn read_input(&mut self, input: AxisInput) {
        if input.horizontal > 0.0 {
            self.buffered = Direction::Right;
        }
        if input.horizontal < 0.0 {
            self.buffered = Direction::Left;
        }
        if input.vertical > 0.0 {
            self.buffered = Direction::Up;
        }
        if input.vertical < 0.0 {
            self.buffered = Direction::Down;
        }
    }

    pub fn tick<G: LevelGeometry + ?Sized>(
        &mut self,
        geometry: &G,
        input: AxisInput,
        dt_sec: f32,
    ) -> MotionStep {
        self.current = self
            .current
            .move_towards(self.destination, self.speed.max(0.0) * dt_sec);
        self.read_input(input);

        if self.current.distance(self.destination) >= ARRIVAL_EPSILON {
            return MotionStep {
                position: self.current,
                arrived: false,
                redirected: false,
            };
        }

        self.current = self.destination;
        let previous = self.committed;
        if is_step_legal(geometry, self.current, self.buffered) {
            self.committed = self.buffered;
            self.destination = self.current + self.committed.unit();
        } else if is_step_legal(geometry, self.current, self.committed) {
            self.destination = self.current + self.committed.unit();
        } else {
            self.destination = self.current;
        }

        MotionStep {
            position: self.current,
            arrived: true,
            redirected: previous != self.committed,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::constants::AGENT_SPAWN;
    use crate::maze::Maze;

    const DT: f32 = 0.02;

    fn plus_maze() -> Maze {
        Maze::parse(&[
            "#######",
            "###.###",
            "###.###",
            "#.....#",
            "###.###",
            "###.###",
            "#######",
        ])
        .expect("valid maze")
    }

    fn run_until_arrival(
        controller: &mut AgentMotionController,
        maze: &Maze,
        input: AxisInput,
    ) -> MotionStep {
        for _ in 0..1_000 {
            let step = controller.tick(maze, input, DT);
            if step.arrived {
                return step;
            }
        }
        panic!("agent never arrived");
    }

    #[test]
    fn stationary_agent_commits_buffered_direction_immediately() {
        let maze = plus_maze();
        let mut controller = AgentMotionController::new(Position::new(3.0, 3.0), 5.0);
        let step = controller.tick(&maze, AxisInput::from_direction(Direction::Left), DT);
        assert!(step.arrived);
        assert!(step.redirected);
        assert_eq!(controller.committed_direction(), Direction::Left);
        assert_eq!(controller.destination(), Position::new(2.0, 3.0));
    }

    #[test]
    fn buffered_turn_waits_for_cell_arrival() {
        let maze = plus_maze();
        let mut controller = AgentMotionController::new(Position::new(1.0, 3.0), 5.0);
        controller.tick(&maze, AxisInput::from_direction(Direction::Right), DT);
        assert_eq!(controller.destination(), Position::new(2.0, 3.0));

        // Up is illegal at x=2, so the agent keeps heading right until the junction.
        let up = AxisInput::from_direction(Direction::Up);
        run_until_arrival(&mut controller, &maze, up);
        assert_eq!(controller.position(), Position::new(2.0, 3.0));
        assert_eq!(controller.committed_direction(), Direction::Right);
        assert_eq!(controller.buffered_direction(), Direction::Up);

        let step = run_until_arrival(&mut controller, &maze, AxisInput::default());
        assert_eq!(step.position, Position::new(3.0, 3.0));
        assert!(step.redirected);
        assert_eq!(controller.committed_direction(), Direction::Up);
        assert_eq!(controller.destination(), Position::new(3.0, 2.0));
    }

    #[test]
    fn agent_stops_at_wall_when_nothing_is_legal() {
        let maze = plus_maze();
        let mut controller = AgentMotionController::new(Position::new(4.0, 3.0), 5.0);
        controller.tick(&maze, AxisInput::from_direction(Direction::Right), DT);
        run_until_arrival(&mut controller, &maze, AxisInput::default());
        assert_eq!(controller.position(), Position::new(5.0, 3.0));
        assert_eq!(controller.destination(), controller.position());
        assert_eq!(controller.committed_direction(), Direction::Right);
    }

    #[test]
    fn movement_never_overshoots_destination() {
        let maze = plus_maze();
        let mut controller = AgentMotionController::new(Position::new(3.0, 3.0), 500.0);
        controller.tick(&maze, AxisInput::from_direction(Direction::Down), DT);
        let step = controller.tick(&maze, AxisInput::default(), DT);
        assert_eq!(step.position, Position::new(3.0, 4.0));
    }

    #[test]
    fn vertical_input_wins_when_both_axes_are_pressed() {
        let mut controller = AgentMotionController::new(Position::new(3.0, 3.0), 5.0);
        controller.read_input(AxisInput {
            horizontal: 1.0,
            vertical: -1.0,
        });
        assert_eq!(controller.buffered_direction(), Direction::Down);
        controller.read_input(AxisInput::default());
        assert_eq!(controller.buffered_direction(), Direction::Down);
    }

    #[test]
    fn destination_is_always_a_legal_step_from_the_previous_one() {
        let maze = Maze::builtin().expect("builtin parses");
        let mut rng = StdRng::seed_from_u64(7);
        let mut controller = AgentMotionController::new(AGENT_SPAWN, 9.0);
        let mut previous = controller.destination();
        let dirs = [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ];
        for _ in 0..5_000 {
            let input = AxisInput::from_direction(dirs[rng.random_range(0..dirs.len())]);
            controller.tick(&maze, input, DT);
            let next = controller.destination();
            if next != previous {
                let legal = dirs.iter().any(|dir| {
                    previous + dir.unit() == next && is_step_legal(&maze, previous, *dir)
                });
                assert!(legal, "illegal hop {previous:?} -> {next:?}");
                previous = next;
            }
            assert!(maze.is_passable(controller.position()));
        }
    }

    #[test]
    fn reset_returns_to_spawn_without_direction() {
        let maze = plus_maze();
        let mut controller = AgentMotionController::new(Position::new(3.0, 3.0), 5.0);
        controller.tick(&maze, AxisInput::from_direction(Direction::Up), DT);
        controller.reset_to(Position::new(3.0, 3.0));
        assert_eq!(controller.destination(), Position::new(3.0, 3.0));
        assert_eq!(controller.committed_direction(), Direction::None);
        assert_eq!(controller.buffered_direction(), Direction::None);
    }
}
