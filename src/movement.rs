use crate::constants::{STEP_PROBE_FACTOR, STEP_PROBE_RESOLUTION};
use crate::types::{Direction, Position};

pub trait LevelGeometry {
    /// Open corridor or a collectible marker. Walls and anything off the map are not passable.
    fn is_passable(&self, position: Position) -> bool;
}

/// Whether the agent standing at `position` may take one step in `direction`.
///
/// Traces a probe from `position + direction * 1.45` back to `position`; every sample on the
/// way must be passable. The final sample is the agent's own footprint, which always counts as
/// clear, so `Direction::None` is legal anywhere.
pub fn is_step_legal<G: LevelGeometry + ?Sized>(
    geometry: &G,
    position: Position,
    direction: Direction,
) -> bool {
    if direction == Direction::None {
        return true;
    }
    let unit = direction.unit();
    let mut offset = STEP_PROBE_FACTOR;
    while offset > 0.0 {
        if !geometry.is_passable(position + unit.scale(offset)) {
            return false;
        }
        offset -= STEP_PROBE_RESOLUTION;
    }
    true
}
