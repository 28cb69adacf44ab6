use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{GridCoord, GridGraph, WorldPos};
use crate::pathfinding::Path;
use crate::turn::TurnParticipant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    Player,
    Enemy,
}

/// Movement tuning shared by both roles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementSettings {
    /// World units travelled per second
    pub speed: f32,
    /// Height the actor's center rides above the cell center
    pub height_offset: f32,
    /// A step counts as reached once the actor is this close to it
    pub arrive_epsilon: f32,
    /// Collision footprint width along x
    pub width: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        MovementSettings {
            speed: 5.0,
            height_offset: 0.5,
            arrive_epsilon: 0.1,
            width: 1.0,
        }
    }
}

/// Stop a traversal before stepping too close to another actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityGuard {
    pub other: WorldPos,
    pub threshold: f32,
}

impl ProximityGuard {
    /// Threshold is half the mean of the two collision widths
    pub fn between(other: WorldPos, own_width: f32, other_width: f32) -> Self {
        ProximityGuard {
            other,
            threshold: (own_width + other_width) * 0.25,
        }
    }

    pub fn is_too_close(&self, target: &WorldPos) -> bool {
        target.distance(&self.other) < self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalStatus {
    /// Nothing to traverse, or the agent is disabled
    Idle,
    Moving,
    /// Every step was reached
    Completed,
    /// Stopped early by the proximity guard or a cancel request
    Aborted,
}

/// Resumable tile-by-tile walk along a path
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    steps: Vec<GridCoord>,
    index: usize,
    step_entered: bool,
    cancelled: bool,
}

impl Traversal {
    pub fn new(path: Path) -> Self {
        Traversal {
            steps: path.into_steps(),
            index: 0,
            step_entered: false,
            cancelled: false,
        }
    }

    pub fn current_step(&self) -> Option<GridCoord> {
        self.steps.get(self.index).copied()
    }

    pub fn remaining(&self) -> &[GridCoord] {
        &self.steps[self.index.min(self.steps.len())..]
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// A player- or enemy-controlled piece moving over the grid
#[derive(Debug, Clone)]
pub struct ActorAgent {
    role: ActorRole,
    cell: GridCoord,
    position: WorldPos,
    movement: MovementSettings,
    enabled: bool,
    /// Set when the turn starts; cleared once the agent has committed to a route
    awaiting_route: bool,
    traversal: Option<Traversal>,
}

impl ActorAgent {
    /// Place an actor on `cell`, raised by the height offset
    pub fn new(role: ActorRole, cell: GridCoord, grid: &GridGraph, movement: MovementSettings) -> Self {
        ActorAgent {
            role,
            cell,
            position: grid.grid_to_world(cell).raised(movement.height_offset),
            movement,
            enabled: false,
            awaiting_route: false,
            traversal: None,
        }
    }

    pub fn role(&self) -> ActorRole {
        self.role
    }

    /// Last cell the actor arrived at
    pub fn cell(&self) -> GridCoord {
        self.cell
    }

    /// Interpolated position, for rendering
    pub fn position(&self) -> WorldPos {
        self.position
    }

    pub fn movement(&self) -> &MovementSettings {
        &self.movement
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_moving(&self) -> bool {
        self.traversal.is_some()
    }

    /// Ready to plan this turn: enabled, not moving, route not yet chosen
    pub fn is_awaiting_route(&self) -> bool {
        self.enabled && self.awaiting_route && self.traversal.is_none()
    }

    pub fn traversal(&self) -> Option<&Traversal> {
        self.traversal.as_ref()
    }

    /// Commit to a route for this turn
    pub fn start_traversal(&mut self, path: Path) {
        debug!(role = ?self.role, steps = path.len(), "traversal started");
        self.awaiting_route = false;
        self.traversal = Some(Traversal::new(path));
    }

    /// Give up this turn's route without moving
    pub fn forfeit_route(&mut self) {
        self.awaiting_route = false;
    }

    /// Request the active traversal to stop at the next advance
    pub fn cancel_traversal(&mut self) {
        if let Some(traversal) = self.traversal.as_mut() {
            traversal.cancel();
        }
    }

    fn step_target(&self, grid: &GridGraph, step: GridCoord) -> WorldPos {
        grid.grid_to_world(step).raised(self.movement.height_offset)
    }

    /// Advance the active traversal by `delta_time` seconds.
    ///
    /// Moves at most once per call. Arrivals that need no further movement
    /// are settled in the same call and pushed into `reached`. When the guard
    /// trips on entering a step, the rest of the path is dropped.
    pub fn advance(
        &mut self,
        delta_time: f32,
        grid: &GridGraph,
        guard: Option<&ProximityGuard>,
        reached: &mut Vec<GridCoord>,
    ) -> TraversalStatus {
        if !self.enabled {
            return TraversalStatus::Idle;
        }
        let Some(mut traversal) = self.traversal.take() else {
            return TraversalStatus::Idle;
        };

        loop {
            if traversal.cancelled {
                debug!(role = ?self.role, cell = %self.cell, "traversal cancelled");
                return TraversalStatus::Aborted;
            }

            let Some(step) = traversal.current_step() else {
                debug!(role = ?self.role, cell = %self.cell, "traversal completed");
                return TraversalStatus::Completed;
            };
            let target = self.step_target(grid, step);

            if !traversal.step_entered {
                traversal.step_entered = true;
                if guard.is_some_and(|guard| guard.is_too_close(&target)) {
                    info!(role = ?self.role, cell = %self.cell, next = %step, "traversal stopped next to other actor");
                    return TraversalStatus::Aborted;
                }
            }

            if self.position.distance(&target) > self.movement.arrive_epsilon {
                self.position = self
                    .position
                    .move_towards(&target, self.movement.speed * delta_time);
                self.traversal = Some(traversal);
                return TraversalStatus::Moving;
            }

            self.position = target;
            self.cell = step;
            reached.push(step);
            traversal.index += 1;
            traversal.step_entered = false;
        }
    }
}

impl TurnParticipant for ActorAgent {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn begin_turn(&mut self) {
        info!(role = ?self.role, cell = %self.cell, "turn started");
        self.traversal = None;
        self.awaiting_route = true;
    }
}
