//! Match driver: one grid, one turn controller, two agents.
//!
//! The host feeds it target selections and per-frame ticks; it plans routes,
//! advances whichever agent owns the current phase and hands the phase over
//! when that agent is done.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actor::{ActorAgent, ActorRole, ProximityGuard, TraversalStatus};
use crate::config::{Config, ConfigError};
use crate::event_log::{EventLog, MatchEvent};
use crate::grid::{GridCoord, GridGraph, WorldPos};
use crate::obstacles::{ObstacleError, ObstacleMap};
use crate::pathfinding::{find_path, find_path_with, PathError, SearchAlgorithm};
use crate::turn::{TurnController, TurnPhase};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("obstacle map is {obstacles}x{obstacles} but the grid is {grid}x{grid}")]
    ObstacleSizeMismatch { grid: i32, obstacles: usize },
    #[error("{role:?} cannot start on {cell}: not a free cell")]
    InvalidStart { role: ActorRole, cell: GridCoord },
    #[error("player and enemy cannot both start on {0}")]
    SharedStart(GridCoord),
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("the player is already moving")]
    PlayerBusy,
    #[error("target {0} is occupied by the enemy")]
    TargetOccupied(GridCoord),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Obstacles(#[from] ObstacleError),
}

/// What a player selection led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A route was found and the player starts walking it
    Moving { steps: usize },
    /// No route; the player's turn ended without moving
    TurnEnded,
    /// The target is the player's own cell; nothing happens and the turn stays open
    AlreadyThere,
}

pub type Turns = TurnController<ActorAgent, ActorAgent>;

#[derive(Debug)]
pub struct Session {
    grid: GridGraph,
    turns: Turns,
    algorithm: SearchAlgorithm,
    log: EventLog,
    tick: u64,
}

impl Session {
    /// Build a session from config, reading the obstacle store it names
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        config.validate()?;
        let obstacles = match &config.obstacles.path {
            Some(path) => {
                let map = ObstacleMap::load_from_file(path)?;
                info!(%path, blocked = map.blocked_count(), "loaded obstacle store");
                map
            }
            None => ObstacleMap::new(config.grid.size as usize),
        };
        Self::new(config, obstacles)
    }

    pub fn new(config: &Config, obstacles: ObstacleMap) -> Result<Self, SessionError> {
        config.validate()?;
        if obstacles.size() as i32 != config.grid.size {
            return Err(SessionError::ObstacleSizeMismatch {
                grid: config.grid.size,
                obstacles: obstacles.size(),
            });
        }

        let grid = GridGraph::from_obstacles(obstacles, config.grid.tile_spacing);

        let player_start = config.actors.player_start();
        let enemy_start = config.actors.enemy_start();
        for (role, cell) in [(ActorRole::Player, player_start), (ActorRole::Enemy, enemy_start)] {
            if !grid.is_traversable(cell) {
                return Err(SessionError::InvalidStart { role, cell });
            }
        }
        if player_start == enemy_start {
            return Err(SessionError::SharedStart(player_start));
        }

        let player = ActorAgent::new(
            ActorRole::Player,
            player_start,
            &grid,
            config.actors.player_movement(),
        );
        let enemy = ActorAgent::new(
            ActorRole::Enemy,
            enemy_start,
            &grid,
            config.actors.enemy_movement(),
        );

        let mut log = EventLog::new();
        log.record(0, MatchEvent::TurnStarted { phase: TurnPhase::Player });

        Ok(Session {
            grid,
            turns: TurnController::new(player, enemy),
            algorithm: config.pathfinding.algorithm,
            log,
            tick: 0,
        })
    }

    pub fn grid(&self) -> &GridGraph {
        &self.grid
    }

    /// Runtime walkability edits. Routes already being walked are not re-planned.
    pub fn grid_mut(&mut self) -> &mut GridGraph {
        &mut self.grid
    }

    pub fn turns(&self) -> &Turns {
        &self.turns
    }

    pub fn phase(&self) -> TurnPhase {
        self.turns.phase()
    }

    pub fn player(&self) -> &ActorAgent {
        self.turns.player()
    }

    pub fn enemy(&self) -> &ActorAgent {
        self.turns.enemy()
    }

    pub fn algorithm(&self) -> SearchAlgorithm {
        self.algorithm
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Pick the player's destination for this turn.
    ///
    /// Invalid targets are rejected and the player keeps the turn, as does
    /// picking the cell the player already stands on. A valid target with no
    /// route ends the turn on the spot.
    pub fn select_player_target(&mut self, target: GridCoord) -> Result<SelectionOutcome, SessionError> {
        if !self.turns.is_player_active() {
            return Err(SessionError::NotPlayerTurn);
        }
        if self.turns.player().is_moving() {
            return Err(SessionError::PlayerBusy);
        }

        let start = self.turns.player().cell();
        let enemy_cell = self.turns.enemy().cell();
        if target == enemy_cell {
            return Err(self.reject(target, SessionError::TargetOccupied(target)));
        }

        match find_path_with(self.algorithm, &self.grid, start, target, |cell| cell == enemy_cell) {
            Err(err) => Err(self.reject(target, err.into())),
            Ok(None) => {
                info!(%start, %target, "no route for player, ending turn");
                self.log.record(
                    self.tick,
                    MatchEvent::RouteUnavailable {
                        role: ActorRole::Player,
                        target,
                    },
                );
                self.turns.player_mut().forfeit_route();
                self.finish_turn();
                Ok(SelectionOutcome::TurnEnded)
            }
            Ok(Some(path)) if path.is_empty() => {
                debug!(%target, "player already on target, turn stays open");
                Ok(SelectionOutcome::AlreadyThere)
            }
            Ok(Some(path)) => {
                let steps = path.len();
                self.log.record(
                    self.tick,
                    MatchEvent::RoutePlanned {
                        role: ActorRole::Player,
                        algorithm: self.algorithm,
                        target,
                        steps,
                    },
                );
                self.turns.player_mut().start_traversal(path);
                Ok(SelectionOutcome::Moving { steps })
            }
        }
    }

    /// Select by world position, e.g. a picked point on a tile
    pub fn select_player_target_at(&mut self, pos: &WorldPos) -> Result<SelectionOutcome, SessionError> {
        let target = self.grid.world_to_grid(pos);
        self.select_player_target(target)
    }

    /// Stop the active actor's walk at its next tick; the turn then ends where it stands
    pub fn cancel_traversal(&mut self) -> bool {
        let agent = match self.turns.phase() {
            TurnPhase::Player => self.turns.player_mut(),
            TurnPhase::Enemy => self.turns.enemy_mut(),
        };
        if !agent.is_moving() {
            return false;
        }
        agent.cancel_traversal();
        true
    }

    fn reject(&mut self, target: GridCoord, err: SessionError) -> SessionError {
        debug!(%target, error = %err, "selection rejected");
        self.log.record(
            self.tick,
            MatchEvent::SelectionRejected {
                target,
                reason: err.to_string(),
            },
        );
        err
    }

    /// Advance the match by one frame of `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        self.tick += 1;

        match self.turns.phase() {
            TurnPhase::Player => {
                let mut reached = Vec::new();
                let status = self
                    .turns
                    .player_mut()
                    .advance(delta_time, &self.grid, None, &mut reached);
                self.record_steps(ActorRole::Player, &reached);
                self.settle(ActorRole::Player, status);
            }
            TurnPhase::Enemy => {
                if self.turns.enemy().is_awaiting_route() && !self.plan_enemy_route() {
                    return;
                }

                let player = self.turns.player();
                let guard = ProximityGuard::between(
                    player.position(),
                    self.turns.enemy().movement().width,
                    player.movement().width,
                );

                let mut reached = Vec::new();
                let status = self
                    .turns
                    .enemy_mut()
                    .advance(delta_time, &self.grid, Some(&guard), &mut reached);
                self.record_steps(ActorRole::Enemy, &reached);
                self.settle(ActorRole::Enemy, status);
            }
        }
    }

    /// Plan the enemy's chase. Returns false when the turn ended instead.
    fn plan_enemy_route(&mut self) -> bool {
        let start = self.turns.enemy().cell();
        let target = self.turns.player().cell();

        match find_path(self.algorithm, &self.grid, start, target) {
            Ok(Some(path)) if !path.is_empty() => {
                self.log.record(
                    self.tick,
                    MatchEvent::RoutePlanned {
                        role: ActorRole::Enemy,
                        algorithm: self.algorithm,
                        target,
                        steps: path.len(),
                    },
                );
                self.turns.enemy_mut().start_traversal(path);
                true
            }
            outcome => {
                if let Err(err) = outcome {
                    warn!(%start, %target, error = %err, "enemy could not search for the player");
                } else {
                    info!(%start, %target, "no route found to the player, ending enemy turn");
                }
                self.log.record(
                    self.tick,
                    MatchEvent::RouteUnavailable {
                        role: ActorRole::Enemy,
                        target,
                    },
                );
                self.turns.enemy_mut().forfeit_route();
                self.finish_turn();
                false
            }
        }
    }

    fn record_steps(&mut self, role: ActorRole, reached: &[GridCoord]) {
        for &cell in reached {
            self.log.record(self.tick, MatchEvent::StepReached { role, cell });
        }
    }

    fn settle(&mut self, role: ActorRole, status: TraversalStatus) {
        match status {
            TraversalStatus::Idle | TraversalStatus::Moving => {}
            TraversalStatus::Completed => self.finish_turn(),
            TraversalStatus::Aborted => {
                let cell = match role {
                    ActorRole::Player => self.turns.player().cell(),
                    ActorRole::Enemy => self.turns.enemy().cell(),
                };
                self.log.record(self.tick, MatchEvent::TraversalAborted { role, cell });
                self.finish_turn();
            }
        }
    }

    fn finish_turn(&mut self) {
        let phase = self.turns.phase();
        self.log.record(self.tick, MatchEvent::TurnCompleted { phase });
        self.turns.complete_current_turn();
        self.log.record(
            self.tick,
            MatchEvent::TurnStarted {
                phase: self.turns.phase(),
            },
        );
    }
}
