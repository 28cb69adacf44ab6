pub mod actor;
pub mod config;
pub mod event_log;
pub mod grid;
pub mod obstacles;
pub mod pathfinding;
pub mod session;
pub mod turn;

pub use actor::{ActorAgent, ActorRole, MovementSettings, ProximityGuard, Traversal, TraversalStatus};
pub use config::Config;
pub use event_log::{EventLog, MatchEvent};
pub use grid::{GridCoord, GridGraph, Node, WorldPos};
pub use obstacles::ObstacleMap;
pub use pathfinding::{Path, PathError, SearchAlgorithm};
pub use session::{SelectionOutcome, Session, SessionError};
pub use turn::{TurnController, TurnError, TurnParticipant, TurnPhase};
