use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    Player,
    Enemy,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Player => write!(f, "player"),
            TurnPhase::Enemy => write!(f, "enemy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("cannot complete the {attempted} turn during the {current} turn")]
    WrongPhase {
        attempted: TurnPhase,
        current: TurnPhase,
    },
}

/// Hooks the controller calls when it hands a phase to an actor
pub trait TurnParticipant {
    /// Gate the actor's per-tick logic
    fn set_enabled(&mut self, enabled: bool);
    /// Called right after the actor's phase becomes active
    fn begin_turn(&mut self);
}

/// Two-phase turn state machine that owns the player and enemy participants.
///
/// Exactly one phase is active; only the matching `complete_*` call moves
/// it on. The machine starts in the player phase and cycles forever.
#[derive(Debug)]
pub struct TurnController<P, E> {
    phase: TurnPhase,
    player: P,
    enemy: E,
    turns_completed: u64,
}

impl<P: TurnParticipant, E: TurnParticipant> TurnController<P, E> {
    pub fn new(player: P, enemy: E) -> Self {
        let mut controller = TurnController {
            phase: TurnPhase::Player,
            player,
            enemy,
            turns_completed: 0,
        };
        controller.activate_player_phase();
        controller
    }

    pub fn complete_player_turn(&mut self) -> Result<(), TurnError> {
        self.expect_phase(TurnPhase::Player)?;
        self.phase = TurnPhase::Enemy;
        self.turns_completed += 1;
        self.activate_enemy_phase();
        Ok(())
    }

    pub fn complete_enemy_turn(&mut self) -> Result<(), TurnError> {
        self.expect_phase(TurnPhase::Enemy)?;
        self.phase = TurnPhase::Player;
        self.turns_completed += 1;
        self.activate_player_phase();
        Ok(())
    }

    /// Complete whichever phase is active
    pub fn complete_current_turn(&mut self) {
        let result = match self.phase {
            TurnPhase::Player => self.complete_player_turn(),
            TurnPhase::Enemy => self.complete_enemy_turn(),
        };
        debug_assert!(result.is_ok());
    }

    fn expect_phase(&self, attempted: TurnPhase) -> Result<(), TurnError> {
        if self.phase != attempted {
            debug!(%attempted, current = %self.phase, "turn completion rejected");
            return Err(TurnError::WrongPhase {
                attempted,
                current: self.phase,
            });
        }
        Ok(())
    }

    fn activate_player_phase(&mut self) {
        self.player.set_enabled(true);
        self.enemy.set_enabled(false);
        self.player.begin_turn();
    }

    fn activate_enemy_phase(&mut self) {
        self.player.set_enabled(false);
        self.enemy.set_enabled(true);
        self.enemy.begin_turn();
    }
}

impl<P, E> TurnController<P, E> {
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_player_active(&self) -> bool {
        self.phase == TurnPhase::Player
    }

    pub fn is_enemy_active(&self) -> bool {
        self.phase == TurnPhase::Enemy
    }

    /// Completed phases since construction
    pub fn turns_completed(&self) -> u64 {
        self.turns_completed
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn enemy(&self) -> &E {
        &self.enemy
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn enemy_mut(&mut self) -> &mut E {
        &mut self.enemy
    }
}
