use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};

use crate::actor::ActorRole;
use crate::grid::GridCoord;
use crate::pathfinding::SearchAlgorithm;
use crate::turn::TurnPhase;

/// Things that happen during a match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    TurnStarted { phase: TurnPhase },
    TurnCompleted { phase: TurnPhase },
    /// The player picked a cell that cannot be a target
    SelectionRejected { target: GridCoord, reason: String },
    RoutePlanned {
        role: ActorRole,
        algorithm: SearchAlgorithm,
        target: GridCoord,
        steps: usize,
    },
    /// Search ran but found nothing; the turn ends without moving
    RouteUnavailable { role: ActorRole, target: GridCoord },
    StepReached { role: ActorRole, cell: GridCoord },
    TraversalAborted { role: ActorRole, cell: GridCoord },
}

/// Event with the tick it happened on
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub tick: u64,
    pub event: MatchEvent,
}

/// Append-only match history
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog { events: Vec::new() }
    }

    pub fn record(&mut self, tick: u64, event: MatchEvent) {
        self.events.push(LoggedEvent { tick, event });
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events whose payload matches `predicate`
    pub fn filter<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = &'a MatchEvent> + 'a
    where
        F: Fn(&MatchEvent) -> bool + 'a,
    {
        self.events
            .iter()
            .map(|logged| &logged.event)
            .filter(move |event| predicate(event))
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: impl AsRef<FsPath>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(&self.events)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut player_turns = 0;
        let mut enemy_turns = 0;
        let mut player_steps = 0;
        let mut enemy_steps = 0;
        let mut rejected = 0;
        let mut unavailable = 0;
        let mut aborted = 0;

        for logged in &self.events {
            match &logged.event {
                MatchEvent::TurnCompleted { phase: TurnPhase::Player } => player_turns += 1,
                MatchEvent::TurnCompleted { phase: TurnPhase::Enemy } => enemy_turns += 1,
                MatchEvent::StepReached { role: ActorRole::Player, .. } => player_steps += 1,
                MatchEvent::StepReached { role: ActorRole::Enemy, .. } => enemy_steps += 1,
                MatchEvent::SelectionRejected { .. } => rejected += 1,
                MatchEvent::RouteUnavailable { .. } => unavailable += 1,
                MatchEvent::TraversalAborted { .. } => aborted += 1,
                _ => {}
            }
        }

        let last_tick = self.events.last().map(|logged| logged.tick).unwrap_or(0);

        format!(
            "Ticks: {}\n\
             Turns completed: {} player, {} enemy\n\
             Steps taken: {} player, {} enemy\n\
             Rejected selections: {}, unreachable targets: {}, aborted traversals: {}",
            last_tick,
            player_turns,
            enemy_turns,
            player_steps,
            enemy_steps,
            rejected,
            unavailable,
            aborted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_turns_and_steps() {
        let mut log = EventLog::new();
        log.record(1, MatchEvent::TurnStarted { phase: TurnPhase::Player });
        log.record(3, MatchEvent::StepReached { role: ActorRole::Player, cell: GridCoord::new(1, 0) });
        log.record(5, MatchEvent::TurnCompleted { phase: TurnPhase::Player });
        log.record(9, MatchEvent::RouteUnavailable { role: ActorRole::Enemy, target: GridCoord::new(1, 0) });
        log.record(9, MatchEvent::TurnCompleted { phase: TurnPhase::Enemy });

        let summary = log.summary();
        assert!(summary.contains("Ticks: 9"));
        assert!(summary.contains("Turns completed: 1 player, 1 enemy"));
        assert!(summary.contains("Steps taken: 1 player, 0 enemy"));
        assert!(summary.contains("unreachable targets: 1"));
    }

    #[test]
    fn events_serialize_with_tick() {
        let mut log = EventLog::new();
        log.record(4, MatchEvent::TurnStarted { phase: TurnPhase::Enemy });

        let json = serde_json::to_string(log.events()).unwrap();
        let back: Vec<LoggedEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log.events());
    }
}
