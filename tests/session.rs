mod common;

use common::{match_config, run_enemy_turn, run_until_phase_change, session_from_layout};
use gridturn::pathfinding::PathError;
use gridturn::{
    ActorRole, GridCoord, MatchEvent, ObstacleMap, SearchAlgorithm, SelectionOutcome, Session,
    SessionError, TurnPhase,
};

const OPEN_5: &str = "
    .....
    .....
    .....
    .....
    .....
";

const WALLED_5: &str = "
    .....
    .....
    #####
    .....
    .....
";

#[test]
fn test_player_walks_then_enemy_chases() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, OPEN_5);
    assert_eq!(session.phase(), TurnPhase::Player);

    let outcome = session.select_player_target(GridCoord::new(2, 0)).unwrap();
    assert_eq!(outcome, SelectionOutcome::Moving { steps: 2 });

    run_until_phase_change(&mut session, 0.1, 1_000).expect("player turn should end");
    assert_eq!(session.phase(), TurnPhase::Enemy);
    assert_eq!(session.player().cell(), GridCoord::new(2, 0));

    run_enemy_turn(&mut session);
    assert_eq!(session.phase(), TurnPhase::Player);
    assert_eq!(session.turns().turns_completed(), 2);

    // The enemy stops one cell short of the player
    let enemy = session.enemy().cell();
    assert_eq!(enemy.manhattan(&session.player().cell()), 1);
    assert!(!session.enemy().is_moving());

    let aborted: Vec<_> = session
        .log()
        .filter(|event| matches!(event, MatchEvent::TraversalAborted { .. }))
        .collect();
    assert_eq!(
        aborted,
        vec![&MatchEvent::TraversalAborted {
            role: ActorRole::Enemy,
            cell: enemy
        }]
    );
}

#[test]
fn test_turn_events_are_logged_in_order() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, OPEN_5);

    session.select_player_target(GridCoord::new(1, 0)).unwrap();
    run_until_phase_change(&mut session, 0.1, 1_000).unwrap();

    let turn_events: Vec<_> = session
        .log()
        .filter(|event| {
            matches!(
                event,
                MatchEvent::TurnStarted { .. } | MatchEvent::TurnCompleted { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        turn_events,
        vec![
            MatchEvent::TurnStarted { phase: TurnPhase::Player },
            MatchEvent::TurnCompleted { phase: TurnPhase::Player },
            MatchEvent::TurnStarted { phase: TurnPhase::Enemy },
        ]
    );

    let first = &session.log().events()[0];
    assert_eq!(first.tick, 0);

    let steps: Vec<_> = session
        .log()
        .filter(|event| matches!(event, MatchEvent::StepReached { role: ActorRole::Player, .. }))
        .collect();
    assert_eq!(
        steps,
        vec![&MatchEvent::StepReached {
            role: ActorRole::Player,
            cell: GridCoord::new(1, 0)
        }]
    );
}

#[test]
fn test_selecting_current_cell_keeps_the_turn() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, OPEN_5);

    let outcome = session.select_player_target(GridCoord::new(0, 0)).unwrap();
    assert_eq!(outcome, SelectionOutcome::AlreadyThere);
    assert!(session.player().is_awaiting_route());
    assert!(!session.player().is_moving());

    assert_eq!(run_until_phase_change(&mut session, 0.016, 10), None);
    assert_eq!(session.phase(), TurnPhase::Player);

    // A real move afterwards still goes through
    let outcome = session.select_player_target(GridCoord::new(0, 1)).unwrap();
    assert_eq!(outcome, SelectionOutcome::Moving { steps: 1 });
}

#[test]
fn test_unreachable_target_ends_both_turns() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, WALLED_5);

    let outcome = session.select_player_target(GridCoord::new(4, 0)).unwrap();
    assert_eq!(outcome, SelectionOutcome::TurnEnded);
    assert_eq!(session.phase(), TurnPhase::Enemy);
    assert_eq!(session.player().cell(), GridCoord::new(0, 0));

    // The enemy is walled off too and gives up on its first tick
    assert_eq!(run_until_phase_change(&mut session, 0.016, 10), Some(1));
    assert_eq!(session.enemy().cell(), GridCoord::new(4, 4));

    let unavailable = session
        .log()
        .filter(|event| matches!(event, MatchEvent::RouteUnavailable { .. }))
        .count();
    assert_eq!(unavailable, 2);
    assert!(session.log().summary().contains("unreachable targets: 2"));
}

#[test]
fn test_invalid_selections_keep_the_turn() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, WALLED_5);

    assert!(matches!(
        session.select_player_target(GridCoord::new(2, 1)),
        Err(SessionError::Path(PathError::TargetNotTraversable(_)))
    ));
    assert!(matches!(
        session.select_player_target(GridCoord::new(7, 0)),
        Err(SessionError::Path(PathError::TargetOutOfBounds(_)))
    ));
    assert!(matches!(
        session.select_player_target(GridCoord::new(4, 4)),
        Err(SessionError::TargetOccupied(_))
    ));

    assert_eq!(session.phase(), TurnPhase::Player);
    assert!(session.player().is_awaiting_route());

    let rejected = session
        .log()
        .filter(|event| matches!(event, MatchEvent::SelectionRejected { .. }))
        .count();
    assert_eq!(rejected, 3);

    // A valid pick still works afterwards
    assert!(session.select_player_target(GridCoord::new(1, 1)).is_ok());
}

#[test]
fn test_second_selection_while_moving_is_refused() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, OPEN_5);

    session.select_player_target(GridCoord::new(3, 0)).unwrap();
    session.update(0.05);
    assert!(matches!(
        session.select_player_target(GridCoord::new(0, 3)),
        Err(SessionError::PlayerBusy)
    ));
}

#[test]
fn test_cancelled_move_ends_the_turn_in_place() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, OPEN_5);
    assert!(!session.cancel_traversal());

    session.select_player_target(GridCoord::new(3, 0)).unwrap();
    session.update(0.05);
    assert!(session.cancel_traversal());

    session.update(0.05);
    assert_eq!(session.phase(), TurnPhase::Enemy);
    assert_eq!(session.player().cell(), GridCoord::new(0, 0));
    assert_eq!(
        session
            .log()
            .filter(|event| matches!(
                event,
                MatchEvent::TraversalAborted {
                    role: ActorRole::Player,
                    ..
                }
            ))
            .count(),
        1
    );
}

#[test]
fn test_player_routes_around_the_enemy() {
    let mut config = match_config(3);
    config.actors.enemy_start = [1, 0];
    let mut session = session_from_layout(&config, "...\n...\n...");

    let outcome = session.select_player_target(GridCoord::new(2, 0)).unwrap();
    assert_eq!(outcome, SelectionOutcome::Moving { steps: 4 });

    let route = session.player().traversal().unwrap().remaining().to_vec();
    assert!(!route.contains(&GridCoord::new(1, 0)));
}

#[test]
fn test_runtime_obstacle_edit_changes_selection() {
    let config = match_config(5);
    let mut session = session_from_layout(&config, OPEN_5);

    assert!(session.grid_mut().set_walkable_at(GridCoord::new(1, 1), false));
    assert!(matches!(
        session.select_player_target(GridCoord::new(1, 1)),
        Err(SessionError::Path(PathError::TargetNotTraversable(_)))
    ));
}

#[test]
fn test_astar_session_chases_as_well() {
    let mut config = match_config(6);
    config.pathfinding.algorithm = SearchAlgorithm::AStar;
    let mut session = Session::new(&config, ObstacleMap::new(6)).unwrap();
    assert_eq!(session.algorithm(), SearchAlgorithm::AStar);

    session.select_player_target(GridCoord::new(0, 1)).unwrap();
    run_until_phase_change(&mut session, 0.1, 1_000).unwrap();
    run_enemy_turn(&mut session);

    assert_eq!(session.enemy().cell().manhattan(&GridCoord::new(0, 1)), 1);

    let planned = session
        .log()
        .filter(|event| {
            matches!(
                event,
                MatchEvent::RoutePlanned {
                    algorithm: SearchAlgorithm::AStar,
                    ..
                }
            )
        })
        .count();
    assert_eq!(planned, 2);
}

#[test]
fn test_shared_start_is_rejected() {
    let mut config = match_config(4);
    config.actors.enemy_start = [0, 0];
    assert!(matches!(
        Session::new(&config, ObstacleMap::new(4)),
        Err(SessionError::SharedStart(_))
    ));
}
