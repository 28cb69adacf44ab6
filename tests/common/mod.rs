#![allow(dead_code)]

use gridturn::{Config, GridCoord, GridGraph, ObstacleMap, Path, Session, TurnPhase};

/// Build a grid from a text layout (one line per x, `#` blocked, `.` free)
pub fn grid_from_layout(layout: &str, tile_spacing: f32) -> GridGraph {
    let obstacles = ObstacleMap::from_layout(layout).expect("test layout should parse");
    GridGraph::from_obstacles(obstacles, tile_spacing)
}

/// Every step is edge-adjacent to the previous one, starting next to `start`
pub fn is_connected_4(start: GridCoord, path: &Path) -> bool {
    let mut previous = start;
    for &step in path.iter() {
        if !previous.is_adjacent4(&step) {
            return false;
        }
        previous = step;
    }
    true
}

/// Every step is a cell the searches may enter, runtime edits included
pub fn avoids_obstacles(grid: &GridGraph, path: &Path) -> bool {
    path.iter().all(|&step| grid.is_traversable(step))
}

/// Visualize a path on a grid
pub fn visualize_path(grid: &GridGraph, path: &Path, start: GridCoord) -> String {
    let mut result = String::new();
    for x in 0..grid.size() {
        for z in 0..grid.size() {
            let coord = GridCoord::new(x, z);
            let symbol = if coord == start {
                'S'
            } else if path.last() == Some(coord) {
                'T'
            } else if path.steps().contains(&coord) {
                '*'
            } else if !grid.is_traversable(coord) {
                '#'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}

/// Config for a small match with the actors in opposite corners
pub fn match_config(size: i32) -> Config {
    let mut config = Config::default();
    config.grid.size = size;
    config.actors.player_start = [0, 0];
    config.actors.enemy_start = [size - 1, size - 1];
    config
}

pub fn session_from_layout(config: &Config, layout: &str) -> Session {
    let obstacles = ObstacleMap::from_layout(layout).expect("test layout should parse");
    Session::new(config, obstacles).expect("test session should start")
}

/// Tick until the phase changes; returns the number of ticks taken
pub fn run_until_phase_change(session: &mut Session, delta_time: f32, max_ticks: u32) -> Option<u32> {
    let start_phase = session.phase();
    for tick in 1..=max_ticks {
        session.update(delta_time);
        if session.phase() != start_phase {
            return Some(tick);
        }
    }
    None
}

/// Tick until it is the player's turn again
pub fn run_enemy_turn(session: &mut Session) {
    assert_eq!(session.phase(), TurnPhase::Enemy);
    run_until_phase_change(session, 0.05, 10_000).expect("enemy turn should end");
}
