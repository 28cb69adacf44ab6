use arboard::Clipboard;
use gridturn::{Config, GridCoord, Session, TurnPhase, WorldPos};
use macroquad::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config.toml";
const PANEL_WIDTH: f32 = 280.0;

/// Visualization state
struct VisState {
    session: Session,
    cell_pixels: f32,
    background: Color,
    event_log_path: String,
    status: String,
}

impl VisState {
    fn new(config: &Config, session: Session) -> Self {
        VisState {
            session,
            cell_pixels: config.visual.cell_pixels,
            background: Color::from_rgba(
                config.visual.background_r,
                config.visual.background_g,
                config.visual.background_b,
                255,
            ),
            event_log_path: config.logging.event_log_path.clone(),
            status: "Click a tile to move".to_string(),
        }
    }

    /// Screen picking happens here; the session only sees the resulting cell
    fn cell_under_mouse(&self) -> Option<GridCoord> {
        let (mouse_x, mouse_y) = mouse_position();
        let coord = GridCoord::new(
            (mouse_x / self.cell_pixels).floor() as i32,
            (mouse_y / self.cell_pixels).floor() as i32,
        );
        self.session.grid().in_bounds(coord).then_some(coord)
    }

    fn handle_click(&mut self) {
        let Some(target) = self.cell_under_mouse() else {
            return;
        };

        self.status = match self.session.select_player_target(target) {
            Ok(outcome) => format!("{} -> {:?}", target, outcome),
            Err(err) => format!("{}: {}", target, err),
        };
    }

    fn world_to_screen(&self, pos: &WorldPos) -> (f32, f32) {
        let spacing = self.session.grid().tile_spacing();
        (
            pos.x / spacing * self.cell_pixels + self.cell_pixels / 2.0,
            pos.z / spacing * self.cell_pixels + self.cell_pixels / 2.0,
        )
    }

    fn save_log(&mut self) {
        match self.session.log().save_to_file(&self.event_log_path) {
            Ok(()) => {
                info!(path = %self.event_log_path, "saved match log");
                self.status = format!("Saved log to {}", self.event_log_path);
            }
            Err(e) => {
                warn!(error = %e, "failed to save match log");
                self.status = format!("Failed to save log: {}", e);
            }
        }
    }

    fn copy_to_clipboard(&mut self) {
        let layout = self.session.grid().obstacles().to_layout();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(layout) {
                    warn!(error = %e, "failed to copy to clipboard");
                } else {
                    self.status = "Obstacle layout copied to clipboard".to_string();
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to access clipboard");
            }
        }
    }

    fn draw(&self) {
        clear_background(self.background);

        let grid = self.session.grid();
        let hovered = self.cell_under_mouse();
        let planned: Vec<GridCoord> = self
            .session
            .player()
            .traversal()
            .or_else(|| self.session.enemy().traversal())
            .map(|t| t.remaining().to_vec())
            .unwrap_or_default();

        for node in grid.nodes() {
            let px = node.coord.x as f32 * self.cell_pixels;
            let py = node.coord.z as f32 * self.cell_pixels;

            let color = if !node.walkable {
                Color::from_rgba(120, 40, 40, 255)
            } else if planned.contains(&node.coord) {
                Color::from_rgba(70, 110, 70, 255)
            } else if hovered == Some(node.coord) {
                GRAY
            } else {
                Color::from_rgba(60, 60, 60, 255)
            };

            draw_rectangle(px, py, self.cell_pixels - 1.0, self.cell_pixels - 1.0, color);
        }

        let radius = self.cell_pixels * 0.3;
        let (ex, ey) = self.world_to_screen(&self.session.enemy().position());
        draw_circle(ex, ey, radius, RED);
        let (px, py) = self.world_to_screen(&self.session.player().position());
        draw_circle(px, py, radius, BLUE);

        let panel_x = grid.size() as f32 * self.cell_pixels + 12.0;
        let phase = match self.session.phase() {
            TurnPhase::Player => "Player",
            TurnPhase::Enemy => "Enemy",
        };
        let lines = [
            format!("Turn: {}", phase),
            format!("Turns completed: {}", self.session.turns().turns_completed()),
            format!("Search: {:?}", self.session.algorithm()),
            format!("Player: {}", self.session.player().cell()),
            format!("Enemy: {}", self.session.enemy().cell()),
            String::new(),
            self.status.clone(),
            String::new(),
            "Left click: move player".to_string(),
            "X: cancel current move".to_string(),
            "S: save match log".to_string(),
            "C: copy obstacle layout".to_string(),
            "Esc: close window".to_string(),
        ];
        for (i, line) in lines.iter().enumerate() {
            draw_text(line, panel_x, 24.0 + i as f32 * 22.0, 20.0, WHITE);
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn window_conf() -> Conf {
    let config = Config::load(CONFIG_PATH).unwrap_or_default();
    let grid_pixels = config.grid.size as f32 * config.visual.cell_pixels;
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (grid_pixels + PANEL_WIDTH) as i32,
        window_height: grid_pixels.max(300.0) as i32,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let filter = Config::load(CONFIG_PATH)
        .map(|config| config.logging.filter)
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&filter);

    let config = Config::load_or_default(CONFIG_PATH);
    let session = match Session::from_config(&config) {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "failed to start match");
            std::process::exit(1);
        }
    };

    let mut state = VisState::new(&config, session);

    loop {
        if is_mouse_button_pressed(MouseButton::Left) {
            state.handle_click();
        }

        if is_key_pressed(KeyCode::X) && state.session.cancel_traversal() {
            state.status = "Move cancelled".to_string();
        }

        if is_key_pressed(KeyCode::S) {
            state.save_log();
        }

        // Copy obstacle layout to clipboard on C key
        if is_key_pressed(KeyCode::C) {
            state.copy_to_clipboard();
        }

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.session.update(get_frame_time());
        state.draw();

        next_frame().await
    }

    println!("{}", state.session.log().summary());
}
