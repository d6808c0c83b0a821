use std::io::{self, Write};

use board::{Grid, Side, Square};
use chrono::Local;
use log::warn;

/// Board as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionView {
    pub grid: Grid,
    pub my_side: Side,
    pub last_move_to: Option<Square>,
    pub last_move_from: Option<Square>,
    pub my_turn: bool,
}

/// One move of a candidate line, already mapped onto the captured grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMove {
    pub token: String,
    pub from: Square,
    pub to: Square,
}

/// The surface the helper publishes to. Called from the helper thread only.
pub trait Presenter: Send {
    fn show_position(&mut self, view: &PositionView);

    /// An empty list clears the previous candidates.
    fn show_candidates(&mut self, moves: &[CandidateMove]);

    fn log_line(&mut self, line: &str);

    fn fatal_notice(&mut self, message: &str);
}

/// Prints every event as timestamped text.
pub struct ConsolePresenter<W: Write + Send> {
    out: W,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, text: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        let result = text
            .lines()
            .try_for_each(|line| writeln!(self.out, "[{}] {}", stamp, line))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Console write failed: {}", e);
        }
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn show_position(&mut self, view: &PositionView) {
        let turn = if view.my_turn { "my turn" } else { "waiting" };
        let mut text = format!("Board ({} at bottom, {})\n", view.my_side, turn);
        text.push_str(&render_grid(view));
        self.emit(&text);
    }

    fn show_candidates(&mut self, moves: &[CandidateMove]) {
        if moves.is_empty() {
            self.emit("Thinking...");
            return;
        }
        let line: Vec<String> = moves
            .iter()
            .map(|m| format!("{} {}->{}", m.token, m.from, m.to))
            .collect();
        self.emit(&format!("Candidates: {}", line.join(", ")));
    }

    fn log_line(&mut self, line: &str) {
        self.emit(line);
    }

    fn fatal_notice(&mut self, message: &str) {
        self.emit(&format!("!! {}", message));
    }
}

/// One text row per grid row. Last-move cells are bracketed.
fn render_grid(view: &PositionView) -> String {
    let mut text = String::new();
    for (row, cells) in view.grid.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let symbol = cell.map_or('.', |piece| piece.symbol());
            let square = Some(Square::new(col, row));
            if square == view.last_move_to || square == view.last_move_from {
                text.push_str(&format!("[{}]", symbol));
            } else {
                text.push_str(&format!(" {} ", symbol));
            }
        }
        text.push('\n');
    }
    text
}
