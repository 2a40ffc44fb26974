use std::io;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::EnumCount;
use ratatui::{
    buffer::Buffer,
    layout::{Direction, Layout, Rect},
    style::Stylize,
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Widget},
    DefaultTerminal, Frame,
};
use queens_dfs::board::Board;
use queens_dfs::core::CellState;
use queens_dfs::levels::{find, SAMPLE_LEVELS};
use queens_dfs::ranker::MinRemainingRanker;
use queens_dfs::solver::{QueensSolver, SolverState, SolverView};

// Hard ceiling for the "finish" command so a hung board can't wedge the UI.
const MAX_FINISH_STEPS: usize = 1_000_000;

fn main() -> io::Result<()> {
    let id: u32 = std::env::args()
        .nth(1)
        .map(|s| s.parse().map_err(|_| bad_input(format!("bad level id {:?}", s))))
        .transpose()?
        .unwrap_or(1);
    let level = find(&SAMPLE_LEVELS, id)
        .ok_or_else(|| bad_input(format!("no catalog level with id {}", id)))?;
    let board = level
        .board()
        .map_err(|e| bad_input(format!("catalog level {} is invalid: {}", id, e)))?;
    let ranker = MinRemainingRanker;
    let mut terminal = ratatui::init();
    let mut app = App::new(&board, &ranker, format!(" {} ({}x{}) ", level.name, board.size(), board.size()));
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}

fn bad_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Ok,
    Err(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, strum_macros::EnumCount)]
#[repr(u8)]
enum Mode {
    CellStates = 1,
    Regions,
}

struct App<'a> {
    solver: QueensSolver<'a, MinRemainingRanker>,
    title: String,
    mode: Mode,
    exit: Option<Status>,
}

struct HeaderWidget<'a>(&'a App<'a>);

impl<'a> Widget for HeaderWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Line::from(self.0.title.clone().bold()).centered())
            .border_set(border::PLAIN);
        let state: Span<'_> = match self.0.solver.solver_state() {
            SolverState::Ready => "Ready".yellow(),
            SolverState::Advancing => "Advancing".green(),
            SolverState::Backtracking => "Backtracking".red(),
            SolverState::Solved => "Solved".blue(),
            SolverState::Exhausted => "Exhausted".magenta(),
        };
        let mut status = vec![
            "State: ".into(),
            state,
            " Steps: ".into(),
            self.0.solver.step_count().to_string().yellow(),
            " Placed: ".into(),
            self.0.solver.search().depth().to_string().yellow(),
        ];
        if let Some(dead) = self.0.solver.dead_end() {
            status.push("  ".into());
            status.push(dead.to_string().red());
        }
        if let Some(unwound) = self.0.solver.backtracked_steps() {
            status.push(" Unwound: ".into());
            status.push(unwound.to_string().red());
        }
        Paragraph::new(Line::from(status))
            .centered()
            .block(block)
            .render(area, buf);
    }
}

struct GridWidget<'a>(&'a App<'a>);

impl<'a> GridWidget<'a> {
    fn cell(&self, r: usize, c: usize) -> Span<'_> {
        let board = self.0.solver.board();
        let cell = board.cell([r, c]);
        let recent = self.0.solver.most_recent_placement() == Some([r, c]);
        match self.0.solver.search().cell(cell) {
            CellState::Occupied => {
                let q: Span<'_> = " Q ".into();
                if recent && self.0.solver.solver_state() == SolverState::Backtracking {
                    q.red().bold()
                } else {
                    q.green().bold()
                }
            }
            CellState::Eliminated => " x ".dark_gray(),
            CellState::Open => match self.0.mode {
                Mode::CellStates => " . ".into(),
                Mode::Regions => {
                    let label = board.region_of([r, c]) as u32;
                    let ch = char::from_digit(label % 36, 36).unwrap_or('?');
                    format!(" {} ", ch).cyan()
                }
            },
        }
    }
}

impl<'a> Widget for GridWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let size = self.0.solver.board().size();
        let lines: Vec<Line> = (0..size)
            .map(|r| Line::from((0..size).map(|c| self.cell(r, c)).collect::<Vec<_>>()))
            .collect();
        let block = Block::bordered()
            .title(Line::from(match self.0.mode {
                Mode::CellStates => "Cell States",
                Mode::Regions => "Regions",
            }).centered())
            .border_set(border::PLAIN);
        Paragraph::new(Text::from(lines))
            .centered()
            .block(block)
            .render(area, buf);
    }
}

impl<'a> App<'a> {
    fn new(board: &'a Board, ranker: &'a MinRemainingRanker, title: String) -> Self {
        App {
            solver: QueensSolver::new(board, ranker),
            title,
            mode: Mode::CellStates,
            exit: None,
        }
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        while self.exit.is_none() {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        match self.exit.clone() {
            Some(Status::Err(e)) => Err(io::Error::other(e)),
            _ => Ok(()),
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                ratatui::layout::Constraint::Length(3),
                ratatui::layout::Constraint::Min(0),
                ratatui::layout::Constraint::Length(1),
            ])
            .split(frame.area());
        let instructions = Line::from(vec![
            " Step ".into(),
            "N".blue().bold(),
            " Finish ".into(),
            "F".blue().bold(),
            " Mode ".into(),
            "Tab".blue().bold(),
            " Quit ".into(),
            "Q ".blue().bold(),
        ]);
        frame.render_widget(HeaderWidget(self), chunks[0]);
        frame.render_widget(GridWidget(self), chunks[1]);
        frame.render_widget(Paragraph::new(instructions).centered(), chunks[2]);
    }

    fn step(&mut self) {
        if self.solver.is_done() {
            return;
        }
        if let Err(e) = self.solver.step() {
            self.exit = Some(Status::Err(e.to_string()));
        }
    }

    fn finish(&mut self) {
        let mut budget = MAX_FINISH_STEPS;
        while !self.solver.is_done() && budget > 0 {
            self.step();
            if self.exit.is_some() {
                return;
            }
            budget -= 1;
        }
    }

    fn cycle_mode(&mut self) {
        let next = u8::from(self.mode) % Mode::COUNT as u8 + 1;
        self.mode = Mode::try_from(next).unwrap_or(Mode::CellStates);
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                self.handle_key_event(key);
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.exit = Some(Status::Ok);
            }
            KeyCode::Char('q') => self.exit = Some(Status::Ok),
            KeyCode::Char('n') => self.step(),
            KeyCode::Char('f') => self.finish(),
            KeyCode::Tab => self.cycle_mode(),
            _ => {}
        }
    }
}
