use action::Action;
use crossterm::event::{KeyCode, KeyEvent};
use keymap::{Config, KeyMapConfig};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};
use std::path::PathBuf;
use std::time::Instant;
use turbit::{
    encoder::{encode_tape_wide, head_marker},
    ProgramLoader, ProgramManager, Session, Settings, TuringMachineError,
};

const BLOCK_PADDING: Padding = Padding::new(1, 1, 0, 0);
const MIN_SPEED: f64 = 0.25;
const MAX_SPEED: f64 = 64.0;

/// Where typed keys go.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Keys are looked up in the keymap.
    Normal,
    /// Keys edit a copy of the rule text. Esc hands it to the session.
    EditRules(String),
    /// Keys edit a tape text. Enter imports it, Esc discards it.
    EditTape(String),
}

pub struct App {
    session: Session,
    current_program_index: usize,
    show_help: bool,
    mode: Mode,
    pub(crate) keymap: Config<Action>,
    // Set when rules came from a file or stdin, which disables program switching
    program_loaded_from_source: bool,
    program_name: String,
    dump_path: PathBuf,
}

impl App {
    pub fn new_default(settings: Settings, dump_path: PathBuf) -> Result<Self, TuringMachineError> {
        let mut app = Self {
            session: Session::new(settings)?,
            current_program_index: 0,
            show_help: false,
            mode: Mode::Normal,
            keymap: Action::keymap_config(),
            program_loaded_from_source: false,
            program_name: String::new(),
            dump_path,
        };
        app.load_current_program();

        Ok(app)
    }

    pub fn new_from_rules_string(
        rules: String,
        settings: Settings,
        dump_path: PathBuf,
    ) -> Result<Self, TuringMachineError> {
        // Fail before the terminal is taken over if the table does not parse.
        ProgramLoader::load_rules_from_string(&rules)?;

        let mut session = Session::new(settings)?;
        session.edit_rules(rules);
        session.restart();
        if session.message().is_none() {
            session.set_message("Rules loaded from source. Press 'h' for help.");
        }

        Ok(Self {
            session,
            current_program_index: 0,
            show_help: false,
            mode: Mode::Normal,
            keymap: Action::keymap_config(),
            program_loaded_from_source: true,
            program_name: "Custom".to_string(),
            dump_path,
        })
    }

    pub fn render(&mut self, f: &mut Frame) {
        let inner_area = f.area().inner(Margin::new(1, 0));

        // Main vertical chunks: Program Info, Middle (Rules + Machine), Status
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(inner_area);

        self.render_program_info(f, main_chunks[0]);

        let middle_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Length(1),
                Constraint::Percentage(65),
            ])
            .split(main_chunks[1]);

        self.render_rules(f, middle_chunks[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(middle_chunks[2]);

        self.render_machine_state(f, right_chunks[0]);

        if self.show_help {
            self.render_help(f, right_chunks[1]);
        } else {
            self.render_tape(f, right_chunks[1]);
        }

        self.render_status(f, main_chunks[2]);
    }

    fn render_rules(&self, f: &mut Frame, area: Rect) {
        let text = match &self.mode {
            Mode::EditRules(buffer) => buffer.as_str(),
            _ => self.session.rules_text(),
        };

        let mut lines: Vec<Line> = text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                Line::from(vec![
                    Span::styled(format!("{:>3} ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::raw(line),
                ])
            })
            .collect();

        let title = if matches!(self.mode, Mode::EditRules(_)) {
            lines.push(Line::from(Span::styled("_", Style::default().fg(Color::Yellow))));
            "Rules (editing, Esc to finish)"
        } else if self.session.rules_changed() {
            "Rules (not applied, r to restart)"
        } else {
            "Rules"
        };

        let paragraph = section(title, lines).wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_program_info(&self, f: &mut Frame, area: Rect) {
        let settings = self.session.settings();

        let program = if self.program_loaded_from_source {
            self.program_name.clone()
        } else {
            format!(
                "{} ({}/{})",
                self.program_name,
                self.current_program_index + 1,
                ProgramManager::count()
            )
        };

        let text = vec![
            Line::from(vec![
                Span::styled("Program: ", Style::default().fg(Color::Yellow)),
                Span::raw(program),
            ]),
            Line::from(vec![
                Span::styled("Initial Tape: ", Style::default().fg(Color::Yellow)),
                Span::raw(format!("\"{}\"", settings.initial_tape)),
            ]),
            Line::from(vec![
                Span::styled("Fill: ", Style::default().fg(Color::Yellow)),
                Span::raw(settings.fill.to_string()),
                Span::styled(" | Speed: ", Style::default().fg(Color::Yellow)),
                Span::raw(format!("{}/s", settings.speed)),
                Span::styled(" | Steps/Tick: ", Style::default().fg(Color::Yellow)),
                Span::raw(settings.steps_per_tick.to_string()),
                Span::styled(" | Rules: ", Style::default().fg(Color::Yellow)),
                Span::raw(self.session.machine().rules().len().to_string()),
            ]),
        ];

        let paragraph = Paragraph::new(text).block(
            block("Turbit - Binary Turing Machine (TUI)").title_alignment(Alignment::Center),
        );

        f.render_widget(paragraph, area);
    }

    fn render_tape(&self, f: &mut Frame, area: Rect) {
        let tape = self.session.machine().tape();
        let head = tape.head();

        // Full-width cells take two columns each.
        let inner_width = area.width.saturating_sub(4) as usize;
        let visible = (inner_width / 2).max(1);
        let start = if tape.len() <= visible {
            0
        } else {
            head.saturating_sub(visible / 2).min(tape.len() - visible)
        };
        let window: Vec<_> = tape.iter().skip(start).take(visible).collect();

        let mut text_lines = vec![
            Line::from(encode_tape_wide(window)),
            Line::from(Span::styled(
                head_marker(head.saturating_sub(start)),
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "Head at position: {} of {} (cells {}..{} shown)",
                    head,
                    tape.len(),
                    start,
                    (start + visible).min(tape.len())
                ),
                Style::default().fg(Color::Cyan),
            )),
        ];

        if tape.is_empty() {
            text_lines = vec![Line::from(Span::styled(
                "Empty tape: the first step creates a cell from the fill policy.",
                Style::default().fg(Color::Cyan),
            ))];
        }

        f.render_widget(section("Tape", text_lines), area);
    }

    fn render_machine_state(&self, f: &mut Frame, area: Rect) {
        let machine = self.session.machine();
        let halted = machine.symbol().is_some() && machine.transition().is_none();

        let (status_text, status_color) = if halted {
            ("HALTED", Color::Red)
        } else if self.session.is_running() {
            ("RUNNING", Color::Green)
        } else {
            ("READY", Color::Blue)
        };

        let symbol = machine
            .symbol()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        let text = vec![
            Line::from(vec![
                Span::styled("Current State: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    machine.state().to_string(),
                    Style::default()
                        .fg(status_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" | Steps: ", Style::default().fg(Color::Yellow)),
                Span::raw(self.session.steps().to_string()),
                Span::styled(" | Status: ", Style::default().fg(Color::Yellow)),
                Span::styled(status_text, Style::default().fg(status_color)),
            ]),
            Line::from(vec![
                Span::styled("Symbol: ", Style::default().fg(Color::Cyan)),
                Span::raw(symbol),
                Span::styled(" | Last Action: ", Style::default().fg(Color::Cyan)),
                Span::raw(self.session.last_action().unwrap_or_default()),
            ]),
        ];

        f.render_widget(section("Machine State", text), area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from("Controls:"),
            Line::from("  Space - Step forward"),
            Line::from("  p - Start/stop running"),
            Line::from("  r - Apply rules and restart"),
            Line::from("  e - Reset tape and state (keep rules)"),
            Line::from("  b - Step counter back (does not rewind)"),
            Line::from("  a d - Move head left/right (when stopped)"),
            Line::from("  ↑ ↓ - Faster/slower"),
            Line::from("  f - Cycle fill policy"),
            Line::from("  x - Random initial tape"),
            Line::from("  i - Edit rules (Esc to finish, then r to apply)"),
            Line::from("  t - Type an initial tape (Enter to import)"),
            Line::from(format!("  s - Save tape dump to {}", self.dump_path.display())),
            Line::from(if self.program_loaded_from_source {
                "  ← → - Program switching disabled (loaded from file/stdin)"
            } else {
                "  ← → - Switch programs"
            }),
            Line::from("  h - Toggle this help"),
            Line::from("  q - Quit"),
            Line::from(""),
            Line::from("Rules: state symbol write move next, e.g. 'q0 B 1 R q1'"),
            Line::from("  Symbols: B blank, 0 off, 1 on. Moves: L, N, R."),
        ];

        f.render_widget(section("Help", help_text), area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let hint = "h: help  q: quit";
        let outer = block("Status");
        let inner = outer.inner(area);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(hint.len() as u16)])
            .split(inner);

        let running = if self.session.is_running() { "ON" } else { "OFF" };
        let status = if let Mode::EditTape(buffer) = &self.mode {
            Line::from(vec![
                Span::styled("Tape: ", Style::default().fg(Color::Yellow)),
                Span::raw(format!("{}_", buffer)),
                Span::styled(
                    "  (Enter to import, Esc to cancel)",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::raw("Running: "),
                Span::styled(running, Style::default().fg(Color::Yellow)),
                Span::raw(format!(" | {}", self.session.message().unwrap_or_default())),
            ])
        };

        let hint_text = Text::from(
            Line::from(Span::styled(hint, Style::default().fg(Color::Yellow))).right_aligned(),
        );

        f.render_widget(outer, area);
        f.render_widget(status, chunks[0]);
        f.render_widget(hint_text, chunks[1]);
    }

    pub fn handle(&mut self, action: Action) {
        match action {
            Action::Quit => {}
            Action::Restart => self.session.restart(),
            Action::Reset => self.session.reset(),
            Action::Step => {
                self.session.execute();
            }
            Action::ToggleRun => self.session.toggle_running(),
            Action::Back => self.session.back(),
            Action::HeadLeft => self.nudge_head(-1),
            Action::HeadRight => self.nudge_head(1),
            Action::Faster => self.scale_speed(2.0),
            Action::Slower => self.scale_speed(0.5),
            Action::CycleFill => {
                let fill = self.session.settings().fill.next();
                self.session.set_fill_policy(fill);
                self.session.set_message(format!("Fill policy: {}", fill));
            }
            Action::RandomTape => {
                let tape = self.session.random_tape();
                if let Err(e) = self.session.import_tape(&tape) {
                    self.session.set_message(e.to_string());
                }
            }
            Action::EditRules => {
                self.mode = Mode::EditRules(self.session.rules_text().to_string());
            }
            Action::ImportTape => {
                self.mode = Mode::EditTape(self.session.settings().initial_tape.clone());
            }
            Action::Save => self.save_dump(),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::PreviousProgram => self.previous_program(),
            Action::NextProgram => self.next_program(),
        }
    }

    /// Whether keys should go to [`handle_input`](Self::handle_input) instead of the keymap.
    pub fn is_editing(&self) -> bool {
        self.mode != Mode::Normal
    }

    /// Feeds a key to the open rule or tape editor.
    pub fn handle_input(&mut self, key: KeyEvent) {
        match &mut self.mode {
            Mode::Normal => {}
            Mode::EditRules(buffer) => match key.code {
                KeyCode::Esc => {
                    let text = std::mem::take(buffer);
                    self.mode = Mode::Normal;
                    if text != self.session.rules_text() {
                        self.session.edit_rules(text);
                        self.session
                            .set_message("Rules edited. Press 'r' to apply them and restart.");
                    }
                }
                KeyCode::Enter => buffer.push('\n'),
                KeyCode::Tab => buffer.push(' '),
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            },
            Mode::EditTape(buffer) => match key.code {
                KeyCode::Esc => self.mode = Mode::Normal,
                KeyCode::Enter => {
                    let text = std::mem::take(buffer);
                    self.mode = Mode::Normal;
                    if let Err(e) = self.session.import_tape(&text) {
                        self.session.set_message(e.to_string());
                    }
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            },
        }
    }

    /// Advances the machine if it is running and a timer tick is due.
    pub fn tick(&mut self) {
        self.session.tick(Instant::now());
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    fn nudge_head(&mut self, delta: isize) {
        if let Err(e) = self.session.nudge_head(delta) {
            self.session.set_message(e.to_string());
        }
    }

    fn scale_speed(&mut self, factor: f64) {
        let speed = (self.session.settings().speed * factor).clamp(MIN_SPEED, MAX_SPEED);
        match self.session.set_speed(speed) {
            Ok(()) => self.session.set_message(format!("Speed: {}/s", speed)),
            Err(e) => self.session.set_message(e.to_string()),
        }
    }

    fn save_dump(&mut self) {
        match self.session.save_dump(&self.dump_path) {
            Ok(()) if self.session.message().is_none() => {
                let message = format!("Saved tape dump to {}", self.dump_path.display());
                self.session.set_message(message);
            }
            Ok(()) => {}
            Err(e) => self.session.set_message(e.to_string()),
        }
    }

    fn next_program(&mut self) {
        if self.program_loaded_from_source {
            self.session
                .set_message("Cannot switch programs when loaded from file/stdin.");
            return;
        }
        let count = ProgramManager::count();
        if count == 0 {
            return;
        }
        self.current_program_index = (self.current_program_index + 1) % count;
        self.load_current_program();
    }

    fn previous_program(&mut self) {
        if self.program_loaded_from_source {
            self.session
                .set_message("Cannot switch programs when loaded from file/stdin.");
            return;
        }
        let count = ProgramManager::count();
        if count == 0 {
            return;
        }
        self.current_program_index = if self.current_program_index == 0 {
            count - 1
        } else {
            self.current_program_index - 1
        };
        self.load_current_program();
    }

    fn load_current_program(&mut self) {
        match ProgramManager::get_program_by_index(self.current_program_index) {
            Ok(program) => {
                self.session.load_program(program);
                self.program_name = program.name.to_string();
                if self.session.message().is_none() {
                    self.session
                        .set_message(format!("Loaded program: {}", program.description));
                }
            }
            Err(e) => self.session.set_message(e.to_string()),
        }
    }
}

fn section<'a>(title: &'a str, content: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(content).block(block(title))
}

fn block(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .padding(BLOCK_PADDING)
}
