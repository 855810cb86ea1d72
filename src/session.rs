//! The interactive controller that front-ends drive.
//!
//! A `Session` owns one machine plus everything that only matters to a person watching
//! it: the step counter, whether it is running, when the next timer tick is due, the
//! rule text being edited, and the message to show. The engine itself knows nothing
//! about any of this.

use crate::analyzer::analyze;
use crate::config::{tick_interval, Settings};
use crate::encoder::{decode_tape, encode_action, encode_tape};
use crate::loader::ProgramLoader;
use crate::machine::TuringMachine;
use crate::parser::parse;
use crate::programs::Program;
use crate::tape::Filler;
use crate::types::{FillPolicy, Rule, Step, Symbol, TuringMachineError, DEFAULT_TAPE_LENGTH};
use log::{debug, warn};
use std::path::Path;
use std::time::{Duration, Instant};

pub const HALT_MESSAGE: &str = "Halted: no rule matches the current state and symbol.";
pub const PENDING_RULES_MESSAGE: &str = "Rule changes are not applied yet. Restart to apply them.";
pub const ALREADY_RUNNING_MESSAGE: &str = "The machine is already running.";
pub const BUSY_MESSAGE: &str = "Stop the machine first.";
pub const LOSSY_DUMP_MESSAGE: &str = "Blank cells were skipped while saving; cell order may be lost.";

pub struct Session {
    machine: TuringMachine,
    settings: Settings,
    // Draws random tapes, kept apart from the machine's fill sequence
    tape_source: Filler,
    initial_tape: Vec<Symbol>,
    rules_text: String,
    rules_changed: bool,
    running: bool,
    next_tick: Option<Instant>,
    steps: usize,
    last_action: Option<Rule>,
    message: Option<String>,
}

impl Session {
    /// Creates a stopped session with no rules, seeded with the configured initial tape.
    pub fn new(settings: Settings) -> Result<Self, TuringMachineError> {
        settings.validate()?;

        let mut session = Self {
            machine: TuringMachine::with_filler(seeded_filler(&settings)),
            tape_source: seeded_filler(&settings),
            initial_tape: settings.tape()?,
            settings,
            rules_text: String::new(),
            rules_changed: false,
            running: false,
            next_tick: None,
            steps: 0,
            last_action: None,
            message: None,
        };
        session.reset();

        Ok(session)
    }

    /// Replaces the rule text being edited. The machine keeps its current rules until
    /// the next [`restart`](Self::restart).
    pub fn edit_rules(&mut self, text: impl Into<String>) {
        self.rules_text = text.into();
        self.rules_changed = true;
    }

    /// Stops, zeroes the counter, resets the machine onto the initial tape and commits the
    /// edited rules.
    ///
    /// If the rule text does not parse, the machine keeps its previous rules and the
    /// error becomes the session message.
    pub fn restart(&mut self) {
        self.reset();
        self.last_action = None;
        self.message = None;

        match self.commit_rules() {
            Ok(()) => self.rules_changed = false,
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn commit_rules(&mut self) -> Result<(), TuringMachineError> {
        let rules = parse(&self.rules_text)?;

        let warnings = analyze(&rules);
        for warning in &warnings {
            warn!("{}", warning);
        }
        if let Some(warning) = warnings.iter().find(|w| !w.is_informational()) {
            self.message = Some(warning.to_string());
        }

        self.machine.set_rules(rules);
        Ok(())
    }

    /// Stops, zeroes the counter and resets the machine onto the initial tape. Rules are
    /// left as they are.
    ///
    /// The fill source starts over from the configured seed, so a seeded session replays
    /// the same random cells after every reset.
    pub fn reset(&mut self) {
        self.running = false;
        self.next_tick = None;
        self.steps = 0;
        *self.machine.filler_mut() = seeded_filler(&self.settings);
        self.machine.reset();
        self.machine.seed_tape(&self.initial_tape);
    }

    /// Performs one manual step, warning first when edited rules are still pending.
    pub fn execute(&mut self) -> bool {
        self.message = self.rules_changed.then(|| PENDING_RULES_MESSAGE.to_string());
        self.step()
    }

    /// Runs `execs_per_step` engine steps.
    ///
    /// Every applied rule bumps the counter. On a halt the session stops running, sets the
    /// halt message and returns `false`.
    pub fn step(&mut self) -> bool {
        for _ in 0..self.settings.execs_per_step {
            match self.machine.step() {
                Step::Applied(rule) => {
                    self.steps += 1;
                    self.last_action = Some(rule);
                }
                Step::Halt => {
                    debug!("session halted after {} steps", self.steps);
                    self.message = Some(HALT_MESSAGE.to_string());
                    self.running = false;
                    self.next_tick = None;
                    return false;
                }
            }
        }

        true
    }

    /// Starts continuous running. The first tick is due immediately.
    pub fn start(&mut self) {
        if self.running {
            self.message = Some(ALREADY_RUNNING_MESSAGE.to_string());
            return;
        }

        self.message = self.rules_changed.then(|| PENDING_RULES_MESSAGE.to_string());
        self.running = true;
        self.next_tick = None;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_tick = None;
    }

    pub fn toggle_running(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Advances a running session if a tick is due at `now`.
    ///
    /// A due tick performs up to `steps_per_tick` steps, stopping early on a halt, and
    /// schedules the next tick one interval after `now`. Returns the number of steps that
    /// completed without halting.
    pub fn tick(&mut self, now: Instant) -> usize {
        if !self.running || self.next_tick.is_some_and(|due| due > now) {
            return 0;
        }

        let mut performed = 0;
        for _ in 0..self.settings.steps_per_tick {
            if !self.step() {
                break;
            }
            performed += 1;
        }

        if self.running {
            self.next_tick = Some(now + self.settings.interval());
        }

        performed
    }

    /// Decrements the step counter. The machine itself is not rewound.
    pub fn back(&mut self) {
        self.steps = self.steps.saturating_sub(1);
    }

    /// Moves the head to an existing cell. Refused while running.
    pub fn seek(&mut self, index: usize) -> Result<(), TuringMachineError> {
        if self.running {
            self.message = Some(BUSY_MESSAGE.to_string());
            return Ok(());
        }

        self.message = None;
        self.machine.set_head(index)
    }

    /// Moves the head by `delta` cells, clamped to the tape.
    pub fn nudge_head(&mut self, delta: isize) -> Result<(), TuringMachineError> {
        let len = self.machine.tape().len();
        if len == 0 {
            return Ok(());
        }

        let target = self
            .machine
            .head()
            .saturating_add_signed(delta)
            .min(len - 1);
        self.seek(target)
    }

    /// Replaces the initial tape with decoded `text` and restarts. Refused while running.
    pub fn import_tape(&mut self, text: &str) -> Result<(), TuringMachineError> {
        if self.running {
            self.message = Some(BUSY_MESSAGE.to_string());
            return Ok(());
        }

        self.initial_tape = decode_tape(text)?;
        self.settings.initial_tape = encode_tape(self.initial_tape.iter().copied());
        self.restart();
        Ok(())
    }

    /// Generates tape text of random `0`/`1` cells, suitable for [`import_tape`](Self::import_tape).
    pub fn random_tape(&mut self) -> String {
        encode_tape(self.tape_source.random_symbols(DEFAULT_TAPE_LENGTH))
    }

    /// Writes the current tape's dump to `path`.
    pub fn save_dump(&mut self, path: &Path) -> Result<(), TuringMachineError> {
        let dump = ProgramLoader::save_dump(path, self.machine.tape().iter())?;
        self.message = dump.is_lossy().then(|| LOSSY_DUMP_MESSAGE.to_string());
        Ok(())
    }

    /// Loads a built-in program: its rules, tape and fill policy, then restarts.
    pub fn load_program(&mut self, program: &Program) {
        self.edit_rules(program.source);
        self.initial_tape = program.tape.clone();
        self.settings.initial_tape = encode_tape(program.tape.iter().copied());
        self.set_fill_policy(program.fill);
        self.restart();
    }

    pub fn set_fill_policy(&mut self, policy: FillPolicy) {
        self.settings.fill = policy;
        self.machine.set_fill_policy(policy);
    }

    /// Sets ticks per second. A speed whose tick interval cannot be scheduled is refused
    /// and the current speed is kept.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), TuringMachineError> {
        tick_interval(speed)?;
        self.settings.speed = speed;
        Ok(())
    }

    pub fn set_steps_per_tick(&mut self, steps: usize) {
        self.settings.steps_per_tick = steps.max(1);
    }

    pub fn set_execs_per_step(&mut self, execs: usize) {
        self.settings.execs_per_step = execs.max(1);
    }

    pub fn machine(&self) -> &TuringMachine {
        &self.machine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn interval(&self) -> Duration {
        self.settings.interval()
    }

    /// Applied steps since the last reset, minus any [`back`](Self::back) presses.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rules_changed(&self) -> bool {
        self.rules_changed
    }

    pub fn rules_text(&self) -> &str {
        &self.rules_text
    }

    pub fn initial_tape(&self) -> &[Symbol] {
        &self.initial_tape
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Replaces the session message, e.g. with the outcome of a front-end action.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// The compact label of the last applied rule, e.g. `R1q1`.
    pub fn last_action(&self) -> Option<String> {
        self.last_action.as_ref().map(encode_action)
    }
}

fn seeded_filler(settings: &Settings) -> Filler {
    match settings.seed {
        Some(seed) => Filler::with_seed(settings.fill, seed),
        None => Filler::new(settings.fill),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::ProgramManager;
    use crate::types::INITIAL_STATE;
    use tempfile::tempdir;

    fn session(rules: &str) -> Session {
        let mut session = Session::new(Settings::default()).unwrap();
        session.edit_rules(rules);
        session.restart();
        session
    }

    #[test]
    fn test_new_session_is_seeded() {
        let session = Session::new(Settings::default()).unwrap();

        assert_eq!(session.machine().tape().symbols(), vec![Symbol::Off; 8]);
        assert_eq!(session.steps(), 0);
        assert!(!session.is_running());
        assert!(session.machine().rules().is_empty());
    }

    #[test]
    fn test_step_counts_applied_rules() {
        let mut session = session("q0 0 1 R q0");

        assert!(session.step());
        assert!(session.step());
        assert_eq!(session.steps(), 2);
        assert_eq!(session.last_action().as_deref(), Some("R1q0"));
    }

    #[test]
    fn test_halt_stops_and_reports() {
        let mut session = session("q0 0 1 N q1");
        session.start();

        assert!(session.step());
        assert!(!session.step());
        assert!(!session.is_running());
        assert_eq!(session.message(), Some(HALT_MESSAGE));
        assert_eq!(session.steps(), 1);
    }

    #[test]
    fn test_execs_per_step() {
        let mut session = session("q0 0 1 R q0");
        session.set_execs_per_step(3);

        session.step();

        assert_eq!(session.steps(), 3);
        assert_eq!(session.machine().head(), 3);
    }

    #[test]
    fn test_back_is_cosmetic() {
        let mut session = session("q0 0 1 R q0");
        session.step();
        session.step();

        session.back();
        assert_eq!(session.steps(), 1);
        assert_eq!(session.machine().head(), 2);

        session.back();
        session.back();
        assert_eq!(session.steps(), 0);
    }

    #[test]
    fn test_bad_rules_keep_previous_table() {
        let mut session = session("q0 0 1 R q0");

        session.edit_rules("q0 0 1 R q0\nq0 1 1 X q0");
        session.restart();

        assert_eq!(session.machine().rules().len(), 1);
        assert!(session.rules_changed());
        assert!(session.message().unwrap().contains("Line 2"));
    }

    #[test]
    fn test_pending_rules_warning() {
        let mut session = session("q0 0 1 R q0");
        session.edit_rules("q0 0 0 L q0");

        session.execute();
        assert_eq!(session.message(), Some(PENDING_RULES_MESSAGE));
        // The committed rules are still the old ones.
        assert_eq!(session.last_action().as_deref(), Some("R1q0"));

        session.restart();
        assert!(!session.rules_changed());
        session.execute();
        assert_eq!(session.message(), None);
    }

    #[test]
    fn test_shadowed_rules_are_reported() {
        let session = session("q0 0 1 R q0\nq0 0 0 L q0");

        assert_eq!(session.machine().rules().len(), 2);
        assert!(session.message().unwrap().contains("unreachable"));
    }

    #[test]
    fn test_tick_is_paced() {
        let mut session = session("q0 0 1 R q0");
        session.set_steps_per_tick(2);
        let now = Instant::now();

        assert_eq!(session.tick(now), 0);

        session.start();
        assert!(session.is_running());
        assert_eq!(session.tick(now), 2);
        assert_eq!(session.tick(now + Duration::from_millis(500)), 0);
        assert_eq!(session.tick(now + Duration::from_secs(1)), 2);
        assert_eq!(session.steps(), 4);

        session.stop();
        assert_eq!(session.tick(now + Duration::from_secs(5)), 0);
    }

    #[test]
    fn test_tick_stops_on_halt() {
        let mut session = session("q0 0 1 N q1");
        session.set_steps_per_tick(5);
        session.start();

        assert_eq!(session.tick(Instant::now()), 1);
        assert!(!session.is_running());
    }

    #[test]
    fn test_start_twice_warns() {
        let mut session = session("q0 0 1 R q0");
        session.start();
        session.start();

        assert_eq!(session.message(), Some(ALREADY_RUNNING_MESSAGE));
    }

    #[test]
    fn test_seek_and_nudge() {
        let mut session = session("");

        session.seek(5).unwrap();
        assert_eq!(session.machine().head(), 5);
        assert!(session.seek(8).is_err());

        session.nudge_head(10).unwrap();
        assert_eq!(session.machine().head(), 7);
        session.nudge_head(-20).unwrap();
        assert_eq!(session.machine().head(), 0);

        session.start();
        session.seek(3).unwrap();
        assert_eq!(session.machine().head(), 0);
        assert_eq!(session.message(), Some(BUSY_MESSAGE));
    }

    #[test]
    fn test_import_tape() {
        let mut session = session("q0 1 1 R q0");
        session.step();

        session.import_tape("1B0").unwrap();

        assert_eq!(
            session.machine().tape().symbols(),
            vec![Symbol::On, Symbol::Blank, Symbol::Off]
        );
        assert_eq!(session.steps(), 0);
        assert_eq!(session.machine().state(), INITIAL_STATE);
        assert_eq!(session.settings().initial_tape, "1B0");

        assert!(matches!(
            session.import_tape("12"),
            Err(TuringMachineError::Tape { position: 1, .. })
        ));
    }

    #[test]
    fn test_set_speed_refuses_unschedulable_values() {
        let mut session = Session::new(Settings::default()).unwrap();

        session.set_speed(4.0).unwrap();
        assert!(matches!(
            session.set_speed(1e-300),
            Err(TuringMachineError::ConfigError(_))
        ));
        assert!(session.set_speed(0.0).is_err());
        assert_eq!(session.settings().speed, 4.0);
        assert_eq!(session.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_new_rejects_unschedulable_speed() {
        let settings = Settings {
            speed: 1e-300,
            ..Settings::default()
        };

        assert!(Session::new(settings).is_err());
    }

    #[test]
    fn test_seeded_random_fill_replays_after_restart() {
        let mut session = Session::new(Settings {
            fill: FillPolicy::Random,
            seed: Some(11),
            initial_tape: String::new(),
            ..Settings::default()
        })
        .unwrap();
        session.edit_rules("q0 0 0 R q0\nq0 1 1 R q0");
        session.restart();

        for _ in 0..20 {
            session.step();
        }
        let first = encode_tape(session.machine().tape().iter());

        // Drawing a random tape must not disturb the fill sequence.
        session.random_tape();
        session.restart();
        for _ in 0..20 {
            session.step();
        }
        let second = encode_tape(session.machine().tape().iter());

        assert_eq!(first.len(), 21);
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_tape_is_importable() {
        let mut session = Session::new(Settings {
            seed: Some(3),
            ..Settings::default()
        })
        .unwrap();

        let text = session.random_tape();

        assert_eq!(text.len(), DEFAULT_TAPE_LENGTH);
        assert!(text.chars().all(|c| c == '0' || c == '1'));
        session.import_tape(&text).unwrap();
    }

    #[test]
    fn test_reset_reseeds_without_rules() {
        let mut session = session("");
        session.reset();

        assert!(!session.step());
        assert_eq!(session.machine().tape().symbols(), vec![Symbol::Off; 8]);
        assert_eq!(session.machine().state(), INITIAL_STATE);
    }

    #[test]
    fn test_save_dump_warns_when_lossy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape.bin");
        let mut session = session("q0 0 1 R q0");
        session.import_tape("0B1").unwrap();

        session.save_dump(&path).unwrap();

        assert_eq!(session.message(), Some(LOSSY_DUMP_MESSAGE));
        assert_eq!(std::fs::read(&path).unwrap(), b"1".to_vec());
    }

    #[test]
    fn test_load_program() {
        let mut session = Session::new(Settings::default()).unwrap();
        let program = ProgramManager::get_program_by_name("Busy beaver (2 states)").unwrap();

        session.load_program(program);
        while session.step() {}

        assert_eq!(session.steps(), 6);
        assert_eq!(session.machine().fill_policy(), FillPolicy::Off);
    }
}
