//! This module defines the `TuringMachine` struct, which simulates a single-tape Turing
//! Machine over the `B`/`0`/`1` alphabet. It owns the tape, the current state, the ordered
//! rule list and the fill policy used when the tape grows.

use crate::tape::{Filler, Growth, Tape};
use crate::types::{FillPolicy, Rule, StateLabel, Step, Symbol, TuringMachineError};
use log::{debug, trace};

/// Summary of a batch of steps executed by [`TuringMachine::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Number of rules applied.
    pub steps: usize,
    /// Whether the batch stopped because no rule matched.
    pub halted: bool,
    /// The last rule applied, if any.
    pub last: Option<Rule>,
}

/// Represents a single-tape Turing Machine.
///
/// A freshly created machine has an empty tape, the head at 0, the state
/// [`INITIAL_STATE`](crate::types::INITIAL_STATE) and no rules.
#[derive(Debug, Clone, Default)]
pub struct TuringMachine {
    state: StateLabel,
    tape: Tape,
    rules: Vec<Rule>,
    filler: Filler,
}

impl TuringMachine {
    /// Creates an empty machine that fills new cells according to `policy`.
    pub fn new(policy: FillPolicy) -> Self {
        Self::with_filler(Filler::new(policy))
    }

    /// Creates an empty machine with an explicit filler, e.g. a seeded one.
    pub fn with_filler(filler: Filler) -> Self {
        Self {
            state: StateLabel::default(),
            tape: Tape::new(),
            rules: Vec::new(),
            filler,
        }
    }

    /// Executes a single step of the machine's computation.
    ///
    /// An empty tape first gets one cell from the fill policy. Then the first rule, in
    /// declaration order, whose guard matches the current state and the symbol under the
    /// head is applied: its symbol is written, the head moves (growing the tape at either
    /// edge) and the state changes.
    ///
    /// # Returns
    ///
    /// * `Step::Applied(rule)` with the rule that fired.
    /// * `Step::Halt` if no rule matches. State and tape are left untouched.
    pub fn step(&mut self) -> Step {
        self.tape.ensure_cell(&mut self.filler);

        let rule = match self.transition().cloned() {
            Some(rule) => rule,
            None => {
                debug!(
                    "halted in state {} at head {} (symbol {:?})",
                    self.state,
                    self.tape.head(),
                    self.tape.read()
                );
                return Step::Halt;
            }
        };

        self.tape.write(rule.set_symbol);

        match self.tape.shift(rule.direction, &mut self.filler) {
            Growth::Left => trace!("tape grew left, length {}", self.tape.len()),
            Growth::Right => trace!("tape grew right, length {}", self.tape.len()),
            Growth::None => {}
        }

        self.state = rule.set_state.clone();

        debug_assert!(
            self.tape.head() < self.tape.len(),
            "head {} out of bounds for tape of length {}",
            self.tape.head(),
            self.tape.len()
        );

        Step::Applied(rule)
    }

    /// Steps until the machine halts or `limit` rules have been applied.
    pub fn run(&mut self, limit: usize) -> Run {
        let mut run = Run {
            steps: 0,
            halted: false,
            last: None,
        };

        while run.steps < limit {
            match self.step() {
                Step::Applied(rule) => {
                    run.steps += 1;
                    run.last = Some(rule);
                }
                Step::Halt => {
                    run.halted = true;
                    break;
                }
            }
        }

        run
    }

    /// Finds the rule that would fire on the next step, without changing anything.
    ///
    /// Rules are scanned in declaration order and the first match wins, so a later rule
    /// with the same guard is never reachable.
    pub fn transition(&self) -> Option<&Rule> {
        let symbol = self.tape.read()?;
        self.rules
            .iter()
            .find(|rule| rule.matches(&self.state, symbol))
    }

    /// Clears the tape, moves the head to 0 and restores the initial state.
    /// The rule list is kept.
    pub fn reset(&mut self) {
        self.tape.clear();
        self.state = StateLabel::default();
    }

    /// Inserts `symbols` at the front of the tape. Call after [`reset`](Self::reset) to
    /// start a run from a given tape.
    pub fn seed_tape(&mut self, symbols: &[Symbol]) {
        self.tape.prepend(symbols);
    }

    /// Moves the head to an existing cell.
    pub fn set_head(&mut self, index: usize) -> Result<(), TuringMachineError> {
        self.tape.set_head(index)
    }

    /// Replaces the whole rule list.
    pub fn set_rules(&mut self, rules: Vec<Rule>) {
        debug!("installed {} rules", rules.len());
        self.rules = rules;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &StateLabel {
        &self.state
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn head(&self) -> usize {
        self.tape.head()
    }

    /// Returns the symbol under the head, or `None` while the tape is still empty.
    pub fn symbol(&self) -> Option<Symbol> {
        self.tape.read()
    }

    pub fn fill_policy(&self) -> FillPolicy {
        self.filler.policy()
    }

    /// Changes how future cells are filled. Existing cells are not touched.
    pub fn set_fill_policy(&mut self, policy: FillPolicy) {
        self.filler.set_policy(policy);
    }

    pub fn filler_mut(&mut self) -> &mut Filler {
        &mut self.filler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, INITIAL_STATE};

    fn machine(policy: FillPolicy, tape: &[Symbol], rules: Vec<Rule>) -> TuringMachine {
        let mut machine = TuringMachine::new(policy);
        machine.seed_tape(tape);
        machine.set_rules(rules);
        machine
    }

    #[test]
    fn test_machine_creation() {
        let machine = TuringMachine::default();

        assert_eq!(machine.state(), INITIAL_STATE);
        assert!(machine.tape().is_empty());
        assert_eq!(machine.head(), 0);
        assert!(machine.rules().is_empty());
        assert_eq!(machine.fill_policy(), FillPolicy::Blank);
    }

    #[test]
    fn test_write_then_grow_right() {
        let rules = vec![Rule::new(
            "q0",
            Symbol::Blank,
            Symbol::On,
            Direction::Right,
            "q1",
        )];
        let mut machine = machine(FillPolicy::Off, &[Symbol::Blank], rules.clone());

        assert_eq!(machine.step(), Step::Applied(rules[0].clone()));
        assert_eq!(machine.tape().symbols(), vec![Symbol::On, Symbol::Off]);
        assert_eq!(machine.head(), 1);
        assert_eq!(machine.state(), "q1");

        assert_eq!(machine.step(), Step::Halt);
        assert_eq!(machine.tape().symbols(), vec![Symbol::On, Symbol::Off]);
        assert_eq!(machine.head(), 1);
        assert_eq!(machine.state(), "q1");
    }

    #[test]
    fn test_endless_left_growth() {
        let rules = vec![Rule::new("q0", Symbol::Off, Symbol::Off, Direction::Left, "q0")];
        let mut machine = machine(FillPolicy::Blank, &[Symbol::Off], rules);

        assert!(!machine.step().is_halt());
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.tape().symbols(), vec![Symbol::Blank, Symbol::Off]);
        assert_eq!(machine.state(), "q0");

        // The new cell is Blank, which no rule reads, so growth stops here.
        assert!(machine.step().is_halt());
    }

    #[test]
    fn test_left_walk_with_matching_fill_never_halts() {
        let rules = vec![Rule::new("q0", Symbol::Off, Symbol::Off, Direction::Left, "q0")];
        let mut machine = machine(FillPolicy::Off, &[Symbol::Off], rules);

        let run = machine.run(50);

        assert_eq!(run.steps, 50);
        assert!(!run.halted);
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.tape().len(), 51);
    }

    #[test]
    fn test_empty_tape_materializes_one_cell() {
        let mut machine = TuringMachine::new(FillPolicy::On);

        assert!(machine.step().is_halt());
        assert_eq!(machine.tape().symbols(), vec![Symbol::On]);
        assert_eq!(machine.state(), INITIAL_STATE);

        assert!(machine.step().is_halt());
        assert_eq!(machine.tape().len(), 1);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            Rule::new("q0", Symbol::Off, Symbol::On, Direction::Stay, "first"),
            Rule::new("q0", Symbol::Off, Symbol::Blank, Direction::Right, "second"),
        ];
        let mut machine = machine(FillPolicy::Blank, &[Symbol::Off], rules);

        assert_eq!(machine.transition().unwrap().set_state, "first");
        machine.step();

        assert_eq!(machine.state(), "first");
        assert_eq!(machine.tape().symbols(), vec![Symbol::On]);
        assert_eq!(machine.head(), 0);
    }

    #[test]
    fn test_reset_keeps_rules() {
        let rules = vec![Rule::new("q0", Symbol::Off, Symbol::On, Direction::Right, "q1")];
        let mut machine = machine(FillPolicy::Off, &[Symbol::Off, Symbol::Off], rules);
        machine.step();

        machine.reset();

        assert!(machine.tape().is_empty());
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.state(), INITIAL_STATE);
        assert_eq!(machine.rules().len(), 1);
    }

    #[test]
    fn test_reset_reseed_without_rules_halts() {
        let mut machine = TuringMachine::new(FillPolicy::On);
        machine.step();
        machine.reset();
        machine.seed_tape(&[Symbol::Off; 8]);

        assert_eq!(machine.step(), Step::Halt);
        assert_eq!(machine.tape().symbols(), vec![Symbol::Off; 8]);
        assert_eq!(machine.state(), INITIAL_STATE);
    }

    #[test]
    fn test_run_stops_on_halt() {
        let rules = vec![
            Rule::new("q0", Symbol::Off, Symbol::On, Direction::Right, "q0"),
            Rule::new("q0", Symbol::Blank, Symbol::Blank, Direction::Stay, "done"),
        ];
        let mut machine = machine(FillPolicy::Blank, &[Symbol::Off; 3], rules);

        let run = machine.run(100);

        assert!(run.halted);
        assert_eq!(run.steps, 4);
        assert_eq!(run.last.unwrap().set_state, "done");
        assert_eq!(
            machine.tape().symbols(),
            vec![Symbol::On, Symbol::On, Symbol::On, Symbol::Blank]
        );
    }

    #[test]
    fn test_fill_policy_change_between_steps() {
        let rules = vec![
            Rule::new("q0", Symbol::Off, Symbol::Off, Direction::Right, "q0"),
            Rule::new("q0", Symbol::On, Symbol::On, Direction::Right, "q0"),
        ];
        let mut machine = machine(FillPolicy::Off, &[Symbol::Off], rules);

        machine.step();
        machine.set_fill_policy(FillPolicy::On);
        machine.step();

        assert_eq!(
            machine.tape().symbols(),
            vec![Symbol::Off, Symbol::Off, Symbol::On]
        );
    }

    #[test]
    fn test_seeded_random_fill_is_reproducible() {
        let rules = vec![
            Rule::new("q0", Symbol::Off, Symbol::Off, Direction::Right, "q0"),
            Rule::new("q0", Symbol::On, Symbol::On, Direction::Right, "q0"),
        ];
        let build = || {
            let mut machine = TuringMachine::with_filler(Filler::with_seed(FillPolicy::Random, 9));
            machine.set_rules(rules.clone());
            machine
        };

        let mut a = build();
        let mut b = build();
        a.run(40);
        b.run(40);

        assert_eq!(a.tape(), b.tape());
        assert_eq!(a.tape().len(), 41);
    }

    #[test]
    fn test_set_head_bounds() {
        let mut machine = machine(FillPolicy::Blank, &[Symbol::Off, Symbol::On], vec![]);

        machine.set_head(1).unwrap();
        assert_eq!(machine.symbol(), Some(Symbol::On));
        assert!(machine.set_head(2).is_err());
    }
}
