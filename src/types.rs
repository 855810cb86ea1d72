//! This module defines the core data structures and types used throughout the simulator:
//! tape symbols, fill policies, head directions, state labels, rules, step outcomes and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::parser::GrammarRule;

/// The state every machine starts in, and returns to on reset.
pub const INITIAL_STATE: &str = "q0";
/// The number of cells in the default initial tape and in randomly generated tapes.
pub const DEFAULT_TAPE_LENGTH: usize = 8;
/// The maximum number of steps a batch run executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// A tape cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// An empty cell.
    Blank,
    /// A cell holding `0`.
    Off,
    /// A cell holding `1`.
    On,
}

/// Selects which symbol is synthesized when the tape has to grow.
///
/// This is not a tape value. `Random` picks `Off` or `On` with equal probability
/// for every new cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    #[default]
    Blank,
    Off,
    On,
    Random,
}

impl FillPolicy {
    /// All policies, in the order a front-end cycles through them.
    pub const ALL: [FillPolicy; 4] = [
        FillPolicy::Blank,
        FillPolicy::Off,
        FillPolicy::On,
        FillPolicy::Random,
    ];

    /// Returns the policy following this one in [`FillPolicy::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillPolicy::Blank => "blank",
            FillPolicy::Off => "off",
            FillPolicy::On => "on",
            FillPolicy::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for FillPolicy {
    type Err = TuringMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blank" | "b" => Ok(FillPolicy::Blank),
            "off" | "0" => Ok(FillPolicy::Off),
            "on" | "1" => Ok(FillPolicy::On),
            "random" => Ok(FillPolicy::Random),
            other => Err(TuringMachineError::ConfigError(format!(
                "Unknown fill policy '{}' (expected blank, off, on or random)",
                other
            ))),
        }
    }
}

/// Represents the possible directions the head can move after a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Keep the head in the same position.
    Stay,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// The signed head offset this direction stands for.
    pub fn offset(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Stay => 0,
            Direction::Right => 1,
        }
    }
}

/// An opaque state identifier.
///
/// Labels are reference counted, so cloning one (which happens on every step) never
/// copies the text. Any label is legal; a label that never appears as a guard simply
/// halts the machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateLabel(Arc<str>);

impl StateLabel {
    pub fn new(label: &str) -> Self {
        Self(Arc::from(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two labels share the same allocation.
    pub fn ptr_eq(&self, other: &StateLabel) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for StateLabel {
    fn default() -> Self {
        Self::new(INITIAL_STATE)
    }
}

impl From<&str> for StateLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for StateLabel {
    fn from(label: String) -> Self {
        Self(Arc::from(label))
    }
}

impl PartialEq<str> for StateLabel {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for StateLabel {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single transition: `(if_state, if_symbol) -> (set_symbol, direction, set_state)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// The state the machine must be in for this rule to fire.
    pub if_state: StateLabel,
    /// The symbol that must be under the head for this rule to fire.
    pub if_symbol: Symbol,
    /// The symbol written under the head.
    pub set_symbol: Symbol,
    /// Where the head moves after writing.
    pub direction: Direction,
    /// The state the machine transitions to.
    pub set_state: StateLabel,
}

impl Rule {
    pub fn new(
        if_state: impl Into<StateLabel>,
        if_symbol: Symbol,
        set_symbol: Symbol,
        direction: Direction,
        set_state: impl Into<StateLabel>,
    ) -> Self {
        Self {
            if_state: if_state.into(),
            if_symbol,
            set_symbol,
            direction,
            set_state: set_state.into(),
        }
    }

    /// Whether this rule's guard matches the given state and symbol.
    pub fn matches(&self, state: &StateLabel, symbol: Symbol) -> bool {
        self.if_symbol == symbol && self.if_state == *state
    }
}

/// Represents the outcome of a single machine step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine applied this rule and can continue.
    Applied(Rule),
    /// No rule matches the current state and symbol. Nothing was changed.
    Halt,
}

impl Step {
    pub fn is_halt(&self) -> bool {
        matches!(self, Step::Halt)
    }
}

/// Malformed symbol, direction or rule-line text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Unknown symbol: {0:?}")]
    UnknownSymbol(String),
    #[error("Unknown direction: {0:?}")]
    UnknownDirection(String),
    #[error("Too few fields: expected 5, found {0}")]
    TooFewFields(usize),
    #[error("Too many fields: expected 5, found {0}")]
    TooManyFields(usize),
}

/// Represents various errors that can occur while loading or driving a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A rule-table line could not be decoded. `line` is 1-based.
    #[error("Line {line}: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: EncodingError,
    },
    /// A tape text could not be decoded. `position` is 0-based.
    #[error("Tape position {position}: {source}")]
    Tape {
        position: usize,
        #[source]
        source: EncodingError,
    },
    /// Indicates that the rule table text could not be tokenized.
    #[error("Rule table parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<GrammarRule>>),
    /// Indicates a request that would break a machine invariant.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to reading or writing files.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_policy_serialization() {
        let json = serde_json::to_string(&FillPolicy::Random).unwrap();
        assert_eq!(json, "\"random\"");

        let policy: FillPolicy = serde_json::from_str("\"off\"").unwrap();
        assert_eq!(policy, FillPolicy::Off);
    }

    #[test]
    fn test_fill_policy_from_str() {
        assert_eq!("Blank".parse::<FillPolicy>().unwrap(), FillPolicy::Blank);
        assert_eq!("1".parse::<FillPolicy>().unwrap(), FillPolicy::On);
        assert_eq!(" random ".parse::<FillPolicy>().unwrap(), FillPolicy::Random);
        assert!(matches!(
            "sometimes".parse::<FillPolicy>(),
            Err(TuringMachineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_fill_policy_cycles() {
        assert_eq!(FillPolicy::Blank.next(), FillPolicy::Off);
        assert_eq!(FillPolicy::Random.next(), FillPolicy::Blank);
        assert_eq!(FillPolicy::default(), FillPolicy::Blank);
    }

    #[test]
    fn test_direction_offsets() {
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Stay.offset(), 0);
        assert_eq!(Direction::Right.offset(), 1);
    }

    #[test]
    fn test_state_label_serialization() {
        let label = StateLabel::new("q1");
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, "\"q1\"");

        let back: StateLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);
        assert_eq!(StateLabel::default(), INITIAL_STATE);
    }

    #[test]
    fn test_rule_matches_guard_only() {
        let rule = Rule::new("q0", Symbol::Blank, Symbol::On, Direction::Right, "q1");

        assert!(rule.matches(&StateLabel::new("q0"), Symbol::Blank));
        assert!(!rule.matches(&StateLabel::new("q0"), Symbol::On));
        assert!(!rule.matches(&StateLabel::new("q1"), Symbol::Blank));
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::Encoding {
            line: 3,
            source: EncodingError::TooManyFields(6),
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Line 3"));
        assert!(error_msg.contains("found 6"));
    }
}
