//! Text encodings used to move symbols, directions, rules and tapes across the boundary
//! between the engine and its front-ends, plus the flat tape dump format.
//!
//! | Value       | Encoding                                                   |
//! |-------------|------------------------------------------------------------|
//! | `Symbol`    | `B` blank, `0` off, `1` on                                 |
//! | `Direction` | `L` left, `N` stay, `R` right                              |
//! | `Rule`      | `if_state if_symbol set_symbol direction set_state`        |
//! | Tape dump   | one `1` byte per `On` cell, nothing for `Off` or `Blank`   |

use crate::types::{Direction, EncodingError, Rule, StateLabel, Symbol, TuringMachineError};
use std::fmt;
use std::str::FromStr;

const WIDE_BLANK: char = '\u{ff22}';
const WIDE_OFF: char = '\u{ff10}';
const WIDE_ON: char = '\u{ff11}';
const WIDE_CARET: char = '\u{ff3e}';
const WIDE_SPACE: char = '\u{3000}';

/// The byte written to a tape dump for every `On` cell.
pub const DUMP_ON_BYTE: u8 = b'1';

pub fn encode_symbol(symbol: Symbol) -> char {
    match symbol {
        Symbol::Blank => 'B',
        Symbol::Off => '0',
        Symbol::On => '1',
    }
}

/// Decodes a single symbol character.
pub fn decode_symbol_char(c: char) -> Result<Symbol, EncodingError> {
    match c {
        'B' => Ok(Symbol::Blank),
        '0' => Ok(Symbol::Off),
        '1' => Ok(Symbol::On),
        other => Err(EncodingError::UnknownSymbol(other.to_string())),
    }
}

/// Decodes a symbol token, which must be exactly one character long.
pub fn decode_symbol(text: &str) -> Result<Symbol, EncodingError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => decode_symbol_char(c),
        _ => Err(EncodingError::UnknownSymbol(text.to_string())),
    }
}

pub fn encode_direction(direction: Direction) -> char {
    match direction {
        Direction::Left => 'L',
        Direction::Stay => 'N',
        Direction::Right => 'R',
    }
}

/// Decodes a direction token, which must be exactly one of `L`, `N` or `R`.
pub fn decode_direction(text: &str) -> Result<Direction, EncodingError> {
    match text {
        "L" => Ok(Direction::Left),
        "N" => Ok(Direction::Stay),
        "R" => Ok(Direction::Right),
        other => Err(EncodingError::UnknownDirection(other.to_string())),
    }
}

/// Encodes a rule as a single rule-table line.
pub fn encode_rule(rule: &Rule) -> String {
    format!(
        "{} {} {} {} {}",
        rule.if_state,
        encode_symbol(rule.if_symbol),
        encode_symbol(rule.set_symbol),
        encode_direction(rule.direction),
        rule.set_state
    )
}

/// Decodes a single rule-table line of five whitespace-separated tokens.
pub fn decode_rule(line: &str) -> Result<Rule, EncodingError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    decode_rule_fields(&fields, StateLabel::new)
}

/// Builds a rule from already split tokens. `label` turns state tokens into labels, which
/// lets a table parser share one allocation per distinct state.
pub(crate) fn decode_rule_fields(
    fields: &[&str],
    mut label: impl FnMut(&str) -> StateLabel,
) -> Result<Rule, EncodingError> {
    match fields.len() {
        n if n < 5 => return Err(EncodingError::TooFewFields(n)),
        n if n > 5 => return Err(EncodingError::TooManyFields(n)),
        _ => {}
    }

    Ok(Rule {
        if_state: label(fields[0]),
        if_symbol: decode_symbol(fields[1])?,
        set_symbol: decode_symbol(fields[2])?,
        direction: decode_direction(fields[3])?,
        set_state: label(fields[4]),
    })
}

/// Encodes a whole rule list, one rule per line.
pub fn encode_rules(rules: &[Rule]) -> String {
    rules.iter().map(encode_rule).collect::<Vec<_>>().join("\n")
}

/// Encodes the "last operation" label shown after a step, e.g. `R1q1`.
pub fn encode_action(rule: &Rule) -> String {
    format!(
        "{}{}{}",
        encode_direction(rule.direction),
        encode_symbol(rule.set_symbol),
        rule.set_state
    )
}

/// Encodes tape cells as a plain string, e.g. `B0110`.
pub fn encode_tape(symbols: impl IntoIterator<Item = Symbol>) -> String {
    symbols.into_iter().map(encode_symbol).collect()
}

/// Encodes tape cells with full-width characters, which line up with [`head_marker`].
pub fn encode_tape_wide(symbols: impl IntoIterator<Item = Symbol>) -> String {
    symbols
        .into_iter()
        .map(|symbol| match symbol {
            Symbol::Blank => WIDE_BLANK,
            Symbol::Off => WIDE_OFF,
            Symbol::On => WIDE_ON,
        })
        .collect()
}

/// Renders a caret under cell `head` of a wide-encoded tape.
pub fn head_marker(head: usize) -> String {
    std::iter::repeat(WIDE_SPACE)
        .take(head)
        .chain(std::iter::once(WIDE_CARET))
        .collect()
}

/// Decodes a plain tape string. Surrounding whitespace is ignored.
pub fn decode_tape(text: &str) -> Result<Vec<Symbol>, TuringMachineError> {
    text.trim()
        .chars()
        .enumerate()
        .map(|(position, c)| {
            decode_symbol_char(c).map_err(|source| TuringMachineError::Tape { position, source })
        })
        .collect()
}

/// The flat export of a tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeDump {
    /// One [`DUMP_ON_BYTE`] per `On` cell.
    pub bytes: Vec<u8>,
    /// How many `Blank` cells were dropped. Cell order cannot be recovered across them.
    pub skipped_blanks: usize,
}

impl TapeDump {
    pub fn is_lossy(&self) -> bool {
        self.skipped_blanks > 0
    }
}

/// Dumps a tape: `On` cells become [`DUMP_ON_BYTE`], `Off` cells produce nothing and
/// `Blank` cells are skipped and counted.
pub fn dump_tape(symbols: impl IntoIterator<Item = Symbol>) -> TapeDump {
    let mut dump = TapeDump {
        bytes: Vec::new(),
        skipped_blanks: 0,
    };

    for symbol in symbols {
        match symbol {
            Symbol::Blank => dump.skipped_blanks += 1,
            Symbol::On => dump.bytes.push(DUMP_ON_BYTE),
            Symbol::Off => {}
        }
    }

    dump
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode_symbol(*self))
    }
}

impl FromStr for Symbol {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_symbol(s)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode_direction(*self))
    }
}

impl FromStr for Direction {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_direction(s)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_rule(self))
    }
}

impl FromStr for Rule {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_rule(s)
    }
}
