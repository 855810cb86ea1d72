//! Built-in demo programs, embedded at compile time and parsed on first use.

use crate::encoder::decode_tape;
use crate::parser::parse;
use crate::types::{FillPolicy, Rule, Symbol, TuringMachineError};
use log::error;

/// A rule table bundled with the tape and fill policy it is meant to run with.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: &'static str,
    pub description: &'static str,
    /// The rule table text the rules were parsed from.
    pub source: &'static str,
    pub rules: Vec<Rule>,
    pub tape: Vec<Symbol>,
    pub fill: FillPolicy,
}

struct Embedded {
    name: &'static str,
    description: &'static str,
    source: &'static str,
    tape: &'static str,
    fill: FillPolicy,
}

const EMBEDDED: [Embedded; 4] = [
    Embedded {
        name: "Binary increment",
        description: "Adds one to the binary number on the tape",
        source: include_str!("../programs/binary-increment.rules"),
        tape: "1011",
        fill: FillPolicy::Blank,
    },
    Embedded {
        name: "Bit inverter",
        description: "Flips every bit up to the first blank",
        source: include_str!("../programs/bit-inverter.rules"),
        tape: "00000000",
        fill: FillPolicy::Blank,
    },
    Embedded {
        name: "Busy beaver (2 states)",
        description: "Writes four ones in six steps on an all-zero tape",
        source: include_str!("../programs/busy-beaver-2.rules"),
        tape: "",
        fill: FillPolicy::Off,
    },
    Embedded {
        name: "Endless left walk",
        description: "Walks left forever, growing the tape on every step",
        source: include_str!("../programs/left-walk.rules"),
        tape: "0",
        fill: FillPolicy::Off,
    },
];

lazy_static::lazy_static! {
    /// All built-in programs that parsed successfully, in catalogue order.
    pub static ref PROGRAMS: Vec<Program> = EMBEDDED
        .iter()
        .filter_map(|embedded| match build(embedded) {
            Ok(program) => Some(program),
            Err(e) => {
                error!("failed to parse built-in program {}: {}", embedded.name, e);
                None
            }
        })
        .collect();
}

fn build(embedded: &Embedded) -> Result<Program, TuringMachineError> {
    Ok(Program {
        name: embedded.name,
        description: embedded.description,
        source: embedded.source,
        rules: parse(embedded.source)?,
        tape: decode_tape(embedded.tape)?,
        fill: embedded.fill,
    })
}

/// Lookup helpers over [`PROGRAMS`].
pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<&'static Program, TuringMachineError> {
        PROGRAMS.get(index).ok_or_else(|| {
            TuringMachineError::ValidationError(format!("Program index {} out of range", index))
        })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<&'static Program, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|program| program.name).collect()
    }
}
