//! This crate provides the core logic for a single-tape binary Turing Machine simulator.
//! It includes the execution engine and its growable tape, the text encodings and rule
//! table parser used by front-ends, a rule analyzer, file loading, settings, built-in
//! programs, and the interactive session controller.

pub mod analyzer;
pub mod config;
pub mod encoder;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod session;
pub mod tape;
pub mod types;

/// Re-exports the `analyze` function and `AnalysisWarning` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisWarning};
/// Re-exports `Settings` from the config module.
pub use config::Settings;
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{decode_rule, decode_tape, dump_tape, encode_rule, encode_tape, TapeDump};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::{Run, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `Program`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{Program, ProgramManager, PROGRAMS};
/// Re-exports the `Session` controller.
pub use session::Session;
/// Re-exports the tape and its filler.
pub use tape::{Filler, Tape};
/// Re-exports the value types and errors from the types module.
pub use types::{
    Direction, EncodingError, FillPolicy, Rule, StateLabel, Step, Symbol, TuringMachineError,
    INITIAL_STATE,
};
