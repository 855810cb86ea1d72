//! This module provides the `ProgramLoader` struct, responsible for moving rule tables,
//! tapes, settings and tape dumps between files and the engine.

use crate::config::Settings;
use crate::encoder::{decode_tape, dump_tape, TapeDump};
use crate::parser::parse;
use crate::types::{Rule, Symbol, TuringMachineError};
use log::warn;
use std::fs;
use std::path::Path;

/// `ProgramLoader` is a utility struct for file-based input and output.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a rule table from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Rule>)` if the file is read and every line decodes.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::Encoding)` naming the first bad line otherwise.
    pub fn load_rules(path: &Path) -> Result<Vec<Rule>, TuringMachineError> {
        parse(&read(path)?)
    }

    /// Loads a rule table from string content, e.g. from a text box or stdin.
    pub fn load_rules_from_string(content: &str) -> Result<Vec<Rule>, TuringMachineError> {
        parse(content)
    }

    /// Loads a tape written in tape text form (`B`, `0`, `1`).
    pub fn load_tape(path: &Path) -> Result<Vec<Symbol>, TuringMachineError> {
        decode_tape(&read(path)?)
    }

    /// Loads settings from a JSON file.
    pub fn load_settings(path: &Path) -> Result<Settings, TuringMachineError> {
        Settings::from_json(&read(path)?)
    }

    /// Writes the flat dump of `symbols` to `path`, replacing any existing file.
    ///
    /// Blank cells are dropped from the output. The returned dump reports how many, since
    /// the order of cells around them cannot be recovered from the file.
    pub fn save_dump(
        path: &Path,
        symbols: impl IntoIterator<Item = Symbol>,
    ) -> Result<TapeDump, TuringMachineError> {
        let dump = dump_tape(symbols);

        if dump.is_lossy() {
            warn!(
                "skipped {} blank cells while saving {}; cell order may be lost",
                dump.skipped_blanks,
                path.display()
            );
        }

        fs::write(path, &dump.bytes).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        Ok(dump)
    }
}

fn read(path: &Path) -> Result<String, TuringMachineError> {
    fs::read_to_string(path).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EncodingError, FillPolicy};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_rules() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("increment.rules");
        write_file(&file_path, "q0 1 1 R q0\nq0 B B L q1\n");

        let rules = ProgramLoader::load_rules(&file_path).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].set_state, "q1");
    }

    #[test]
    fn test_load_invalid_rules() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.rules");
        write_file(&file_path, "q0 1 1 R q0\nnot a rule");

        let result = ProgramLoader::load_rules(&file_path);

        assert_eq!(
            result,
            Err(TuringMachineError::Encoding {
                line: 2,
                source: EncodingError::TooFewFields(3),
            })
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = ProgramLoader::load_rules(&dir.path().join("missing.rules"));

        assert!(matches!(result, Err(TuringMachineError::FileError(_))));
    }

    #[test]
    fn test_load_tape() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tape.txt");
        write_file(&file_path, "10B1\n");

        let tape = ProgramLoader::load_tape(&file_path).unwrap();

        assert_eq!(tape, vec![Symbol::On, Symbol::Off, Symbol::Blank, Symbol::On]);
    }

    #[test]
    fn test_load_settings() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("settings.json");
        write_file(&file_path, r#"{ "fill": "off", "initial_tape": "1111" }"#);

        let settings = ProgramLoader::load_settings(&file_path).unwrap();

        assert_eq!(settings.fill, FillPolicy::Off);
        assert_eq!(settings.tape().unwrap(), vec![Symbol::On; 4]);
    }

    #[test]
    fn test_save_dump() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tape.bin");

        let dump = ProgramLoader::save_dump(
            &file_path,
            [Symbol::On, Symbol::Blank, Symbol::Off, Symbol::On],
        )
        .unwrap();

        assert!(dump.is_lossy());
        assert_eq!(dump.skipped_blanks, 1);
        assert_eq!(fs::read(&file_path).unwrap(), b"11".to_vec());
    }
}
