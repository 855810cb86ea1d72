//! Simulator settings: fill policy, initial tape and pacing of continuous runs.
//!
//! Settings are usually read from a JSON file and then overridden by command-line flags.
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```json
//! { "fill": "random", "seed": 7, "speed": 4.0 }
//! ```

use crate::encoder::decode_tape;
use crate::types::{FillPolicy, Symbol, TuringMachineError, MAX_EXECUTION_STEPS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The tape a session starts from unless told otherwise: eight `Off` cells.
pub const DEFAULT_INITIAL_TAPE: &str = "00000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// What new tape cells contain.
    pub fill: FillPolicy,
    /// The tape every restart begins with, in tape text form.
    pub initial_tape: String,
    /// Steps performed per timer tick while running.
    pub steps_per_tick: usize,
    /// Engine steps performed by one "step" action.
    pub execs_per_step: usize,
    /// Timer ticks per second while running.
    pub speed: f64,
    /// Seed for random fills. `None` seeds from system entropy.
    pub seed: Option<u64>,
    /// Upper bound on steps for batch runs.
    pub max_steps: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fill: FillPolicy::default(),
            initial_tape: DEFAULT_INITIAL_TAPE.to_string(),
            steps_per_tick: 1,
            execs_per_step: 1,
            speed: 1.0,
            seed: None,
            max_steps: MAX_EXECUTION_STEPS,
        }
    }
}

impl Settings {
    /// Parses settings from JSON and validates them.
    pub fn from_json(content: &str) -> Result<Self, TuringMachineError> {
        let settings: Settings = serde_json::from_str(content)
            .map_err(|e| TuringMachineError::ConfigError(format!("Invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that counts are positive, the speed is a positive number and the initial
    /// tape decodes.
    pub fn validate(&self) -> Result<(), TuringMachineError> {
        if self.steps_per_tick == 0 {
            return Err(TuringMachineError::ConfigError(
                "steps_per_tick must be at least 1".to_string(),
            ));
        }
        if self.execs_per_step == 0 {
            return Err(TuringMachineError::ConfigError(
                "execs_per_step must be at least 1".to_string(),
            ));
        }
        tick_interval(self.speed)?;

        self.tape().map(|_| ())
    }

    /// Decodes the initial tape.
    pub fn tape(&self) -> Result<Vec<Symbol>, TuringMachineError> {
        decode_tape(&self.initial_tape)
            .map_err(|e| TuringMachineError::ConfigError(format!("initial_tape: {}", e)))
    }

    /// Time between two timer ticks. Saturates for a speed that [`validate`](Self::validate)
    /// would reject.
    pub fn interval(&self) -> Duration {
        tick_interval(self.speed).unwrap_or(Duration::MAX)
    }
}

/// Converts ticks per second into the time between ticks.
///
/// The speed must be positive and finite, and its interval must fit in a `Duration`.
pub fn tick_interval(speed: f64) -> Result<Duration, TuringMachineError> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(TuringMachineError::ConfigError(format!(
            "speed must be a positive number, got {}",
            speed
        )));
    }

    Duration::try_from_secs_f64(1.0 / speed).map_err(|_| {
        TuringMachineError::ConfigError(format!("speed {} is too slow to schedule", speed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.fill, FillPolicy::Blank);
        assert_eq!(settings.tape().unwrap(), vec![Symbol::Off; 8]);
        assert_eq!(settings.interval(), Duration::from_secs(1));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(r#"{ "fill": "random", "seed": 7, "speed": 4.0 }"#).unwrap();

        assert_eq!(settings.fill, FillPolicy::Random);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.interval(), Duration::from_millis(250));
        assert_eq!(settings.initial_tape, DEFAULT_INITIAL_TAPE);
        assert_eq!(settings.max_steps, MAX_EXECUTION_STEPS);
    }

    #[test]
    fn test_tick_interval_bounds() {
        assert_eq!(tick_interval(2.0).unwrap(), Duration::from_millis(500));
        assert!(tick_interval(1e-300).is_err());
        assert!(tick_interval(f64::NAN).is_err());

        let settings = Settings {
            speed: 1e-300,
            ..Settings::default()
        };
        assert_eq!(settings.interval(), Duration::MAX);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            Settings::from_json(r#"{ "colour": "red" }"#),
            Err(TuringMachineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in [
            r#"{ "speed": 0.0 }"#,
            r#"{ "speed": -2.0 }"#,
            r#"{ "speed": 1e-300 }"#,
            r#"{ "steps_per_tick": 0 }"#,
            r#"{ "execs_per_step": 0 }"#,
            r#"{ "initial_tape": "01a" }"#,
            r#"{ "fill": "maybe" }"#,
        ] {
            assert!(
                matches!(Settings::from_json(json), Err(TuringMachineError::ConfigError(_))),
                "{json} should be rejected"
            );
        }
    }
}
