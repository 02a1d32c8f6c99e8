//! Startup configuration: initial steps and control values.

use anyhow::{bail, Context};

use crate::params::ModulationParams;
use crate::steps::{StepStore, STEP_COUNT};

/// Default sample rate used when no device dictates one (offline rendering)
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Initial state handed to the runtime
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub steps: StepStore,
    pub params: ModulationParams,
}

impl Config {
    /// Build a config from optional pattern and note strings.
    ///
    /// See [`parse_pattern`] and [`parse_notes`] for the formats.
    pub fn from_strings(
        pattern: Option<&str>,
        notes: Option<&str>,
        params: ModulationParams,
    ) -> anyhow::Result<Self> {
        let pattern = match pattern {
            Some(pattern) => parse_pattern(pattern)?,
            None => Vec::new(),
        };
        let notes = match notes {
            Some(notes) => parse_notes(notes)?,
            None => Vec::new(),
        };

        Ok(Self {
            steps: StepStore::from_pattern(&pattern, &notes),
            params,
        })
    }
}

/// Parse a step pattern such as `x...x...x...x...`.
///
/// `x`/`X`/`1` enable a step; `.`, `-`, `0` disable it. Whitespace and `|` are
/// ignored so patterns can be grouped (`x... x... | x... x...`). At most
/// [`STEP_COUNT`] steps; missing steps are disabled.
pub fn parse_pattern(pattern: &str) -> anyhow::Result<Vec<bool>> {
    let mut steps = Vec::with_capacity(STEP_COUNT);
    for (position, c) in pattern.chars().enumerate() {
        match c {
            'x' | 'X' | '1' => steps.push(true),
            '.' | '-' | '0' => steps.push(false),
            c if c.is_whitespace() || c == '|' => continue,
            other => bail!("invalid pattern character {:?} at position {}", other, position + 1),
        }
    }
    if steps.len() > STEP_COUNT {
        bail!("pattern has {} steps, at most {} allowed", steps.len(), STEP_COUNT);
    }
    Ok(steps)
}

/// Parse a comma- or space-separated list of MIDI notes (fractions allowed).
///
/// Fewer than [`STEP_COUNT`] notes repeat across the steps.
pub fn parse_notes(notes: &str) -> anyhow::Result<Vec<f32>> {
    let parsed = notes
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| -> anyhow::Result<f32> {
            let note: f32 = token
                .parse()
                .with_context(|| format!("invalid note {:?}", token))?;
            if !note.is_finite() {
                bail!("invalid note {:?}", token);
            }
            Ok(note)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if parsed.len() > STEP_COUNT {
        bail!("{} notes given, at most {} allowed", parsed.len(), STEP_COUNT);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{Step, StepSource};

    #[test]
    fn test_parse_pattern() {
        let steps = parse_pattern("x... x-.1 | 0").unwrap();
        assert_eq!(
            steps,
            vec![true, false, false, false, true, false, false, true, false]
        );
    }

    #[test]
    fn test_pattern_rejects_bad_input() {
        assert!(parse_pattern("x..y").is_err());
        assert!(parse_pattern(&"x".repeat(17)).is_err());
        assert!(parse_pattern(&"x".repeat(16)).is_ok());
    }

    #[test]
    fn test_parse_notes() {
        assert_eq!(parse_notes("60, 62.5 64").unwrap(), vec![60.0, 62.5, 64.0]);
        assert!(parse_notes("60,sixty").is_err());
        assert!(parse_notes("inf").is_err());
        assert!(parse_notes("").unwrap().is_empty());
    }

    #[test]
    fn test_config_from_strings() {
        let config =
            Config::from_strings(Some("x.x."), Some("48,55"), ModulationParams::default()).unwrap();
        assert_eq!(config.steps.step(0), Step::on(48.0));
        assert_eq!(config.steps.step(1), Step::off(55.0));
        assert_eq!(config.steps.step(2), Step::on(48.0));
        assert_eq!(config.steps.active_count(), 2);
    }

    #[test]
    fn test_default_config_is_silent() {
        let config = Config::default();
        assert_eq!(config.steps.active_count(), 0);
        assert_eq!(config.params, ModulationParams::default());
    }
}
