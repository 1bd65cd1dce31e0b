//! Run settings loaded from an optional TOML file.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use crow_defence_core::SessionConfig;
use serde::Deserialize;

/// Everything a run needs: the session tuning plus autopilot behaviour.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) session: SessionConfig,
    pub(crate) autopilot: AutopilotSettings,
}

/// How the autopilot plays.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AutopilotSettings {
    /// Seed for problem and lane generation. Random when absent.
    pub(crate) seed: Option<u64>,
    /// Waves to clear before stopping.
    pub(crate) waves: u32,
    /// Every Nth submit is deliberately wrong. Zero disables misses.
    pub(crate) miss_every: u32,
    /// Fixed simulation step in milliseconds.
    pub(crate) tick_ms: u64,
    /// Never answer, letting the crows through.
    pub(crate) no_answer: bool,
}

impl Default for AutopilotSettings {
    fn default() -> Self {
        Self {
            seed: None,
            waves: 3,
            miss_every: 0,
            tick_ms: 50,
            no_answer: false,
        }
    }
}

impl Settings {
    /// Reads settings from `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid settings file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).context("failed to parse settings toml contents")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects tunings the session cannot run with.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.autopilot.tick_ms == 0 {
            bail!("tick_ms must be positive");
        }
        if self.session.spawn_interval_ms == 0 {
            bail!("spawn_interval_ms must be positive");
        }
        if self.session.fall_check_interval_ms == 0 {
            bail!("fall_check_interval_ms must be positive");
        }
        if !positive(self.session.crow_speed) {
            bail!("crow_speed must be positive, got {}", self.session.crow_speed);
        }
        if !positive(self.session.fall_speed) {
            bail!("fall_speed must be positive, got {}", self.session.fall_speed);
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value > 0.0
}
