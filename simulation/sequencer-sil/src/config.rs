use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use sequencer_rs::SequencerConfig;
use stand_core::Millis;

/// Everything the SIL runner reads from its TOML file. Missing tables and
/// keys fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SilConfig {
    pub sequencer: SequencerConfig,
    pub scenario: Scenario,
    pub plant: PlantConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    IgnitionLocal,
    IgnitionRemote,
    #[default]
    MainSequence,
}

impl TestKind {
    /// Menu entries below the first one.
    pub fn menu_steps(self) -> usize {
        match self {
            TestKind::IgnitionLocal => 0,
            TestKind::IgnitionRemote => 1,
            TestKind::MainSequence => 2,
        }
    }
}

/// What the simulated operator does, and when.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub test: TestKind,
    /// The operator starts navigating the menu at this time.
    pub select_at_ms: Millis,
    pub fire_at_ms: Millis,
    /// How long the go button or command line is held.
    pub fire_hold_ms: Millis,
    pub power_loss_at_ms: Option<Millis>,
    pub duration_ms: Millis,
    pub status_interval_ms: Millis,
}

/// First-order pressure model of the igniter and the main chamber. Pressures
/// are in raw ADC counts above the sensor zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub sensor_zero: u16,
    pub ig_firing: f64,
    pub main_firing: f64,
    pub rise_time_ms: f64,
    pub decay_time_ms: f64,
    /// Time with propellant and spark before the igniter lights.
    pub light_delay_ms: Millis,
    /// Standard deviation of the sensor noise in counts. Zero turns it off.
    pub noise_std_dev: f64,
    pub main_lights: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            test: TestKind::default(),
            select_at_ms: 500,
            fire_at_ms: 1500,
            fire_hold_ms: 100,
            power_loss_at_ms: None,
            duration_ms: 15_000,
            status_interval_ms: 1000,
        }
    }
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            sensor_zero: 103,
            ig_firing: 150.0,
            main_firing: 140.0,
            rise_time_ms: 15.0,
            decay_time_ms: 25.0,
            light_delay_ms: 30,
            noise_std_dev: 1.5,
            main_lights: true,
        }
    }
}

impl SilConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found, running with defaults", path.display());
            return Ok(Self::default());
        }

        let config_data = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: SilConfig = toml::from_str(&config_data)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());

        Ok(config)
    }
}
