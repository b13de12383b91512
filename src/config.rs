use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::doppler::SimulationParameters;

pub const DEFAULT_CONFIG_FILE: &str = "doppler.toml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioMode {
    #[default]
    Off,
    /// Nearest pre-recorded tone from the assets directory.
    Preset,
    /// Freshly synthesized sine tone.
    Synth,
}

impl AudioMode {
    pub const ALL: [AudioMode; 3] = [AudioMode::Off, AudioMode::Preset, AudioMode::Synth];
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub audio: AudioConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    #[serde(flatten)]
    pub initial: SimulationParameters,
    pub frame_step: f64,
    pub frame_delay_ms: u64,
    /// 0 disables the cap.
    pub max_frames: u64,
}

impl SimulationConfig {
    pub fn frame_cap(&self) -> Option<u64> {
        (self.max_frames > 0).then_some(self.max_frames)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial: SimulationParameters::default(),
            frame_step: 0.05,
            frame_delay_ms: 50,
            max_frames: 2000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub mode: AudioMode,
    pub volume_aware: bool,
    pub assets_dir: PathBuf,
    pub sample_rate: u32,
    pub duration: f64,
    pub temp_path: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mode: AudioMode::Off,
            volume_aware: false,
            assets_dir: PathBuf::from("assets"),
            sample_rate: 44100,
            duration: 1.0,
            temp_path: std::env::temp_dir().join("doppler_tone.wav"),
        }
    }
}

impl Config {
    /// Reads `path` if given, otherwise `doppler.toml` in the working
    /// directory when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                log::info!("No config file, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Read config {}", path.display()))?;
        let config =
            toml::from_str(&text).with_context(|| format!("Parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation
            .initial
            .validate()
            .context("Invalid [simulation] parameters")?;
        if !(self.simulation.frame_step > 0.0) {
            anyhow::bail!("frame_step must be positive");
        }
        if self.audio.sample_rate == 0 || !(self.audio.duration > 0.0) {
            anyhow::bail!("audio sample_rate and duration must be positive");
        }
        Ok(())
    }
}
