use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dsp::SINE;
use crate::error::EngineError;

/// Initial synthesis parameters applied when an engine is created.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SynthDefaults {
    /// Bitmask of sine (1), square (2), sawtooth (4) and triangle (8).
    pub waveforms: u8,
    pub harmonics: usize,
    pub harmonic_velocity: f32,
    pub duty_offset: f32,
    pub duty_rate: f32,
    pub vibrato_depth: f32,
    pub vibrato_rate: f32,
    pub attack: f32,
    pub release: f32,
}

impl Default for SynthDefaults {
    fn default() -> Self {
        Self {
            waveforms: SINE,
            harmonics: 1,
            harmonic_velocity: 0.2,
            duty_offset: 0.5,
            duty_rate: 0.0,
            vibrato_depth: 0.0,
            vibrato_rate: 0.0,
            attack: 0.2,
            release: 1.25,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EngineSettings {
    #[serde(default = "default_sample_rate", alias = "sampleRate")]
    pub sample_rate: u32,
    /// Frames per render call requested from the host.
    #[serde(default = "default_block_size", alias = "blockSize")]
    pub block_size: u32,
    #[serde(default = "default_control_interval_ms", alias = "controlIntervalMs")]
    pub control_interval_ms: u64,
    /// Capacity of the control → render command queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub synth: SynthDefaults,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_block_size() -> u32 {
    1024
}

fn default_control_interval_ms() -> u64 {
    16
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            control_interval_ms: default_control_interval_ms(),
            queue_capacity: default_queue_capacity(),
            synth: SynthDefaults::default(),
        }
    }
}

impl EngineSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let txt = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&txt)?)
    }

    /// Write the default settings as TOML to `path`.
    pub fn generate_default<P: AsRef<Path>>(path: P) -> Result<(), EngineError> {
        let txt = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, txt)?;
        Ok(())
    }
}

pub static CONFIG: Lazy<EngineSettings> = Lazy::new(|| {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    match EngineSettings::load(&path) {
        Ok(settings) => settings,
        Err(EngineError::Io(_)) => EngineSettings::default(),
        Err(e) => {
            log::warn!("ignoring {}: {e}", path.display());
            EngineSettings::default()
        }
    }
});
