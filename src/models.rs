use serde::Deserialize;
use std::path::Path;

use crate::config::SynthDefaults;
use crate::error::EngineError;

fn default_bpm() -> f32 {
    45.0
}

/// One beat: the voice frequencies to assign, root first.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Beat {
    #[serde(alias = "freqs", alias = "chord")]
    pub frequencies: Vec<f32>,
    /// Per-channel enable flags; channels not listed keep their state.
    #[serde(default)]
    pub enabled: Option<Vec<bool>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Progression {
    #[serde(default = "default_bpm", alias = "tempo")]
    pub bpm: f32,
    #[serde(alias = "progression", alias = "chords")]
    pub beats: Vec<Beat>,
    /// Overrides for the engine's initial synth parameters.
    #[serde(default)]
    pub synth: Option<SynthDefaults>,
}

impl Progression {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn from_json(data: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_aliases() {
        let p = Progression::from_json(
            r#"{
                "tempo": 90,
                "chords": [
                    { "freqs": [65.4, 329.6, 392.0] },
                    { "frequencies": [73.4, 349.2, 440.0, 523.3], "enabled": [true, true, true, true] }
                ],
                "synth": { "harmonics": 3, "waveforms": 5 }
            }"#,
        )
        .unwrap();
        assert_eq!(p.bpm, 90.0);
        assert_eq!(p.beats.len(), 2);
        assert_eq!(p.beats[0].enabled, None);
        assert_eq!(p.beats[1].frequencies.len(), 4);
        let synth = p.synth.unwrap();
        assert_eq!(synth.harmonics, 3);
        assert_eq!(synth.attack, 0.2);
    }

    #[test]
    fn test_missing_beats_is_an_error() {
        assert!(Progression::from_json(r#"{ "bpm": 60 }"#).is_err());
    }
}
