//! Error types for the engine.

use thiserror::Error;

/// Errors surfaced to callers of the engine.
///
/// Out-of-range parameters are never errors; setters clamp them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host has no default output device.
    #[error("no output device available")]
    NoOutputDevice,

    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to query output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to list output configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The device only offers a sample format the renderer cannot write.
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    /// The control thread could not be spawned.
    #[error("failed to start control loop: {0}")]
    ControlThread(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("could not serialise settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    #[error("invalid progression: {0}")]
    Progression(#[from] serde_json::Error),
}
