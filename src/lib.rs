//! Real-time additive synthesizer.
//!
//! A [`Renderer`] produces mono blocks on the host's audio thread while a
//! [`Controller`] (usually behind an [`EngineHandle`] and driven by a
//! [`ControlLoop`]) updates pitches and modulation at control rate.

#[cfg(not(target_arch = "wasm32"))]
pub mod audio_io;
pub mod channel;
pub mod command;
pub mod config;
pub mod control;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod models;
pub mod modulation;
pub mod reverb;
pub mod sequencer;
pub mod synth;

#[cfg(not(target_arch = "wasm32"))]
pub use audio_io::Engine;
pub use config::{EngineSettings, SynthDefaults};
pub use control::{ControlLoop, Controller, EngineHandle};
pub use engine::{pair, Renderer};
pub use error::EngineError;
