use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig, SupportedBufferSize};
use std::time::Duration;

use crate::config::EngineSettings;
use crate::control::{ControlLoop, EngineHandle};
use crate::engine::pair;
use crate::error::EngineError;

/// A running synthesizer: an open output stream plus its control loop.
///
/// Dropping the engine shuts it down.
pub struct Engine {
    stream: Option<cpal::Stream>,
    control: ControlLoop,
    handle: EngineHandle,
    sample_rate: u32,
    channels: u16,
}

/// Prefer the requested rate and block size; fall back to the device default.
fn choose_config(
    device: &cpal::Device,
    settings: &EngineSettings,
) -> Result<StreamConfig, EngineError> {
    let wanted = SampleRate(settings.sample_rate);
    for range in device.supported_output_configs()? {
        if range.sample_format() != SampleFormat::F32
            || range.min_sample_rate() > wanted
            || range.max_sample_rate() < wanted
        {
            continue;
        }
        let buffer_size = match range.buffer_size() {
            SupportedBufferSize::Range { min, max }
                if (*min..=*max).contains(&settings.block_size) =>
            {
                BufferSize::Fixed(settings.block_size)
            }
            _ => BufferSize::Default,
        };
        return Ok(StreamConfig {
            channels: range.channels(),
            sample_rate: wanted,
            buffer_size,
        });
    }

    let default = device.default_output_config()?;
    if default.sample_format() != SampleFormat::F32 {
        return Err(EngineError::UnsupportedSampleFormat(format!("{:?}", default.sample_format())));
    }
    log::warn!(
        "{} Hz not available, using device default {} Hz",
        settings.sample_rate,
        default.sample_rate().0
    );
    Ok(default.into())
}

impl Engine {
    /// Open the default output device and start rendering and ticking.
    pub fn init(settings: &EngineSettings) -> Result<Self, EngineError> {
        Self::init_with(settings, |_, _| {})
    }

    /// Like [`Engine::init`], calling `driver` on the control thread before
    /// every tick.
    pub fn init_with<F>(settings: &EngineSettings, driver: F) -> Result<Self, EngineError>
    where
        F: FnMut(&EngineHandle, f32) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(EngineError::NoOutputDevice)?;
        let config = choose_config(&device, settings)?;

        let effective = EngineSettings {
            sample_rate: config.sample_rate.0,
            ..settings.clone()
        };
        let channels = config.channels as usize;
        let (controller, mut renderer) = pair(&effective);
        let handle = EngineHandle::new(controller);

        log::info!(
            "opening {} at {} Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "output device".into()),
            config.sample_rate.0,
            channels,
            config.buffer_size
        );

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                renderer.render_interleaved(data, channels);
            },
            |err| log::error!("stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let interval = Duration::from_millis(settings.control_interval_ms.max(1));
        let control = ControlLoop::spawn(handle.clone(), interval, driver)?;

        Ok(Self {
            stream: Some(stream),
            control,
            handle,
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stop the control loop, then release the output stream.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.control.stop();
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("pausing stream on shutdown: {e}");
            }
            drop(stream);
            log::info!("audio stream closed");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.release();
    }
}
