use ringbuf::traits::{Consumer, Split};
use ringbuf::{HeapCons, HeapRb};

use crate::command::Command;
use crate::config::EngineSettings;
use crate::control::Controller;
use crate::synth::Synth;

/// Frames rendered per inner pass when the host asks for an interleaved
/// buffer; larger host buffers are filled in several passes.
pub const MAX_BLOCK_FRAMES: usize = 4096;

/// Render context: the consumer end of the command queue plus the synth.
///
/// Nothing here locks or allocates after construction.
pub struct Renderer {
    synth: Synth,
    commands: HeapCons<Command>,
    scratch: Vec<f32>,
}

impl Renderer {
    fn new(synth: Synth, commands: HeapCons<Command>, block_size: usize) -> Self {
        Self {
            synth,
            commands,
            scratch: vec![0.0; block_size.clamp(1, MAX_BLOCK_FRAMES)],
        }
    }

    pub fn synth(&self) -> &Synth {
        &self.synth
    }

    /// Apply every queued command. Returns how many were applied.
    pub fn drain_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Some(cmd) = self.commands.try_pop() {
            self.synth.handle_command(cmd);
            applied += 1;
        }
        applied
    }

    /// Render a mono block after applying pending commands.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.drain_commands();
        self.synth.render_block(out);
    }

    /// Fill an interleaved host buffer, writing the mono signal to every
    /// output channel.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        self.drain_commands();
        let channels = channels.max(1);
        let whole = data.len() - data.len() % channels;
        let (frames, partial) = data.split_at_mut(whole);
        partial.fill(0.0);

        let frames_per_pass = self.scratch.len();
        for chunk in frames.chunks_mut(frames_per_pass * channels) {
            let mono = &mut self.scratch[..chunk.len() / channels];
            self.synth.render_block(mono);
            for (frame, sample) in chunk.chunks_exact_mut(channels).zip(mono.iter()) {
                frame.fill(*sample);
            }
        }
    }
}

/// Build a connected controller/renderer pair without touching any audio
/// device.
pub fn pair(settings: &EngineSettings) -> (Controller, Renderer) {
    let (producer, consumer) = HeapRb::<Command>::new(settings.queue_capacity.max(1)).split();
    let synth = Synth::new(settings.sample_rate, &settings.synth);
    let renderer = Renderer::new(synth, consumer, settings.block_size as usize);
    (Controller::new(producer, &settings.synth), renderer)
}
