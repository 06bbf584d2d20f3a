use std::f64::consts::TAU;

use crate::channel::{Channel, NUM_CHANNELS};
use crate::command::{Command, Snapshot};
use crate::config::SynthDefaults;
use crate::dsp::trig::LookupTables;
use crate::dsp::{harmonic_amplitudes, wave_harmonics, ALL_WAVEFORMS, MAX_HARMONICS};
use crate::modulation::{non_negative, ModulationFrame};
use crate::reverb::ReverbBuffer;

pub(crate) fn clamp_harmonics(count: usize) -> usize {
    count.clamp(1, MAX_HARMONICS)
}

/// Global parameters read by every render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    pub waveforms: u8,
    /// Always in `1..=MAX_HARMONICS`.
    pub harmonics: usize,
    pub modulation: ModulationFrame,
}

/// Render-side state: owned exclusively by whoever calls [`Synth::render_block`].
pub struct Synth {
    tables: LookupTables,
    channels: [Channel; NUM_CHANNELS],
    params: SynthParams,
    reverb: ReverbBuffer,
    sample_rate: f32,
}

impl Synth {
    pub fn new(sample_rate: u32, defaults: &SynthDefaults) -> Self {
        let sample_rate = sample_rate.max(1);
        Self {
            tables: LookupTables::new(),
            channels: [Channel::default(); NUM_CHANNELS],
            params: SynthParams {
                waveforms: defaults.waveforms & ALL_WAVEFORMS,
                harmonics: clamp_harmonics(defaults.harmonics),
                modulation: ModulationFrame {
                    duty: defaults.duty_offset.clamp(0.0, 1.0),
                    ..ModulationFrame::default()
                },
            },
            reverb: ReverbBuffer::new(sample_rate),
            sample_rate: sample_rate as f32,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    pub fn reverb_len(&self) -> usize {
        self.reverb.len()
    }

    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::ChannelFrequency { index, frequency } => {
                if let Some(ch) = self.channels.get_mut(index) {
                    ch.frequency = non_negative(frequency);
                }
            }
            Command::ChannelEnabled { index, enabled } => {
                if let Some(ch) = self.channels.get_mut(index) {
                    ch.enabled = enabled;
                }
            }
            Command::Channel {
                index,
                frequency,
                enabled,
            } => {
                if let Some(ch) = self.channels.get_mut(index) {
                    ch.frequency = non_negative(frequency);
                    ch.enabled = enabled;
                }
            }
            Command::Waveforms(mask) => self.params.waveforms = mask & ALL_WAVEFORMS,
            Command::Harmonics(count) => self.params.harmonics = clamp_harmonics(count),
            Command::Modulation(frame) => self.set_modulation(frame),
            Command::Snapshot(snapshot) => self.apply_snapshot(&snapshot),
        }
    }

    fn set_modulation(&mut self, frame: ModulationFrame) {
        self.params.modulation = ModulationFrame {
            volume: frame.volume.clamp(0.0, 1.0),
            duty: frame.duty.clamp(0.0, 1.0),
            ..frame
        };
    }

    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        for (i, ch) in self.channels.iter_mut().enumerate() {
            ch.frequency = non_negative(snapshot.frequencies[i]);
            ch.enabled = snapshot.enabled[i];
        }
        self.params.waveforms = snapshot.waveforms & ALL_WAVEFORMS;
        self.params.harmonics = clamp_harmonics(snapshot.harmonics);
        self.set_modulation(snapshot.modulation);
    }

    /// Render one mono block, continuing every channel's phase from the
    /// previous call.
    pub fn render_block(&mut self, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }
        let params = self.params;
        let shift = params.modulation.shift;

        let mut increments = [0.0f64; NUM_CHANNELS];
        let mut active = [false; NUM_CHANNELS];
        for (i, ch) in self.channels.iter().enumerate() {
            if ch.enabled && ch.frequency > 0.0 {
                increments[i] = ch.phase_increment(shift, self.sample_rate);
                active[i] = true;
            }
        }

        let mut amp_buf = [0.0f32; MAX_HARMONICS];
        let amplitudes = harmonic_amplitudes(
            &self.tables,
            params.modulation.harmonic_offset,
            params.harmonics,
            &mut amp_buf,
        );

        for (i, sample) in out.iter_mut().enumerate() {
            let mut mix = 0.0f32;
            for (j, ch) in self.channels.iter().enumerate() {
                if !active[j] {
                    continue;
                }
                let x = (ch.cycles_at(increments[j], i).rem_euclid(1.0) * TAU) as f32;
                mix += wave_harmonics(
                    &self.tables,
                    x,
                    params.waveforms,
                    params.modulation.duty,
                    amplitudes,
                );
            }
            let reflected = self.reverb.tap(mix);
            *sample = mix * params.modulation.volume + reflected;
        }

        let len = out.len();
        for (j, ch) in self.channels.iter_mut().enumerate() {
            if active[j] {
                ch.advance(increments[j], len);
            }
        }
    }
}
