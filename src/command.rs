use crate::channel::NUM_CHANNELS;
use crate::modulation::ModulationFrame;

/// Everything the render path reads, as last set by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub frequencies: [f32; NUM_CHANNELS],
    pub enabled: [bool; NUM_CHANNELS],
    pub waveforms: u8,
    pub harmonics: usize,
    pub modulation: ModulationFrame,
}

/// Updates sent from the control context to the render context.
///
/// Each value is applied whole between two render blocks, so fields
/// carried by one command are always observed together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ChannelFrequency { index: usize, frequency: f32 },
    ChannelEnabled { index: usize, enabled: bool },
    Channel {
        index: usize,
        frequency: f32,
        enabled: bool,
    },
    Waveforms(u8),
    Harmonics(usize),
    Modulation(ModulationFrame),
    /// Full resync after the queue overflowed.
    Snapshot(Snapshot),
}
