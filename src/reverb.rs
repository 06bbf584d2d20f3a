/// Delay of the reflection, in seconds.
pub const REVERB_SECONDS: f32 = 0.2;
/// Level of the reflected signal added back into the output.
pub const REVERB_FEEDBACK: f32 = 0.5;

/// Fixed-length circular delay line feeding past output back into the mix.
#[derive(Debug, Clone)]
pub struct ReverbBuffer {
    buffer: Vec<f32>,
    cursor: usize,
}

impl ReverbBuffer {
    pub fn new(sample_rate: u32) -> Self {
        let len = ((sample_rate as f32 * REVERB_SECONDS) as usize).max(1);
        Self::with_len(len)
    }

    pub fn with_len(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Read the reflection at the cursor, store `dry` in its place and
    /// advance one slot.
    #[inline]
    pub fn tap(&mut self, dry: f32) -> f32 {
        let slot = &mut self.buffer[self.cursor];
        let reflected = *slot * REVERB_FEEDBACK;
        *slot = dry;
        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            self.cursor = 0;
        }
        reflected
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.cursor = 0;
    }
}
