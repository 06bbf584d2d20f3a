//! Control context: parameter setters, the modulation tick and the loop
//! that drives it.
//!
//! The render side never takes the controller's lock. Every change reaches it
//! as a [`Command`] through a single-producer/single-consumer ring buffer.

use parking_lot::Mutex;
use ringbuf::traits::Producer;
use ringbuf::HeapProd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::channel::NUM_CHANNELS;
use crate::command::{Command, Snapshot};
use crate::config::SynthDefaults;
use crate::dsp::ALL_WAVEFORMS;
use crate::error::EngineError;
use crate::models::Beat;
use crate::modulation::{non_negative, Modulator};
use crate::synth::clamp_harmonics;

pub struct Controller {
    producer: HeapProd<Command>,
    mirror: Snapshot,
    modulator: Modulator,
    epoch: Instant,
    out_of_sync: bool,
}

impl Controller {
    pub(crate) fn new(producer: HeapProd<Command>, defaults: &SynthDefaults) -> Self {
        let modulator = Modulator::new(defaults);
        let mirror = Snapshot {
            frequencies: [0.0; NUM_CHANNELS],
            enabled: [true; NUM_CHANNELS],
            waveforms: defaults.waveforms & ALL_WAVEFORMS,
            harmonics: clamp_harmonics(defaults.harmonics),
            modulation: modulator.frame(),
        };
        Self {
            producer,
            mirror,
            modulator,
            epoch: Instant::now(),
            out_of_sync: false,
        }
    }

    /// Seconds since the controller was created.
    pub fn now(&self) -> f32 {
        self.epoch.elapsed().as_secs_f32()
    }

    /// The parameters the render side will hold once the queue drains.
    pub fn snapshot(&self) -> Snapshot {
        self.mirror
    }

    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    fn send(&mut self, cmd: Command) {
        // the mirror already holds the effect of `cmd`
        if self.out_of_sync {
            if self.producer.try_push(Command::Snapshot(self.mirror)).is_ok() {
                log::debug!("command queue drained, state resynced");
                self.out_of_sync = false;
            }
            return;
        }
        if self.producer.try_push(cmd).is_err() {
            log::warn!("command queue full, resyncing on a later update");
            self.out_of_sync = true;
        }
    }

    fn channel_index(&self, index: usize) -> Option<usize> {
        if index < NUM_CHANNELS {
            Some(index)
        } else {
            log::warn!("ignoring channel {index}: only {NUM_CHANNELS} channels");
            None
        }
    }

    pub fn set_channel_frequency(&mut self, index: usize, hz: f32) {
        let Some(index) = self.channel_index(index) else {
            return;
        };
        let frequency = non_negative(hz);
        self.mirror.frequencies[index] = frequency;
        self.send(Command::ChannelFrequency { index, frequency });
    }

    pub fn set_channel_enabled(&mut self, index: usize, enabled: bool) {
        let Some(index) = self.channel_index(index) else {
            return;
        };
        self.mirror.enabled[index] = enabled;
        self.send(Command::ChannelEnabled { index, enabled });
    }

    /// Frequency and enable flag applied together.
    pub fn set_channel(&mut self, index: usize, hz: f32, enabled: bool) {
        let Some(index) = self.channel_index(index) else {
            return;
        };
        let frequency = non_negative(hz);
        self.mirror.frequencies[index] = frequency;
        self.mirror.enabled[index] = enabled;
        self.send(Command::Channel {
            index,
            frequency,
            enabled,
        });
    }

    pub fn toggle_channel(&mut self, index: usize) {
        let Some(index) = self.channel_index(index) else {
            return;
        };
        let enabled = !self.mirror.enabled[index];
        self.set_channel_enabled(index, enabled);
    }

    pub fn set_waveform_mask(&mut self, mask: u8) {
        self.mirror.waveforms = mask & ALL_WAVEFORMS;
        self.send(Command::Waveforms(self.mirror.waveforms));
    }

    /// Flip the given waveform bits on or off.
    pub fn toggle_waveform(&mut self, bits: u8) {
        self.set_waveform_mask(self.mirror.waveforms ^ (bits & ALL_WAVEFORMS));
    }

    pub fn set_harmonic_count(&mut self, count: usize) {
        let clamped = clamp_harmonics(count);
        if clamped != count {
            log::debug!("harmonic count {count} clamped to {clamped}");
        }
        self.mirror.harmonics = clamped;
        self.send(Command::Harmonics(clamped));
    }

    pub fn set_harmonic_velocity(&mut self, velocity: f32) {
        self.modulator.set_harmonic_velocity(velocity);
    }

    pub fn set_duty_offset(&mut self, width: f32) {
        self.modulator.set_duty_offset(width);
    }

    pub fn set_duty_mod_rate(&mut self, hz: f32) {
        self.modulator.set_duty_rate(hz);
    }

    pub fn set_vibrato_depth(&mut self, hz: f32) {
        self.modulator.set_vibrato_depth(hz);
    }

    pub fn set_vibrato_rate(&mut self, hz: f32) {
        self.modulator.set_vibrato_rate(hz);
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.modulator.set_attack(seconds);
    }

    pub fn set_release(&mut self, seconds: f32) {
        self.modulator.set_release(seconds);
    }

    pub fn note_on(&mut self) {
        let now = self.now();
        self.note_on_at(now);
    }

    pub fn note_on_at(&mut self, now: f32) {
        self.modulator.reset_envelope(now);
    }

    pub fn tick(&mut self) {
        let now = self.now();
        self.tick_at(now);
    }

    /// Advance every modulation controller to `now` and publish the frame.
    pub fn tick_at(&mut self, now: f32) {
        let frame = self.modulator.tick(now);
        self.mirror.modulation = frame;
        self.send(Command::Modulation(frame));
    }

    /// Assign a beat's voices in one step and restart the envelope.
    ///
    /// Channels the beat does not mention keep their current settings.
    pub fn apply_beat(&mut self, beat: &Beat, now: f32) {
        for (i, hz) in beat.frequencies.iter().take(NUM_CHANNELS).enumerate() {
            self.mirror.frequencies[i] = non_negative(*hz);
        }
        if let Some(enabled) = &beat.enabled {
            for (i, on) in enabled.iter().take(NUM_CHANNELS).enumerate() {
                self.mirror.enabled[i] = *on;
            }
        }
        self.send(Command::Snapshot(self.mirror));
        self.note_on_at(now);
    }
}

/// Cloneable, thread-safe access to a [`Controller`].
#[derive(Clone)]
pub struct EngineHandle {
    controller: Arc<Mutex<Controller>>,
}

impl EngineHandle {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
        }
    }

    /// Run several updates under one lock.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> R {
        f(&mut *self.controller.lock())
    }

    pub fn now(&self) -> f32 {
        self.controller.lock().now()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.controller.lock().snapshot()
    }

    pub fn set_channel_frequency(&self, index: usize, hz: f32) {
        self.controller.lock().set_channel_frequency(index, hz);
    }

    pub fn set_channel_enabled(&self, index: usize, enabled: bool) {
        self.controller.lock().set_channel_enabled(index, enabled);
    }

    pub fn set_channel(&self, index: usize, hz: f32, enabled: bool) {
        self.controller.lock().set_channel(index, hz, enabled);
    }

    pub fn toggle_channel(&self, index: usize) {
        self.controller.lock().toggle_channel(index);
    }

    pub fn set_waveform_mask(&self, mask: u8) {
        self.controller.lock().set_waveform_mask(mask);
    }

    pub fn toggle_waveform(&self, bits: u8) {
        self.controller.lock().toggle_waveform(bits);
    }

    pub fn set_harmonic_count(&self, count: usize) {
        self.controller.lock().set_harmonic_count(count);
    }

    pub fn set_harmonic_velocity(&self, velocity: f32) {
        self.controller.lock().set_harmonic_velocity(velocity);
    }

    pub fn set_duty_offset(&self, width: f32) {
        self.controller.lock().set_duty_offset(width);
    }

    pub fn set_duty_mod_rate(&self, hz: f32) {
        self.controller.lock().set_duty_mod_rate(hz);
    }

    pub fn set_vibrato_depth(&self, hz: f32) {
        self.controller.lock().set_vibrato_depth(hz);
    }

    pub fn set_vibrato_rate(&self, hz: f32) {
        self.controller.lock().set_vibrato_rate(hz);
    }

    pub fn set_attack(&self, seconds: f32) {
        self.controller.lock().set_attack(seconds);
    }

    pub fn set_release(&self, seconds: f32) {
        self.controller.lock().set_release(seconds);
    }

    pub fn note_on(&self) {
        self.controller.lock().note_on();
    }

    pub fn tick(&self) {
        self.controller.lock().tick();
    }

    pub fn apply_beat(&self, beat: &Beat, now: f32) {
        self.controller.lock().apply_beat(beat, now);
    }
}

/// Background thread calling a driver hook and [`EngineHandle::tick`] at a
/// fixed cadence until stopped.
pub struct ControlLoop {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ControlLoop {
    /// `driver` runs before every tick with the handle and the current time
    /// in seconds; use it to feed pitch assignments.
    pub fn spawn<F>(
        handle: EngineHandle,
        interval: Duration,
        mut driver: F,
    ) -> Result<Self, EngineError>
    where
        F: FnMut(&EngineHandle, f32) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("wavey-control".into())
            .spawn(move || {
                log::debug!("control loop started, interval {interval:?}");
                while flag.load(Ordering::Acquire) {
                    driver(&handle, handle.now());
                    handle.tick();
                    std::thread::sleep(interval);
                }
                log::debug!("control loop stopped");
            })
            .map_err(EngineError::ControlThread)?;
        Ok(Self {
            running,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Signal the loop and wait for its current iteration to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("control loop panicked");
            }
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{SAWTOOTH, SINE, SQUARE};
    use ringbuf::traits::{Consumer, Split};
    use ringbuf::{HeapCons, HeapRb};

    fn controller(capacity: usize) -> (Controller, HeapCons<Command>) {
        let (prod, cons) = HeapRb::<Command>::new(capacity).split();
        (Controller::new(prod, &SynthDefaults::default()), cons)
    }

    fn drain(cons: &mut HeapCons<Command>) -> Vec<Command> {
        let mut out = Vec::new();
        while let Some(cmd) = cons.try_pop() {
            out.push(cmd);
        }
        out
    }

    #[test]
    fn test_setters_clamp_and_publish() {
        let (mut c, mut cons) = controller(16);
        c.set_harmonic_count(0);
        c.set_harmonic_count(42);
        c.set_channel_frequency(1, -3.0);
        c.set_channel_frequency(2, f32::NAN);
        let silent = |index| Command::ChannelFrequency { index, frequency: 0.0 };
        assert_eq!(
            drain(&mut cons),
            vec![
                Command::Harmonics(1),
                Command::Harmonics(8),
                silent(1),
                silent(2),
            ]
        );
        assert_eq!(c.snapshot().harmonics, 8);
    }

    #[test]
    fn test_out_of_range_channel_is_ignored() {
        let (mut c, mut cons) = controller(16);
        c.set_channel_frequency(NUM_CHANNELS, 440.0);
        c.toggle_channel(99);
        assert!(drain(&mut cons).is_empty());
    }

    #[test]
    fn test_toggles_flip_mirror() {
        let (mut c, mut cons) = controller(16);
        c.toggle_channel(3);
        c.toggle_channel(3);
        c.toggle_channel(4);
        c.set_waveform_mask(SINE);
        c.toggle_waveform(SQUARE | SAWTOOTH);
        c.toggle_waveform(SINE);
        let cmds = drain(&mut cons);
        let toggled = |index, enabled| Command::ChannelEnabled { index, enabled };
        assert_eq!(
            cmds[..3].to_vec(),
            vec![toggled(3, false), toggled(3, true), toggled(4, false)]
        );
        assert_eq!(c.snapshot().waveforms, SQUARE | SAWTOOTH);
    }

    #[test]
    fn test_tick_publishes_modulation_frame() {
        let (mut c, mut cons) = controller(16);
        c.set_attack(1.0);
        c.set_duty_offset(7.0);
        c.note_on_at(2.0);
        c.tick_at(2.5);
        let cmds = drain(&mut cons);
        let Command::Modulation(frame) = cmds[0] else {
            panic!("expected modulation frame, got {:?}", cmds[0]);
        };
        assert!((frame.volume - 0.5).abs() < 1e-6);
        assert_eq!(frame.duty, 1.0);
    }

    #[test]
    fn test_full_queue_resyncs_with_snapshot() {
        let (mut c, mut cons) = controller(2);
        c.set_channel_frequency(0, 100.0);
        c.set_channel_frequency(0, 200.0);
        c.set_channel_frequency(0, 300.0);
        assert!(c.is_out_of_sync());
        // still full: nothing more gets in
        c.set_channel_frequency(0, 400.0);
        assert!(c.is_out_of_sync());

        assert_eq!(drain(&mut cons).len(), 2);
        c.set_harmonic_count(3);
        assert!(!c.is_out_of_sync());
        let cmds = drain(&mut cons);
        let Command::Snapshot(snap) = cmds[0] else {
            panic!("expected snapshot, got {:?}", cmds[0]);
        };
        assert_eq!(snap.frequencies[0], 400.0);
        assert_eq!(snap.harmonics, 3);
    }

    #[test]
    fn test_apply_beat_is_one_command() {
        let (mut c, mut cons) = controller(16);
        let beat = Beat {
            frequencies: vec![130.8, 329.6, 392.0],
            enabled: Some(vec![true, true, true, false, false]),
        };
        c.apply_beat(&beat, 0.0);
        let cmds = drain(&mut cons);
        assert_eq!(cmds.len(), 1);
        let Command::Snapshot(snap) = cmds[0] else {
            panic!("expected snapshot");
        };
        assert_eq!(snap.frequencies, [130.8, 329.6, 392.0, 0.0, 0.0]);
        assert_eq!(snap.enabled, [true, true, true, false, false]);
    }

    #[test]
    fn test_control_loop_stops_and_joins() {
        use std::sync::atomic::AtomicUsize;

        let (c, _cons) = controller(4096);
        let handle = EngineHandle::new(c);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut control = ControlLoop::spawn(handle, Duration::from_millis(1), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(30));
        control.stop();
        assert!(!control.is_running());
        let seen = calls.load(Ordering::SeqCst);
        assert!(seen > 0);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}
