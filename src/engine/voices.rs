//! FM voice engine behind the [`SynthHandle`] interface.
//!
//! Handles live on the control thread and never touch DSP state. They buffer
//! parameter writes and send them as one batch per commit over a channel; the
//! [`VoiceBank`] on the audio side applies a whole batch between two samples.
//! Batches are fixed-size and the bank reserves its voice slots up front, so
//! draining commands on the audio thread does not allocate or free.

use std::mem;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use super::{SynthEngine, SynthHandle};
use crate::gen::fm_osc::{FmOsc, ParamChange};

pub type VoiceId = u32;

/// Voices the bank holds without reallocating
pub const MAX_VOICES: usize = 16;
/// Commands that can wait for the audio thread before sends are dropped
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Parameter writes of one commit, at most one per parameter.
///
/// A later write to the same parameter replaces the earlier one. Each
/// parameter is independent, so applying the batch in slot order gives the
/// same voice state as applying the writes in call order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParamBatch {
    slots: [Option<ParamChange>; ParamChange::SLOTS],
}

impl ParamBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: ParamChange) {
        self.slots[change.slot()] = Some(change);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn changes(&self) -> impl Iterator<Item = ParamChange> + '_ {
        self.slots.iter().flatten().copied()
    }
}

/// Messages from handles to the voice bank
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoiceCommand {
    Spawn(VoiceId),
    Update(VoiceId, ParamBatch),
    Release(VoiceId),
}

/// Creates [`VoiceHandle`]s connected to one [`VoiceBank`]
pub struct VoiceEngine {
    commands: Sender<VoiceCommand>,
    next_id: VoiceId,
}

impl VoiceEngine {
    /// Create an engine and the receiving end its voice bank will drain
    pub fn new() -> (Self, Receiver<VoiceCommand>) {
        let (commands, receiver) = crossbeam_channel::bounded(COMMAND_QUEUE_CAPACITY);
        (
            Self {
                commands,
                next_id: 0,
            },
            receiver,
        )
    }
}

impl SynthEngine for VoiceEngine {
    type Handle = VoiceHandle;

    fn create(&mut self) -> VoiceHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let handle = VoiceHandle {
            id,
            pending: ParamBatch::new(),
            commands: self.commands.clone(),
            released: false,
        };
        handle.send(VoiceCommand::Spawn(id));
        handle
    }
}

/// Control-side handle to one voice.
///
/// Dropping a handle without calling `release` still releases its voice.
pub struct VoiceHandle {
    id: VoiceId,
    pending: ParamBatch,
    commands: Sender<VoiceCommand>,
    released: bool,
}

impl VoiceHandle {
    pub fn id(&self) -> VoiceId {
        self.id
    }

    fn send(&self, command: VoiceCommand) {
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("voice {}: command queue full, command dropped", self.id);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("voice {}: audio side disconnected, command dropped", self.id);
            }
        }
    }
}

impl Drop for VoiceHandle {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("voice {}: handle dropped without release", self.id);
            self.released = true;
            self.send(VoiceCommand::Release(self.id));
        }
    }
}

impl SynthHandle for VoiceHandle {
    fn set_pitch(&mut self, value: f32) {
        self.pending.push(ParamChange::Note(value));
    }

    fn set_modulation_frequency(&mut self, value: f32) {
        self.pending.push(ParamChange::FmFrequency(value));
    }

    fn set_modulation_amount(&mut self, value: f32) {
        self.pending.push(ParamChange::FmAmount(value));
    }

    fn set_filter_cutoff(&mut self, value: f32) {
        self.pending.push(ParamChange::FilterCutoff(value));
    }

    fn set_filter_resonance(&mut self, value: f32) {
        self.pending.push(ParamChange::FilterResonance(value));
    }

    fn set_gain(&mut self, value: f32) {
        self.pending.push(ParamChange::Gain(value));
    }

    fn commit(&mut self) {
        if !self.pending.is_empty() {
            let batch = mem::take(&mut self.pending);
            self.send(VoiceCommand::Update(self.id, batch));
        }
    }

    fn release(mut self) {
        if !self.pending.is_empty() {
            log::debug!(
                "voice {}: {} uncommitted changes discarded on release",
                self.id,
                self.pending.len()
            );
        }
        self.released = true;
        self.send(VoiceCommand::Release(self.id));
    }
}

/// Audio-side owner of all voices.
///
/// Released voices fade out and are removed once silent. Room for
/// [`MAX_VOICES`] voices is reserved up front; more still play but may
/// reallocate on the audio thread.
pub struct VoiceBank {
    sample_rate: f32,
    commands: Receiver<VoiceCommand>,
    voices: Vec<(VoiceId, FmOsc)>,
    disconnected: bool,
}

impl VoiceBank {
    pub fn new(sample_rate: f32, commands: Receiver<VoiceCommand>) -> Self {
        Self {
            sample_rate,
            commands,
            voices: Vec::with_capacity(MAX_VOICES),
            disconnected: false,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of voices still producing (or fading out)
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&FmOsc> {
        self.voices.iter().find(|(v, _)| *v == id).map(|(_, osc)| osc)
    }

    /// Apply every pending command
    pub fn drain_commands(&mut self) {
        if self.disconnected {
            return;
        }
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("voice command channel closed");
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    fn apply(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Spawn(id) => {
                if self.voices.len() == self.voices.capacity() {
                    log::warn!("more than {} voices, growing the voice bank", MAX_VOICES);
                }
                self.voices.push((id, FmOsc::new(self.sample_rate)));
            }
            VoiceCommand::Update(id, batch) => {
                if let Some((_, osc)) = self.voices.iter_mut().find(|(v, _)| *v == id) {
                    for change in batch.changes() {
                        osc.apply(change);
                    }
                } else {
                    log::warn!("update for unknown voice {}", id);
                }
            }
            VoiceCommand::Release(id) => {
                if let Some((_, osc)) = self.voices.iter_mut().find(|(v, _)| *v == id) {
                    osc.release();
                }
            }
        }
    }

    /// Generate one mono sample
    pub fn tick(&mut self) -> f32 {
        let mut output = 0.0;
        for (_, osc) in &mut self.voices {
            output += osc.tick();
        }
        self.voices.retain(|(_, osc)| !osc.is_finished());
        output
    }

    /// Apply pending commands, then fill `output` with mono samples
    pub fn render(&mut self, output: &mut [f32]) {
        self.drain_commands();
        for sample in output.iter_mut() {
            *sample = self.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ACTIVE_GAIN;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn test_commit_sends_one_batch() {
        let (mut engine, commands) = VoiceEngine::new();
        let mut handle = engine.create();
        assert_eq!(commands.try_recv(), Ok(VoiceCommand::Spawn(0)));

        handle.set_gain(ACTIVE_GAIN);
        handle.set_pitch(60.0);
        assert!(commands.try_recv().is_err(), "nothing is sent before commit");

        handle.commit();
        let mut expected = ParamBatch::new();
        expected.push(ParamChange::Gain(ACTIVE_GAIN));
        expected.push(ParamChange::Note(60.0));
        assert_eq!(commands.try_recv(), Ok(VoiceCommand::Update(0, expected)));

        // Empty commits send nothing
        handle.commit();
        assert!(commands.try_recv().is_err());

        handle.release();
        assert_eq!(commands.try_recv(), Ok(VoiceCommand::Release(0)));
    }

    #[test]
    fn test_each_handle_gets_its_own_voice() {
        let (mut engine, commands) = VoiceEngine::new();
        let first = engine.create();
        let second = engine.create();
        assert_ne!(first.id(), second.id());

        let mut bank = VoiceBank::new(SAMPLE_RATE, commands);
        bank.drain_commands();
        assert_eq!(bank.voice_count(), 2);
    }

    #[test]
    fn test_batch_is_applied_whole() {
        let (mut engine, commands) = VoiceEngine::new();
        let mut bank = VoiceBank::new(SAMPLE_RATE, commands);
        let mut handle = engine.create();

        handle.set_gain(0.5);
        handle.set_pitch(69.0);
        handle.commit();
        bank.drain_commands();

        let voice = bank.voice(handle.id()).unwrap();
        assert_eq!(voice.gain_target(), 0.5);
        assert!((voice.carrier_hz() - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_released_voice_fades_and_is_removed() {
        let (mut engine, commands) = VoiceEngine::new();
        let mut bank = VoiceBank::new(SAMPLE_RATE, commands);
        let mut handle = engine.create();
        handle.set_gain(ACTIVE_GAIN);
        handle.commit();

        let mut buffer = vec![0.0; 4410];
        bank.render(&mut buffer);
        assert!(buffer.iter().any(|s| s.abs() > 0.001));

        handle.release();
        let mut tail = vec![0.0; SAMPLE_RATE as usize];
        bank.render(&mut tail);

        assert_eq!(bank.voice_count(), 0);
        assert!(tail.iter().all(|s| s.is_finite()));
        assert!(tail[tail.len() - 100..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_batch_keeps_last_write_per_parameter() {
        let mut batch = ParamBatch::new();
        assert!(batch.is_empty());

        for note in 0..100 {
            batch.push(ParamChange::Note(note as f32));
        }
        batch.push(ParamChange::Gain(0.2));
        batch.push(ParamChange::Gain(0.4));

        assert_eq!(batch.len(), 2);
        let changes: Vec<ParamChange> = batch.changes().collect();
        assert_eq!(
            changes,
            vec![ParamChange::Note(99.0), ParamChange::Gain(0.4)]
        );
    }

    #[test]
    fn test_bank_reuses_reserved_voice_slots() {
        let (mut engine, commands) = VoiceEngine::new();
        let mut bank = VoiceBank::new(SAMPLE_RATE, commands);
        let reserved = bank.voices.capacity();
        assert!(reserved >= MAX_VOICES);

        let mut buffer = vec![0.0; 64];
        for _ in 0..3 {
            let handles: Vec<VoiceHandle> = (0..MAX_VOICES).map(|_| engine.create()).collect();
            bank.render(&mut buffer);
            assert_eq!(bank.voice_count(), MAX_VOICES);
            for handle in handles {
                handle.release();
            }
            let mut tail = vec![0.0; SAMPLE_RATE as usize];
            bank.render(&mut tail);
            assert_eq!(bank.voice_count(), 0);
        }
        assert_eq!(bank.voices.capacity(), reserved);
    }

    #[test]
    fn test_full_queue_drops_commands_without_blocking() {
        let (mut engine, commands) = VoiceEngine::new();
        let mut handle = engine.create();
        for _ in 0..COMMAND_QUEUE_CAPACITY * 2 {
            handle.set_gain(ACTIVE_GAIN);
            handle.commit();
        }
        assert_eq!(commands.len(), COMMAND_QUEUE_CAPACITY);
    }

    #[test]
    fn test_dropped_handle_releases_its_voice() {
        let (mut engine, commands) = VoiceEngine::new();
        let mut bank = VoiceBank::new(SAMPLE_RATE, commands);
        let mut handle = engine.create();
        handle.set_gain(ACTIVE_GAIN);
        handle.commit();
        bank.drain_commands();
        assert_eq!(bank.voice_count(), 1);

        drop(handle);
        let mut tail = vec![0.0; SAMPLE_RATE as usize];
        bank.render(&mut tail);
        assert_eq!(bank.voice_count(), 0);
    }

    #[test]
    fn test_release_is_sent_once() {
        let (mut engine, commands) = VoiceEngine::new();
        let handle = engine.create();
        assert_eq!(commands.try_recv(), Ok(VoiceCommand::Spawn(0)));

        handle.release();
        assert_eq!(commands.try_recv(), Ok(VoiceCommand::Release(0)));
        assert_eq!(commands.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_disconnected_handle_does_not_panic() {
        let (mut engine, commands) = VoiceEngine::new();
        drop(commands);
        let mut handle = engine.create();
        handle.set_gain(ACTIVE_GAIN);
        handle.commit();
        handle.release();
    }
}
