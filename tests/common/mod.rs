// Shared recording doubles for the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fmstep::{StepPresenter, SynthEngine, SynthHandle};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create,
    Pitch(f32),
    ModFrequency(f32),
    ModAmount(f32),
    Cutoff(f32),
    Resonance(f32),
    Gain(f32),
    Commit,
    Release,
    Reset,
    Highlight(usize),
}

/// One ordered log shared by the engine, its handles and the presenter
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|call| matches(call)).count()
    }

    /// Gain from the most recent gain write
    pub fn last_gain(&self) -> Option<f32> {
        self.0.borrow().iter().rev().find_map(|call| match call {
            Call::Gain(gain) => Some(*gain),
            _ => None,
        })
    }

    /// Pitch from the most recent pitch write
    pub fn last_pitch(&self) -> Option<f32> {
        self.0.borrow().iter().rev().find_map(|call| match call {
            Call::Pitch(pitch) => Some(*pitch),
            _ => None,
        })
    }

    /// Index from the most recent highlight
    pub fn highlighted(&self) -> Option<usize> {
        self.0.borrow().iter().rev().find_map(|call| match call {
            Call::Highlight(index) => Some(*index),
            _ => None,
        })
    }
}

pub struct RecordingEngine(pub CallLog);

impl SynthEngine for RecordingEngine {
    type Handle = RecordingHandle;

    fn create(&mut self) -> RecordingHandle {
        self.0.push(Call::Create);
        RecordingHandle(self.0.clone())
    }
}

pub struct RecordingHandle(CallLog);

impl SynthHandle for RecordingHandle {
    fn set_pitch(&mut self, value: f32) {
        self.0.push(Call::Pitch(value));
    }

    fn set_modulation_frequency(&mut self, value: f32) {
        self.0.push(Call::ModFrequency(value));
    }

    fn set_modulation_amount(&mut self, value: f32) {
        self.0.push(Call::ModAmount(value));
    }

    fn set_filter_cutoff(&mut self, value: f32) {
        self.0.push(Call::Cutoff(value));
    }

    fn set_filter_resonance(&mut self, value: f32) {
        self.0.push(Call::Resonance(value));
    }

    fn set_gain(&mut self, value: f32) {
        self.0.push(Call::Gain(value));
    }

    fn commit(&mut self) {
        self.0.push(Call::Commit);
    }

    fn release(self) {
        self.0.push(Call::Release);
    }
}

pub struct RecordingPresenter(pub CallLog);

impl StepPresenter for RecordingPresenter {
    fn on_all_steps_reset(&mut self) {
        self.0.push(Call::Reset);
    }

    fn on_step_highlighted(&mut self, index: usize) {
        self.0.push(Call::Highlight(index));
    }
}
