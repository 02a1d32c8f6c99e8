//! The event loop that owns the transport.
//!
//! Every user action and every timer tick arrives as an [`Event`] on one
//! queue and is handled to completion before the next, so ticks and edits
//! never interleave.

use crossbeam_channel::{Receiver, Sender};

use crate::config::Config;
use crate::engine::scheduler::{Scheduler, ThreadScheduler};
use crate::engine::sequencer::TickOutcome;
use crate::engine::transport::{SessionId, Transport};
use crate::engine::{StepPresenter, SynthEngine};
use crate::params::{ModParam, ModulationParams};
use crate::steps::{StepSource, StepStore, STEP_COUNT};

#[cfg(feature = "cli")]
pub mod terminal;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Start or stop playback
    Toggle,
    /// Set a modulation control to an absolute value
    SetParameter(ModParam, f32),
    /// Move a modulation control by a number of control steps
    NudgeParameter(ModParam, f32),
    SetStepEnabled(usize, bool),
    ToggleStep(usize),
    SetStepPitch(usize, f32),
    /// Move a step's pitch by semitones
    NudgeStepPitch(usize, f32),
    /// Move the edit selection (presentation only)
    Select(usize),
    /// Timer tick for a session
    Tick(SessionId),
    Quit,
}

pub type EventSender = Sender<Event>;
pub type EventReceiver = Receiver<Event>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::unbounded()
}

/// A scheduler whose ticks are delivered as [`Event::Tick`] on `events`
pub fn tick_scheduler(
    events: &EventSender,
) -> ThreadScheduler<impl Fn(SessionId) -> bool + Send + Sync + 'static> {
    let events = events.clone();
    ThreadScheduler::new(move |session| events.send(Event::Tick(session)).is_ok())
}

/// Read-only snapshot handed to the screen after each event
pub struct AppView<'a> {
    pub steps: &'a StepStore,
    pub params: &'a ModulationParams,
    pub playing: bool,
    pub selected: usize,
    pub last_tick: Option<&'a TickOutcome>,
}

/// Presentation collaborator: receives highlights and redraws
pub trait Screen: StepPresenter {
    fn redraw(&mut self, view: &AppView<'_>) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct NullScreen;

impl StepPresenter for NullScreen {
    fn on_all_steps_reset(&mut self) {}

    fn on_step_highlighted(&mut self, _index: usize) {}
}

impl Screen for NullScreen {
    fn redraw(&mut self, _view: &AppView<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the transport, the step store and the persistent control values
pub struct App<E: SynthEngine, S: Scheduler, D: Screen> {
    transport: Transport<E, S>,
    steps: StepStore,
    params: ModulationParams,
    screen: D,
    events: EventReceiver,
    selected: usize,
    last_tick: Option<TickOutcome>,
}

impl<E: SynthEngine, S: Scheduler, D: Screen> App<E, S, D> {
    pub fn new(transport: Transport<E, S>, config: Config, screen: D, events: EventReceiver) -> Self {
        Self {
            transport,
            steps: config.steps,
            params: config.params,
            screen,
            events,
            selected: 0,
            last_tick: None,
        }
    }

    pub fn transport(&self) -> &Transport<E, S> {
        &self.transport
    }

    pub fn steps(&self) -> &StepStore {
        &self.steps
    }

    pub fn params(&self) -> &ModulationParams {
        &self.params
    }

    pub fn screen(&self) -> &D {
        &self.screen
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Process events until [`Event::Quit`] or until every sender is gone.
    /// Playback is stopped before returning.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.redraw()?;
        while let Ok(event) = self.events.recv() {
            if self.handle(event)? == Flow::Quit {
                break;
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Handle a single event to completion
    pub fn handle(&mut self, event: Event) -> anyhow::Result<Flow> {
        match event {
            Event::Toggle => {
                self.transport.toggle(&self.params);
                if !self.transport.is_playing() {
                    self.last_tick = None;
                }
            }
            Event::SetParameter(param, value) => {
                self.params.set(param, value);
                self.transport.set_parameter(param, value);
            }
            Event::NudgeParameter(param, steps) => {
                let value = self.params.nudge(param, steps);
                self.transport.set_parameter(param, value);
            }
            Event::SetStepEnabled(index, enabled) => self.steps.set_enabled(index, enabled),
            Event::ToggleStep(index) => self.steps.toggle_enabled(index),
            Event::SetStepPitch(index, pitch) => self.steps.set_pitch(index, pitch),
            Event::NudgeStepPitch(index, semitones) => {
                let pitch = self.steps.pitch(index) + semitones;
                self.steps.set_pitch(index, pitch.clamp(0.0, 127.0));
            }
            Event::Select(index) => {
                if index < STEP_COUNT {
                    self.selected = index;
                }
            }
            Event::Tick(session) => {
                match self.transport.tick(session, &self.steps, &mut self.screen) {
                    Some(outcome) => self.last_tick = Some(outcome),
                    // Stale tick: nothing changed, nothing to draw
                    None => return Ok(Flow::Continue),
                }
            }
            Event::Quit => return Ok(Flow::Quit),
        }

        self.redraw()?;
        Ok(Flow::Continue)
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let view = AppView {
            steps: &self.steps,
            params: &self.params,
            playing: self.transport.is_playing(),
            selected: self.selected,
            last_tick: self.last_tick.as_ref(),
        };
        self.screen.redraw(&view)
    }

    fn shutdown(&mut self) {
        if self.transport.is_playing() {
            self.transport.toggle(&self.params);
        }
    }
}
