use std::fmt;

use super::scheduler::{ScheduledTask, Scheduler};
use super::sequencer::{Sequencer, TickOutcome};
use super::{StepPresenter, SynthEngine, SynthHandle, ACTIVE_GAIN, DEFAULT_NOTE, STEP_INTERVAL};
use crate::params::{ModParam, ParameterSource};
use crate::steps::StepSource;

/// Identifies one playing session. Ticks carry it so that a tick scheduled
/// for an earlier session is recognised and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything that exists only while playing
pub struct Session<H, T> {
    id: SessionId,
    handle: H,
    sequencer: Sequencer,
    task: T,
}

impl<H, T> Session<H, T> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn cursor(&self) -> usize {
        self.sequencer.cursor()
    }
}

pub enum PlaybackState<H, T> {
    Stopped,
    Playing(Session<H, T>),
}

/// The start/stop state machine.
///
/// The synth handle, the step cursor and the tick task live together in the
/// `Playing` session: they are created on start and torn down on stop.
pub struct Transport<E: SynthEngine, S: Scheduler> {
    engine: E,
    scheduler: S,
    state: PlaybackState<E::Handle, S::Task>,
    next_session: u64,
}

impl<E: SynthEngine, S: Scheduler> Transport<E, S> {
    pub fn new(engine: E, scheduler: S) -> Self {
        Self {
            engine,
            scheduler,
            state: PlaybackState::Stopped,
            next_session: 1,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing(_))
    }

    pub fn state(&self) -> &PlaybackState<E::Handle, S::Task> {
        &self.state
    }

    /// Id of the current session, if playing
    pub fn session_id(&self) -> Option<SessionId> {
        match &self.state {
            PlaybackState::Playing(session) => Some(session.id),
            PlaybackState::Stopped => None,
        }
    }

    /// The step the next tick will play, if playing
    pub fn cursor(&self) -> Option<usize> {
        match &self.state {
            PlaybackState::Playing(session) => Some(session.cursor()),
            PlaybackState::Stopped => None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Start if stopped, stop if playing
    pub fn toggle<P>(&mut self, params: &P)
    where
        P: ParameterSource + ?Sized,
    {
        match std::mem::replace(&mut self.state, PlaybackState::Stopped) {
            PlaybackState::Stopped => {
                let session = self.start_session(params);
                self.state = PlaybackState::Playing(session);
            }
            PlaybackState::Playing(session) => Self::end_session(session),
        }
    }

    /// Forward a modulation change to the live handle. Dropped while stopped.
    pub fn set_parameter(&mut self, param: ModParam, value: f32) {
        match &mut self.state {
            PlaybackState::Playing(session) => {
                session.handle.set_modulation(param, value);
                session.handle.commit();
            }
            PlaybackState::Stopped => {
                log::trace!("{} = {} dropped, transport stopped", param.name(), value);
            }
        }
    }

    /// Run one tick for `session`.
    ///
    /// Returns `None` without touching the handle or the presenter when
    /// `session` is not the live one.
    pub fn tick<St, P>(
        &mut self,
        session: SessionId,
        steps: &St,
        presenter: &mut P,
    ) -> Option<TickOutcome>
    where
        St: StepSource + ?Sized,
        P: StepPresenter + ?Sized,
    {
        let PlaybackState::Playing(live) = &mut self.state else {
            log::trace!("tick for {} ignored, transport stopped", session);
            return None;
        };
        if live.id != session {
            log::trace!("stale tick for {} ignored, live session is {}", session, live.id);
            return None;
        }

        let outcome = live
            .sequencer
            .tick(steps, Some(&mut live.handle), presenter);
        log::debug!(
            "step {:2} {:?} (pitch {})",
            outcome.index + 1,
            outcome.action,
            outcome.step.pitch
        );
        Some(outcome)
    }

    fn start_session<P>(&mut self, params: &P) -> Session<E::Handle, S::Task>
    where
        P: ParameterSource + ?Sized,
    {
        let id = SessionId(self.next_session);
        self.next_session += 1;

        let mut handle = self.engine.create();
        handle.set_pitch(DEFAULT_NOTE);
        for param in ModParam::ALL {
            handle.set_modulation(param, params.current_value(param));
        }
        handle.set_gain(ACTIVE_GAIN);
        handle.commit();

        let task = self.scheduler.schedule(STEP_INTERVAL, id);
        log::info!("transport started, session {}", id);

        Session {
            id,
            handle,
            sequencer: Sequencer::new(),
            task,
        }
    }

    fn end_session(session: Session<E::Handle, S::Task>) {
        let Session { id, handle, task, .. } = session;
        // No tick may run against the handle once it is released
        task.cancel();
        handle.release();
        log::info!("transport stopped, session {}", id);
    }
}

impl<E: SynthEngine, S: Scheduler> Drop for Transport<E, S> {
    fn drop(&mut self) {
        if let PlaybackState::Playing(session) =
            std::mem::replace(&mut self.state, PlaybackState::Stopped)
        {
            Self::end_session(session);
        }
    }
}
