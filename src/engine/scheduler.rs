//! Periodic tick scheduling with explicit cancellation.
//!
//! A scheduled task belongs to exactly one session. Cancelling consumes the
//! task; once `cancel` returns, the task never fires again.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use super::transport::SessionId;

/// A running periodic task
pub trait ScheduledTask {
    /// Stop the task. No tick for its session is delivered after this returns.
    fn cancel(self);
}

/// Starts periodic tick tasks for playing sessions
pub trait Scheduler {
    type Task: ScheduledTask;

    fn schedule(&mut self, period: Duration, session: SessionId) -> Self::Task;
}

/// Fires ticks from a dedicated timer thread.
///
/// `deliver` is called with the session id on every period; returning `false`
/// (e.g. because the receiving queue is gone) ends the timer thread.
pub struct ThreadScheduler<F> {
    deliver: Arc<F>,
}

impl<F> ThreadScheduler<F>
where
    F: Fn(SessionId) -> bool + Send + Sync + 'static,
{
    pub fn new(deliver: F) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }
}

/// Timer thread handle owned by one session
pub struct ThreadTask {
    session: SessionId,
    // Dropping the sender disconnects the timer's cancel channel
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ScheduledTask for ThreadTask {
    fn cancel(mut self) {
        drop(self.cancel.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("tick timer for session {} panicked", self.session);
            }
        }
        log::debug!("tick timer for session {} cancelled", self.session);
    }
}

impl<F> Scheduler for ThreadScheduler<F>
where
    F: Fn(SessionId) -> bool + Send + Sync + 'static,
{
    type Task = ThreadTask;

    fn schedule(&mut self, period: Duration, session: SessionId) -> ThreadTask {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(0);
        let deliver = Arc::clone(&self.deliver);

        let spawned = thread::Builder::new()
            .name(format!("tick-{}", session))
            .spawn(move || run_timer(period, session, cancel_rx, deliver));

        let thread = match spawned {
            Ok(thread) => Some(thread),
            Err(err) => {
                log::error!("failed to start tick timer for session {}: {}", session, err);
                None
            }
        };

        ThreadTask {
            session,
            cancel: Some(cancel_tx),
            thread,
        }
    }
}

fn run_timer<F>(period: Duration, session: SessionId, cancel: Receiver<()>, deliver: Arc<F>)
where
    F: Fn(SessionId) -> bool,
{
    let ticker = crossbeam_channel::tick(period);
    loop {
        crossbeam_channel::select! {
            recv(cancel) -> _ => break,
            recv(ticker) -> _ => {
                if !deliver(session) {
                    break;
                }
            }
        }
    }
}

/// A scheduler that never fires on its own.
///
/// The caller drives ticks explicitly (offline rendering, tests). It keeps
/// track of which sessions still have a live task.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    live: Rc<RefCell<BTreeSet<SessionId>>>,
    period: Rc<RefCell<Option<Duration>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a task for this session is scheduled and not cancelled
    pub fn is_live(&self, session: SessionId) -> bool {
        self.live.borrow().contains(&session)
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Period requested by the most recent schedule call
    pub fn last_period(&self) -> Option<Duration> {
        *self.period.borrow()
    }
}

#[derive(Debug)]
pub struct ManualTask {
    session: SessionId,
    live: Rc<RefCell<BTreeSet<SessionId>>>,
}

impl ScheduledTask for ManualTask {
    fn cancel(self) {
        self.live.borrow_mut().remove(&self.session);
    }
}

impl Scheduler for ManualScheduler {
    type Task = ManualTask;

    fn schedule(&mut self, period: Duration, session: SessionId) -> ManualTask {
        self.live.borrow_mut().insert(session);
        *self.period.borrow_mut() = Some(period);
        ManualTask {
            session,
            live: Rc::clone(&self.live),
        }
    }
}
