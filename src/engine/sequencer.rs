use super::{StepPresenter, SynthHandle, ACTIVE_GAIN, SILENT_GAIN};
use crate::steps::{Step, StepSource, STEP_COUNT};

/// What a tick did to the synth
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickAction {
    /// Step enabled: gain up and pitch set
    Triggered,
    /// Step disabled: gain down, pitch untouched
    Silenced,
    /// No handle was present, nothing was written
    Skipped,
}

/// Result of one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    /// The step that was played (and highlighted)
    pub index: usize,
    /// The step as read at tick time
    pub step: Step,
    pub action: TickAction,
}

/// The 16-step cursor and the per-tick procedure.
///
/// The cursor only moves inside [`Sequencer::tick`]; a fresh sequencer always
/// plays step 0 first.
#[derive(Clone, Debug, Default)]
pub struct Sequencer {
    cursor: usize,
}

impl Sequencer {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// The step the next tick will play
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Play the step under the cursor and advance.
    ///
    /// Highlights are always emitted (reset pass, then the current step) and
    /// the cursor always advances. Synth writes happen only if a handle is
    /// given, and are committed as one batch.
    pub fn tick<S, H, P>(
        &mut self,
        steps: &S,
        handle: Option<&mut H>,
        presenter: &mut P,
    ) -> TickOutcome
    where
        S: StepSource + ?Sized,
        H: SynthHandle,
        P: StepPresenter + ?Sized,
    {
        let index = self.cursor;
        let step = steps.step(index);

        presenter.on_all_steps_reset();
        presenter.on_step_highlighted(index);

        let action = match handle {
            Some(handle) => {
                let action = if step.enabled {
                    handle.set_gain(ACTIVE_GAIN);
                    handle.set_pitch(step.pitch);
                    TickAction::Triggered
                } else {
                    handle.set_gain(SILENT_GAIN);
                    TickAction::Silenced
                };
                handle.commit();
                action
            }
            None => TickAction::Skipped,
        };

        self.cursor = (self.cursor + 1) % STEP_COUNT;

        TickOutcome {
            index,
            step,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepStore;

    #[derive(Debug, PartialEq)]
    enum Call {
        Reset,
        Highlight(usize),
        Gain(f32),
        Pitch(f32),
        Commit,
    }

    #[derive(Default)]
    struct Log(Vec<Call>);

    impl StepPresenter for Log {
        fn on_all_steps_reset(&mut self) {
            self.0.push(Call::Reset);
        }

        fn on_step_highlighted(&mut self, index: usize) {
            self.0.push(Call::Highlight(index));
        }
    }

    #[derive(Default)]
    struct FakeHandle(Vec<Call>);

    impl SynthHandle for FakeHandle {
        fn set_pitch(&mut self, value: f32) {
            self.0.push(Call::Pitch(value));
        }
        fn set_modulation_frequency(&mut self, _value: f32) {}
        fn set_modulation_amount(&mut self, _value: f32) {}
        fn set_filter_cutoff(&mut self, _value: f32) {}
        fn set_filter_resonance(&mut self, _value: f32) {}
        fn set_gain(&mut self, value: f32) {
            self.0.push(Call::Gain(value));
        }
        fn commit(&mut self) {
            self.0.push(Call::Commit);
        }
        fn release(self) {}
    }

    #[test]
    fn test_enabled_step_sets_gain_then_pitch() {
        let mut store = StepStore::new();
        store.set(0, Step::on(60.0));

        let mut sequencer = Sequencer::new();
        let mut handle = FakeHandle::default();
        let mut log = Log::default();

        let outcome = sequencer.tick(&store, Some(&mut handle), &mut log);

        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.action, TickAction::Triggered);
        assert_eq!(
            handle.0,
            vec![Call::Gain(ACTIVE_GAIN), Call::Pitch(60.0), Call::Commit]
        );
        assert_eq!(log.0, vec![Call::Reset, Call::Highlight(0)]);
        assert_eq!(sequencer.cursor(), 1);
    }

    #[test]
    fn test_disabled_step_only_silences() {
        let store = StepStore::new();
        let mut sequencer = Sequencer::new();
        let mut handle = FakeHandle::default();

        let outcome = sequencer.tick(&store, Some(&mut handle), &mut ());

        assert_eq!(outcome.action, TickAction::Silenced);
        assert_eq!(handle.0, vec![Call::Gain(SILENT_GAIN), Call::Commit]);
    }

    #[test]
    fn test_missing_handle_still_highlights_and_advances() {
        let mut store = StepStore::new();
        store.set(0, Step::on(60.0));

        let mut sequencer = Sequencer::new();
        let mut log = Log::default();

        let outcome = sequencer.tick(&store, None::<&mut FakeHandle>, &mut log);

        assert_eq!(outcome.action, TickAction::Skipped);
        assert_eq!(log.0, vec![Call::Reset, Call::Highlight(0)]);
        assert_eq!(sequencer.cursor(), 1);
    }

    #[test]
    fn test_cursor_wraps_after_sixteen_ticks() {
        let store = StepStore::new();
        let mut sequencer = Sequencer::new();

        let played: Vec<usize> = (0..STEP_COUNT + 2)
            .map(|_| sequencer.tick(&store, None::<&mut FakeHandle>, &mut ()).index)
            .collect();

        assert_eq!(played[..STEP_COUNT].to_vec(), (0..STEP_COUNT).collect::<Vec<_>>());
        assert_eq!(played[STEP_COUNT], 0);
        assert_eq!(played[STEP_COUNT + 1], 1);
        assert_eq!(sequencer.cursor(), 2);
    }

    #[test]
    fn test_step_is_read_at_tick_time() {
        let mut store = StepStore::new();
        let mut sequencer = Sequencer::new();
        let mut handle = FakeHandle::default();

        sequencer.tick(&store, Some(&mut handle), &mut ());
        // Edit step 1 between ticks
        store.set(1, Step::on(72.0));
        let outcome = sequencer.tick(&store, Some(&mut handle), &mut ());

        assert_eq!(outcome.step, Step::on(72.0));
        assert_eq!(outcome.action, TickAction::Triggered);
    }
}
