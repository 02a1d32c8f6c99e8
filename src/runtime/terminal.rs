//! Raw-mode terminal front-end: key input and a redrawn status screen.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Print, Stylize},
    terminal::{self, Clear, ClearType},
};

use super::{AppView, Event, EventSender, Screen};
use crate::engine::StepPresenter;
use crate::params::ModParam;
use crate::steps::STEP_COUNT;

const HELP: &str = "SPACE=start/stop ←→=select ENTER=on/off ↑↓=pitch +/-=octave Q=quit";
const PARAM_KEYS: [(char, ModParam); 4] = [
    ('f', ModParam::FmFrequency),
    ('a', ModParam::FmAmount),
    ('c', ModParam::FilterCutoff),
    ('r', ModParam::FilterResonance),
];

/// Puts the terminal in raw mode and restores it on drop
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), Clear(ClearType::All), cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show);
        let _ = terminal::disable_raw_mode();
        println!();
    }
}

/// Draws the 16-step row with exactly one highlighted step while playing
#[derive(Debug, Default)]
pub struct TerminalScreen {
    highlighted: Option<usize>,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }
}

impl StepPresenter for TerminalScreen {
    fn on_all_steps_reset(&mut self) {
        self.highlighted = None;
    }

    fn on_step_highlighted(&mut self, index: usize) {
        self.highlighted = Some(index);
    }
}

fn make_bar(normalized: f32, width: usize) -> String {
    let filled = ((normalized.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

impl Screen for TerminalScreen {
    fn redraw(&mut self, view: &AppView<'_>) -> anyhow::Result<()> {
        if !view.playing {
            self.highlighted = None;
        }

        let mut out = io::stdout();
        queue!(out, cursor::MoveTo(0, 0), Clear(ClearType::All))?;
        queue!(out, Print("=== fmstep ===\r\n"), Print(HELP), Print("\r\n"))?;
        let status = if view.playing { "PLAYING" } else { "STOPPED" };
        queue!(out, Print(format!("Status: {}\r\n\r\n", status)))?;

        for (index, step) in view.steps.steps().iter().enumerate() {
            let cell = if step.enabled { "[x]" } else { "[ ]" };
            if self.highlighted == Some(index) {
                queue!(out, Print(cell.reverse()))?;
            } else {
                queue!(out, Print(cell))?;
            }
        }
        queue!(out, Print("\r\n"))?;
        for index in 0..STEP_COUNT {
            let marker = if index == view.selected { " ^ " } else { "   " };
            queue!(out, Print(marker))?;
        }
        let selected = view.steps.steps()[view.selected];
        queue!(
            out,
            Print(format!(
                "\r\nstep {:2}  note {:6.1}  {}\r\n\r\n",
                view.selected + 1,
                selected.pitch,
                if selected.enabled { "on" } else { "off" }
            ))
        )?;

        for (key, param) in PARAM_KEYS {
            let (min, max) = param.control_range();
            let value = view.params.get(param);
            queue!(
                out,
                Print(format!(
                    "{}/{} {:<17} [{}] {:>8.2}\r\n",
                    key,
                    key.to_ascii_uppercase(),
                    param.name(),
                    make_bar((value - min) / (max - min), 10),
                    value
                ))
            )?;
        }

        out.flush()?;
        Ok(())
    }
}

/// Read keys on a background thread and translate them into events.
///
/// The thread ends after sending [`Event::Quit`] or when the event queue is
/// gone. A terminal read error also sends [`Event::Quit`].
pub fn spawn_input(events: EventSender) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
    let handle = thread::Builder::new().name("input".into()).spawn(move || {
        let result = read_keys(&events);
        if result.is_err() {
            let _ = events.send(Event::Quit);
        }
        result
    })?;
    Ok(handle)
}

fn read_keys(events: &EventSender) -> anyhow::Result<()> {
    let mut selected = 0usize;
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let Some(mapped) = map_key(key, &mut selected) else {
            continue;
        };
        if events.send(mapped).is_err() || mapped == Event::Quit {
            return Ok(());
        }
    }
}

/// Translate one key press. `selected` is the step under edit.
pub fn map_key(key: KeyEvent, selected: &mut usize) -> Option<Event> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Event::Quit);
    }

    let event = match key.code {
        KeyCode::Char(' ') => Event::Toggle,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Event::Quit,
        KeyCode::Left => {
            *selected = (*selected + STEP_COUNT - 1) % STEP_COUNT;
            Event::Select(*selected)
        }
        KeyCode::Right => {
            *selected = (*selected + 1) % STEP_COUNT;
            Event::Select(*selected)
        }
        KeyCode::Enter | KeyCode::Char('x') => Event::ToggleStep(*selected),
        KeyCode::Up => Event::NudgeStepPitch(*selected, 1.0),
        KeyCode::Down => Event::NudgeStepPitch(*selected, -1.0),
        KeyCode::Char('+') | KeyCode::Char('=') => Event::NudgeStepPitch(*selected, 12.0),
        KeyCode::Char('-') => Event::NudgeStepPitch(*selected, -12.0),
        KeyCode::Char(c) => {
            let (_, param) = PARAM_KEYS
                .iter()
                .find(|(key, _)| *key == c.to_ascii_lowercase())?;
            let direction = if c.is_ascii_uppercase() { 1.0 } else { -1.0 };
            Event::NudgeParameter(*param, direction)
        }
        _ => return None,
    };
    Some(event)
}
