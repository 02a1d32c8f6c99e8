/* fmstep - a 16-step FM sequencer in the terminal.
Plays through the default sound device; with the `bounce` feature it can also
render a pattern to a WAV file.
*/

use clap::{Args, Parser, Subcommand};

use fmstep::engine::{EngineOutput, Transport, VoiceEngine};
use fmstep::runtime::terminal::{spawn_input, TerminalGuard, TerminalScreen};
use fmstep::runtime::{event_channel, tick_scheduler, App};
use fmstep::utils::logging::{init_logger, level_for_verbosity};
use fmstep::{Config, ModParam, ModulationParams};

#[derive(Parser, Debug)]
#[command(name = "fmstep", version, about = "A 16-step FM sequencer")]
struct Cli {
    #[command(flatten)]
    pattern: PatternArgs,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play live in the terminal (default)
    Play,
    /// Render the pattern to a WAV file (needs the `bounce` feature)
    Bounce {
        /// Number of steps to render
        #[arg(long, default_value_t = 16)]
        ticks: usize,
        /// Output file
        #[arg(short, long, default_value = "fmstep.wav")]
        out: std::path::PathBuf,
    },
}

#[derive(Args, Debug)]
struct PatternArgs {
    /// Initial steps, e.g. "x...x...x...x..." (x=on, .=off)
    #[arg(short, long, global = true)]
    pattern: Option<String>,

    /// Initial step notes as MIDI numbers, repeated across steps, e.g. "48,55,60"
    #[arg(short, long, global = true)]
    notes: Option<String>,

    /// Modulator frequency ratio
    #[arg(long, global = true)]
    fm_frequency: Option<f32>,

    /// Modulation depth ratio
    #[arg(long, global = true)]
    fm_amount: Option<f32>,

    /// Lowpass cutoff in Hz
    #[arg(long, global = true)]
    cutoff: Option<f32>,

    /// Lowpass resonance peak in dB
    #[arg(long, global = true)]
    resonance: Option<f32>,
}

impl PatternArgs {
    fn to_config(&self) -> anyhow::Result<Config> {
        let mut params = ModulationParams::default();
        let overrides = [
            (ModParam::FmFrequency, self.fm_frequency),
            (ModParam::FmAmount, self.fm_amount),
            (ModParam::FilterCutoff, self.cutoff),
            (ModParam::FilterResonance, self.resonance),
        ];
        for (param, value) in overrides {
            if let Some(value) = value {
                params.set(param, value);
            }
        }

        Config::from_strings(self.pattern.as_deref(), self.notes.as_deref(), params)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(level_for_verbosity(cli.verbose))?;
    let config = cli.pattern.to_config()?;

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(config),
        Command::Bounce { ticks, out } => bounce(config, ticks, &out),
    }
}

#[cfg(feature = "bounce")]
fn bounce(config: Config, ticks: usize, out: &std::path::Path) -> anyhow::Result<()> {
    let sample_rate = fmstep::config::DEFAULT_SAMPLE_RATE;
    let samples = fmstep::bounce::render(&config, ticks, sample_rate);
    fmstep::bounce::write_wav(out, &samples, sample_rate as u32)?;
    println!("Wrote {}", out.display());
    Ok(())
}

#[cfg(not(feature = "bounce"))]
fn bounce(_config: Config, _ticks: usize, _out: &std::path::Path) -> anyhow::Result<()> {
    anyhow::bail!("this build has no WAV export; rebuild with --features bounce")
}

fn play(config: Config) -> anyhow::Result<()> {
    let (events, receiver) = event_channel();
    let (engine, commands) = VoiceEngine::new();

    let mut output = EngineOutput::new();
    output.initialize()?;
    output.create_stream(commands)?;
    output.start()?;

    let transport = Transport::new(engine, tick_scheduler(&events));

    let guard = TerminalGuard::enter()?;
    let input = spawn_input(events)?;
    let mut app = App::new(transport, config, TerminalScreen::new(), receiver);
    let result = app.run();

    // Stops playback and joins the timer thread before audio goes away
    drop(app);
    output.stop()?;
    drop(guard);

    // The input thread only ends on its own after sending Quit
    if result.is_ok() {
        match input.join() {
            Ok(Err(err)) => log::warn!("input thread failed: {}", err),
            Err(_) => log::warn!("input thread panicked"),
            Ok(Ok(())) => {}
        }
    }

    result
}
