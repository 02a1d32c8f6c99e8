//! Offline rendering of a pattern to a WAV file.
//!
//! Runs the same transport and voice engine as live playback, with ticks
//! driven at exact sample positions instead of by a timer thread.

use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::config::Config;
use crate::engine::{ManualScheduler, Transport, VoiceBank, VoiceEngine, STEP_INTERVAL};

/// Longest fade-out rendered after the transport stops, in seconds
const MAX_TAIL_SECONDS: f32 = 1.0;

/// Number of samples between two ticks at `sample_rate`
pub fn samples_per_step(sample_rate: f32) -> usize {
    (STEP_INTERVAL.as_secs_f32() * sample_rate).round() as usize
}

/// Render `ticks` steps of `config` as mono samples.
///
/// Starts playback, renders one interval before the first tick (as the live
/// timer does), one interval after each tick, then stops and renders the
/// voice fade-out.
pub fn render(config: &Config, ticks: usize, sample_rate: f32) -> Vec<f32> {
    let (engine, commands) = VoiceEngine::new();
    let mut bank = VoiceBank::new(sample_rate, commands);
    let mut transport = Transport::new(engine, ManualScheduler::new());
    let interval = samples_per_step(sample_rate);

    let mut output = Vec::with_capacity(interval * (ticks + 1));
    let mut render_block = |bank: &mut VoiceBank, len: usize| {
        let start = output.len();
        output.resize(start + len, 0.0);
        bank.render(&mut output[start..]);
    };

    transport.toggle(&config.params);
    let session = transport.session_id();
    render_block(&mut bank, interval);

    if let Some(session) = session {
        for _ in 0..ticks {
            transport.tick(session, &config.steps, &mut ());
            render_block(&mut bank, interval);
        }
    }

    transport.toggle(&config.params);
    bank.drain_commands();
    let max_tail = (MAX_TAIL_SECONDS * sample_rate) as usize;
    let mut tail = 0;
    while bank.voice_count() > 0 && tail < max_tail {
        output.push(bank.tick());
        tail += 1;
    }

    log::info!(
        "rendered {} ticks, {} samples ({} tail)",
        ticks,
        output.len(),
        tail
    );
    output
}

/// Write mono 32-bit float samples to a WAV file
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    log::info!("wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ModulationParams;

    const SAMPLE_RATE: f32 = 44100.0;

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_render_length_and_tail() {
        let config = Config::default();
        let samples = render(&config, 4, SAMPLE_RATE);
        let interval = samples_per_step(SAMPLE_RATE);

        assert!(samples.len() >= interval * 5);
        assert!(samples.len() <= interval * 5 + SAMPLE_RATE as usize);
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_pre_roll_sounds_then_disabled_steps_are_silent() {
        let config = Config::default();
        let samples = render(&config, 4, SAMPLE_RATE);
        let interval = samples_per_step(SAMPLE_RATE);

        // Seeded at active gain before the first tick
        assert!(rms(&samples[interval / 2..interval]) > 0.01);
        // Every step disabled: the last interval before stopping is silent
        assert!(rms(&samples[interval * 4..interval * 5]) < 1e-4);
    }

    #[test]
    fn test_enabled_steps_sound() {
        let config =
            Config::from_strings(Some("x.x."), Some("60"), ModulationParams::default()).unwrap();
        let samples = render(&config, 4, SAMPLE_RATE);
        let interval = samples_per_step(SAMPLE_RATE);

        let first_step = &samples[interval + interval / 2..interval * 2];
        let second_step = &samples[interval * 2 + interval / 2..interval * 3];
        assert!(rms(first_step) > 0.01);
        assert!(rms(second_step) < 1e-3);
    }

    #[test]
    fn test_write_wav() {
        let path = std::env::temp_dir().join(format!("fmstep-bounce-{}.wav", std::process::id()));
        let samples = vec![0.0, 0.25, -0.25, 0.5];
        write_wav(&path, &samples, 44100).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44100);
        let read: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);

        std::fs::remove_file(&path).unwrap();
    }
}
