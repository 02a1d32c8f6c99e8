use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, FromSample, Sample, SizedSample, Stream, StreamConfig,
};
use crossbeam_channel::Receiver;

use super::voices::{VoiceBank, VoiceCommand};
use crate::config::DEFAULT_SAMPLE_RATE;

/// Sound device output driving a [`VoiceBank`] from the cpal callback
pub struct EngineOutput {
    stream: Option<Stream>,
    device: Option<Device>,
    config: Option<StreamConfig>,
    sample_rate: f32,
    is_active: bool,
}

impl EngineOutput {
    pub fn new() -> Self {
        Self {
            stream: None,
            device: None,
            config: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            is_active: false,
        }
    }

    /// Open the default output device. The sample rate follows the device.
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("Default output device is not available"))?;

        log::info!("Output device: {}", device.name()?);

        let config = device.default_output_config()?;
        log::debug!("Default output config: {:?}", config);

        self.sample_rate = config.sample_rate().0 as f32;
        self.device = Some(device);
        self.config = Some(config.into());

        Ok(())
    }

    /// Build the output stream. A [`VoiceBank`] at the device rate drains
    /// `commands` at the start of every buffer.
    pub fn create_stream(&mut self, commands: Receiver<VoiceCommand>) -> anyhow::Result<()> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Device not initialized"))?;
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Config not initialized"))?;

        let bank = VoiceBank::new(self.sample_rate, commands);
        let stream = match device.default_output_config()?.sample_format() {
            cpal::SampleFormat::I8 => Self::make_stream::<i8>(device, config, bank)?,
            cpal::SampleFormat::I16 => Self::make_stream::<i16>(device, config, bank)?,
            cpal::SampleFormat::I32 => Self::make_stream::<i32>(device, config, bank)?,
            cpal::SampleFormat::I64 => Self::make_stream::<i64>(device, config, bank)?,
            cpal::SampleFormat::U8 => Self::make_stream::<u8>(device, config, bank)?,
            cpal::SampleFormat::U16 => Self::make_stream::<u16>(device, config, bank)?,
            cpal::SampleFormat::U32 => Self::make_stream::<u32>(device, config, bank)?,
            cpal::SampleFormat::U64 => Self::make_stream::<u64>(device, config, bank)?,
            cpal::SampleFormat::F32 => Self::make_stream::<f32>(device, config, bank)?,
            cpal::SampleFormat::F64 => Self::make_stream::<f64>(device, config, bank)?,
            sample_format => {
                return Err(anyhow::anyhow!("Unsupported sample format '{}'", sample_format))
            }
        };

        self.stream = Some(stream);
        Ok(())
    }

    fn make_stream<T>(device: &Device, config: &StreamConfig, mut bank: VoiceBank) -> anyhow::Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let num_channels = config.channels as usize;
        let err_fn = |err| log::error!("Error in output sound stream: {}", err);

        let stream = device.build_output_stream(
            config,
            move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                Self::process_frame(output, &mut bank, num_channels);
            },
            err_fn,
            None,
        )?;

        Ok(stream)
    }

    /// Fill one device buffer. Pending voice commands are applied first so a
    /// committed batch never straddles two samples.
    fn process_frame<T>(output: &mut [T], bank: &mut VoiceBank, num_channels: usize)
    where
        T: Sample + FromSample<f32>,
    {
        bank.drain_commands();

        for frame in output.chunks_mut(num_channels) {
            let value = T::from_sample(bank.tick());
            for sample in frame.iter_mut() {
                *sample = value;
            }
        }
    }

    pub fn start(&mut self) -> anyhow::Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Stream not created. Call create_stream first."))?;
        stream.play()?;
        self.is_active = true;
        log::info!("Audio stream started at sample rate: {}", self.sample_rate);
        Ok(())
    }

    pub fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(stream) = &self.stream {
            stream.pause()?;
            self.is_active = false;
            log::info!("Audio stream stopped");
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

impl Default for EngineOutput {
    fn default() -> Self {
        Self::new()
    }
}
