use std::error::Error;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample, Stream};

/// Observer of the sound timer: a 440 Hz sine that plays while the
/// timer is nonzero and is silent otherwise. The stream runs for the
/// life of the program; only the amplitude is gated.
pub struct Beeper {
    _stream: Stream,
    active: Arc<AtomicBool>,
}

impl Beeper {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("no audio output device available")?;
        let config = device.default_output_config()?;
        let active = Arc::new(AtomicBool::new(false));

        let stream = match config.sample_format() {
            cpal::SampleFormat::I8 => Self::build::<i8>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::I16 => Self::build::<i16>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::I32 => Self::build::<i32>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::U8 => Self::build::<u8>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::U16 => Self::build::<u16>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::U32 => Self::build::<u32>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::F32 => Self::build::<f32>(&device, &config.into(), active.clone()),
            cpal::SampleFormat::F64 => Self::build::<f64>(&device, &config.into(), active.clone()),
            format => return Err(format!("unsupported sample format '{format}'").into()),
        }?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            active,
        })
    }

    /// Called once per frame with the current sound-timer state.
    pub fn set_active(&self, on: bool) {
        self.active.store(on, Ordering::Relaxed);
    }

    fn build<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        active: Arc<AtomicBool>,
    ) -> Result<Stream, cpal::BuildStreamError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let sample_rate = config.sample_rate.0 as f32;
        let channels = config.channels as usize;

        let mut sample_clock = 0f32;
        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    sample_clock = (sample_clock + 1.0) % sample_rate;
                    let s = if active.load(Ordering::Relaxed) {
                        (sample_clock * 440.0 * 2.0 * std::f32::consts::PI / sample_rate).sin()
                            * 0.25
                    } else {
                        0.0
                    };
                    let value = T::from_sample(s);
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            |err| log::warn!("audio stream error: {err}"),
            None,
        )
    }
}
