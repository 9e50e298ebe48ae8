//! # Audio Capture Module
//!
//! Microphone capture through CPAL. Input is mixed down to mono and cut
//! into fixed-size frames that are pushed to the estimator thread.
//!
//! ## Features
//! - Default input device selection
//! - Prefers mono 32-bit float input, downmixes anything wider
//! - Frames are dropped rather than queued when the consumer falls behind

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SupportedStreamConfigRange};
use crossbeam_channel::Sender;

/// Preferred capture rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `sender` - Channel for complete mono frames
/// * `frame_size` - Samples per frame
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Running stream handle and its sample rate
/// * `Err(e)` - No device, no usable format, or the stream failed to start
pub fn start_audio_capture(sender: Sender<Vec<f32>>, frame_size: usize) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no input device available"))?;

    log::info!(
        "using audio input device: {}",
        device.name().unwrap_or_else(|_| "<unnamed>".to_string())
    );

    let configs = device
        .supported_input_configs()
        .context("failed to query input formats")?
        .collect::<Vec<_>>();
    let range = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("no f32 input format found"))?;

    let rate = TARGET_SAMPLE_RATE.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
    let supported = range.with_sample_rate(SampleRate(rate));
    let channels = usize::from(supported.channels()).max(1);
    let config: cpal::StreamConfig = supported.into();

    log::info!("capturing at {rate} Hz, {channels} channel(s), {frame_size}-sample frames");

    let err_fn = |err| log::warn!("audio stream error: {err}");

    let mut buffer: Vec<f32> = Vec::with_capacity(frame_size * 2);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                buffer.extend(
                    data.chunks(channels)
                        .map(|sample| sample.iter().sum::<f32>() / sample.len() as f32),
                );

                while buffer.len() >= frame_size {
                    let frame = buffer[..frame_size].to_vec();
                    // A full channel means the estimator is behind; skip the frame.
                    let _ = sender.try_send(frame);
                    buffer.drain(..frame_size);
                }
            },
            err_fn,
            None,
        )
        .context("failed to open input stream")?;

    stream.play().context("failed to start input stream")?;

    Ok((stream, rate))
}

/// Picks the f32 configuration with the fewest channels, then the one whose
/// rate range lies closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .min_by_key(|c| {
            let (min, max) = (c.min_sample_rate().0, c.max_sample_rate().0);
            let distance = if target_rate < min {
                min - target_rate
            } else {
                target_rate.saturating_sub(max)
            };
            (c.channels(), distance)
        })
}
