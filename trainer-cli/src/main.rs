// trainer-cli/src/main.rs

//! # Note Trainer
//!
//! Terminal frontend for the trainer core.
//!
//! ## Architecture
//! - **Main Thread**: owns the `TrainerSession`, fires its timers and
//!   renders its events
//! - **Audio Thread**: captures frames and estimates their pitch
//! - **Communication**: crossbeam channels in both directions

mod audio;
mod cli;
mod display;
mod estimator;

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender};
use trainer_core::{PitchObservation, TrainerConfig, TrainerError, TrainerEvent, TrainerSession};

use cli::Cli;
use display::Renderer;
use estimator::PitchEstimator;

/// Interval of the main loop's timer tick.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// What the audio thread sends to the main thread.
enum AudioMessage {
    Observation(PitchObservation),
    Failed(String),
}

/// Audio thread handle.
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    /// Spawns the capture and estimation thread.
    ///
    /// Capture failures are reported once as [`AudioMessage::Failed`], after
    /// which the thread exits.
    fn spawn(frame_size: usize, clock: Instant, observations: Sender<AudioMessage>) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_handle = thread::spawn(move || {
            let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);
            let (stream, sample_rate) = match audio::start_audio_capture(frame_tx, frame_size) {
                Ok(capture) => capture,
                Err(e) => {
                    log::warn!("audio capture failed to start: {e:#}");
                    let _ = observations.send(AudioMessage::Failed(format!("{e:#}")));
                    return;
                }
            };

            let mut estimator = PitchEstimator::new(frame_size, sample_rate);
            log::debug!("audio thread running with {}-sample frames", estimator.frame_size());

            loop {
                crossbeam_channel::select! {
                    recv(frame_rx) -> msg => match msg {
                        Ok(frame) => {
                            let observation = estimator.estimate(&frame, elapsed_ms(clock));
                            if observations.send(AudioMessage::Observation(observation)).is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            let _ = observations.send(AudioMessage::Failed("audio stream ended".to_string()));
                            break;
                        }
                    },
                    recv(shutdown_rx) -> _ => {
                        log::debug!("audio thread received shutdown signal");
                        break;
                    }
                }
            }

            if let Err(e) = stream.pause() {
                log::warn!("error pausing stream: {e}");
            }
        });

        Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        }
    }

    fn shutdown(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("audio thread panicked");
            }
        }
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(path) = &cli.write_default_config {
        TrainerConfig::default().save(path)?;
        log::info!("wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => TrainerConfig::load(path)?,
        None => TrainerConfig::default(),
    };
    config.validate().context("configuration rejected")?;

    run(&cli, config)
}

fn run(cli: &Cli, config: TrainerConfig) -> Result<()> {
    let options = cli.session_options();
    let clock = Instant::now();

    let (event_tx, event_rx) = crossbeam_channel::unbounded::<TrainerEvent>();
    let mut session = match cli.seed {
        Some(seed) => TrainerSession::with_seed(config, event_tx, seed),
        None => TrainerSession::new(config, event_tx),
    };

    let (audio_tx, audio_rx) = crossbeam_channel::bounded::<AudioMessage>(32);
    let worker = AudioWorker::spawn(estimator::frame_size_for(options.profile), clock, audio_tx);

    let mut renderer = Renderer::new(cli.json);
    let ticker = crossbeam_channel::tick(TICK_INTERVAL);
    let time_limit = match cli.seconds {
        Some(seconds) => crossbeam_channel::after(Duration::from_secs(seconds)),
        None => crossbeam_channel::never(),
    };

    session.start_session(options, elapsed_ms(clock));

    let mut failure = None;
    loop {
        crossbeam_channel::select! {
            recv(audio_rx) -> msg => match msg {
                Ok(AudioMessage::Observation(observation)) => session.process(&observation),
                Ok(AudioMessage::Failed(message)) => {
                    let error = TrainerError::InputUnavailable(message);
                    session.report_input_failure(&error);
                    failure = Some(error);
                }
                Err(_) => break,
            },
            recv(ticker) -> _ => session.tick(elapsed_ms(clock)),
            recv(time_limit) -> _ => {
                log::info!("time limit reached");
                break;
            }
        }

        render_pending(&mut renderer, &event_rx)?;
        if !session.is_active() {
            break;
        }
    }

    session.stop_session();
    render_pending(&mut renderer, &event_rx)?;
    worker.shutdown();

    match failure {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

fn render_pending(renderer: &mut Renderer, events: &Receiver<TrainerEvent>) -> Result<()> {
    for event in events.try_iter() {
        renderer.show(&event).context("failed to render event")?;
    }
    Ok(())
}
