//! Remix - audio setup and runner

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::RingBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use saavy_remix::{
    engine::RemixParams,
    io::{bridge::RingBridge, wav::WavFile, AudioOutput, AudioSink},
    RemixEngine, RemixError, MAX_BLOCK_SIZE,
};

use super::ui::UiApp;
use super::Config;

/// The engine as shared between the UI thread and the audio callback.
pub type SharedEngine = Arc<Mutex<RemixEngine<RemixParams, RingBridge>>>;

/// Ring buffer capacities
const BRIDGE_CAPACITY: usize = 1024;
const SCOPE_CAPACITY: usize = 8192;

pub struct Remix {
    config: Config,
}

impl Remix {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load the sample, open the output device and run the UI until quit.
    pub fn run(self) -> EyreResult<()> {
        let Config {
            path,
            params,
            preset,
            sound,
            seed,
        } = self.config;

        // Set up audio
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0;
        let device_channels = config.channels() as usize;
        let engine_channels = device_channels.min(2);

        let (bridge, bridge_rx) = RingBridge::new(BRIDGE_CAPACITY);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_CAPACITY);

        let mut builder = RemixEngine::builder()
            .sample_rate(sample_rate)
            .channels(engine_channels)
            .params(params)
            .sound_source(sound)
            .bridge(bridge);
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let mut engine = builder.build();
        engine
            .load_from(&mut WavFile::new(&path))
            .wrap_err_with(|| format!("failed to load {}", path.display()))?;

        let suspended = Arc::new(AtomicBool::new(false));
        let resume_requested = Arc::new(AtomicBool::new(false));
        engine.set_sink(Box::new(CpalSink {
            suspended: suspended.clone(),
            resume_requested: resume_requested.clone(),
        }));

        info!(
            path = %path.display(),
            sample_rate,
            device_channels,
            "starting remix session"
        );

        let engine: SharedEngine = Arc::new(Mutex::new(engine));

        // Set up audio stream
        let engine_clone = engine.clone();
        let mut block = AudioOutput::new(engine_channels, MAX_BLOCK_SIZE);

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let Ok(mut engine) = engine_clone.lock() else {
                    data.fill(0.0);
                    return;
                };
                let total_frames = data.len() / device_channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    block.set_frames(frames_to_render);
                    engine.process_block(&mut block);

                    let out_off = frames_written * device_channels;
                    let out_len = frames_to_render * device_channels;
                    block.interleave_into(&mut data[out_off..out_off + out_len], device_channels);

                    // First channel feeds the level meter; drop when the UI lags
                    for &sample in &block.buffers[0][..frames_to_render] {
                        if scope_tx.push(sample).is_err() {
                            break;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| error!(%err, "audio stream error"),
            None,
        )?;

        stream.play()?;

        let control = StreamControl::new(stream, suspended, resume_requested);
        let mut app = UiApp::new(engine, bridge_rx, scope_rx, control, preset);

        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();
        result
    }
}

/// Pause and resume for the output stream, owned by the UI thread.
pub struct StreamControl {
    stream: cpal::Stream,
    suspended: Arc<AtomicBool>,
    resume_requested: Arc<AtomicBool>,
}

impl StreamControl {
    fn new(stream: cpal::Stream, suspended: Arc<AtomicBool>, resume_requested: Arc<AtomicBool>) -> Self {
        Self {
            stream,
            suspended,
            resume_requested,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub fn toggle_pause(&self) -> EyreResult<()> {
        if self.is_paused() {
            self.stream.play().wrap_err("failed to resume output stream")?;
            self.suspended.store(false, Ordering::Release);
        } else {
            self.stream.pause().wrap_err("failed to pause output stream")?;
            self.suspended.store(true, Ordering::Release);
        }
        Ok(())
    }

    /// Act on a resume the engine asked for since the last call.
    pub fn service(&self) -> EyreResult<()> {
        if self.resume_requested.swap(false, Ordering::AcqRel) && self.is_paused() {
            self.toggle_pause()?;
        }
        Ok(())
    }
}

/// Lets the engine ask for a paused stream to be restarted.
///
/// `cpal::Stream` must stay on the thread that created it, so the sink only
/// raises a flag and the UI thread calls `play()`.
struct CpalSink {
    suspended: Arc<AtomicBool>,
    resume_requested: Arc<AtomicBool>,
}

impl AudioSink for CpalSink {
    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    fn resume(&mut self) -> Result<(), RemixError> {
        self.resume_requested.store(true, Ordering::Release);
        Ok(())
    }
}
