use crate::{CoreError, CoreResult, capture::EncodingProfile};

use std::{
    fs::File,
    io::BufWriter,
    panic::Location,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use cpal::{
    Device, SampleFormat, SizedSample, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use hound::{WavSpec, WavWriter};
use tracing::{debug, error, info, instrument, warn};

type SharedWriter = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// Platform audio input, treated as an opaque capability by
/// [`CaptureSession`](crate::CaptureSession).
///
/// Calls arrive in the order `open`, `record_to`, `finalize`, `close`;
/// `close` may also follow `open` or a failed `record_to` directly.
pub trait CaptureDevice: Send {
    /// Acquires the input and applies `profile`.
    ///
    /// Fails with [`CoreError::DeviceUnavailable`] when there is no input or
    /// the profile cannot be applied.
    fn open(&mut self, profile: &EncodingProfile) -> CoreResult<()>;

    /// Starts writing captured audio into a new file at `artifact`.
    fn record_to(&mut self, artifact: &Path) -> CoreResult<()>;

    /// Stops capture, then flushes and closes the artifact. When this
    /// returns `Ok`, the file is complete and readable.
    fn finalize(&mut self) -> CoreResult<()>;

    /// Releases the input.
    fn close(&mut self);
}

struct OpenedInput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    spec: WavSpec,
}

/// [`CaptureDevice`] over the default CPAL input.
///
/// Input frames are downmixed to mono and converted to 16-bit PCM in the
/// stream callback, then appended to the WAV artifact.
pub struct CpalDevice {
    input: Option<OpenedInput>,
    stream: Option<Stream>,
    writer: SharedWriter,
    /// Signals the audio callback to stop writing. Set to `true` before
    /// dropping the stream so no in-flight callback touches the writer
    /// once `finalize()` has taken it.
    shutdown: Arc<AtomicBool>,
}

impl CpalDevice {
    /// Creates a closed device.
    pub fn new() -> Self {
        Self {
            input: None,
            stream: None,
            writer: Arc::new(Mutex::new(None)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    #[track_caller]
    fn build_stream<T, F>(&self, input: &OpenedInput, to_pcm: F) -> CoreResult<Stream>
    where
        T: SizedSample,
        F: Fn(T) -> i16 + Send + 'static,
    {
        let writer = Arc::clone(&self.writer);
        let shutdown = Arc::clone(&self.shutdown);
        let channels = usize::from(input.config.channels.max(1));

        input
            .device
            .build_input_stream(
                &input.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    let mut guard = writer.lock().unwrap_or_else(|e| {
                        error!("Artifact writer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    let Some(wav) = guard.as_mut() else {
                        return;
                    };
                    for frame in data.chunks(channels) {
                        let sum: i32 = frame.iter().map(|&s| i32::from(to_pcm(s))).sum();
                        let mono = sum / frame.len() as i32;
                        if let Err(e) = wav.write_sample(mono as i16) {
                            error!("Failed to append audio to artifact: {}", e);
                            shutdown.store(true, Ordering::Release);
                            return;
                        }
                    }
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| CoreError::DeviceUnavailable {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Drops a half-created artifact that never received audio.
    fn discard_writer(&mut self, artifact: &Path) {
        let abandoned = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if abandoned.is_some() {
            drop(abandoned);
            if let Err(e) = std::fs::remove_file(artifact) {
                warn!(artifact = ?artifact, error = %e, "Failed to remove empty artifact");
            }
        }
    }
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn f32_to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

impl CaptureDevice for CpalDevice {
    #[track_caller]
    #[instrument(skip(self))]
    fn open(&mut self, profile: &EncodingProfile) -> CoreResult<()> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(CoreError::DeviceUnavailable {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let wanted_rate = profile.sample_rate();

        // Prefer the fewest channels, then f32 over i16.
        let supported = device
            .supported_input_configs()
            .map_err(|e| CoreError::DeviceUnavailable {
                reason: format!("Failed to query input configs: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .filter(|range| {
                range.min_sample_rate() <= wanted_rate && wanted_rate <= range.max_sample_rate()
            })
            .filter(|range| matches!(range.sample_format(), SampleFormat::F32 | SampleFormat::I16))
            .min_by_key(|range| {
                (
                    range.channels(),
                    u8::from(range.sample_format() != SampleFormat::F32),
                )
            })
            .ok_or_else(|| CoreError::DeviceUnavailable {
                reason: format!("Input does not support {} Hz PCM capture", wanted_rate),
                location: ErrorLocation::from(Location::caller()),
            })?
            .with_sample_rate(wanted_rate);

        info!(
            device_id = ?device.id(),
            sample_rate = supported.sample_rate(),
            channels = supported.channels(),
            sample_format = ?supported.sample_format(),
            "Capture device opened"
        );

        self.input = Some(OpenedInput {
            sample_format: supported.sample_format(),
            config: supported.into(),
            device,
            spec: profile.wav_spec(),
        });

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn record_to(&mut self, artifact: &Path) -> CoreResult<()> {
        let input = self.input.take().ok_or(CoreError::NotArmed {
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.shutdown.store(false, Ordering::Release);

        let built = match input.sample_format {
            SampleFormat::F32 => self.build_stream::<f32, _>(&input, f32_to_pcm16),
            SampleFormat::I16 => self.build_stream::<i16, _>(&input, |s: i16| s),
            other => Err(CoreError::DeviceUnavailable {
                reason: format!("Unsupported sample format: {:?}", other),
                location: ErrorLocation::from(Location::caller()),
            }),
        };
        let spec = input.spec;
        self.input = Some(input);
        let stream = built?;

        let wav = WavWriter::create(artifact, spec).map_err(|e| CoreError::ArtifactWriteError {
            reason: format!("Failed to create {:?}: {}", artifact, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        *self.writer.lock().unwrap_or_else(|e| e.into_inner()) = Some(wav);

        if let Err(e) = stream.play() {
            drop(stream);
            self.discard_writer(artifact);
            return Err(CoreError::DeviceUnavailable {
                reason: format!("Failed to start stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.stream = Some(stream);
        info!(artifact = ?artifact, "Audio capture started");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn finalize(&mut self) -> CoreResult<()> {
        // Signal the callback before dropping the stream, in case a
        // backend's drop returns before its final callback has run.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            std::thread::sleep(std::time::Duration::from_millis(5));
            info!("Audio capture stopped");
        }

        let wav = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(CoreError::NotRecording {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let frames = wav.len();
        wav.finalize().map_err(|e| CoreError::ArtifactWriteError {
            reason: format!("Failed to finalize WAV: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(frames, "Artifact finalized");

        Ok(())
    }

    fn close(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.stream = None;
        self.input = None;
    }
}
