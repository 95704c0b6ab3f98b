// Push-to-talk recognizer: records the default microphone, then transcribes with Whisper.
use crate::capture::{Recognizer, RecognizerEvent, RecognizerSink};
use crate::error::CaptureError;
use async_openai::{Client, config::OpenAIConfig, types::CreateTranscriptionRequestArgs};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::io::BufWriter;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

type Samples = Arc<Mutex<Vec<f32>>>;

pub struct MicrophoneRecognizer {
    client: Client<OpenAIConfig>,
    model: String,
    transcription_timeout: Duration,
    runtime: tokio::runtime::Handle,
    // true keeps and transcribes the take, false discards it.
    session: Option<mpsc::Sender<bool>>,
}

impl MicrophoneRecognizer {
    /// Returns `None` when there is no input device to record from.
    pub fn detect(
        api_key: &str,
        model: impl Into<String>,
        transcription_timeout: Duration,
        runtime: tokio::runtime::Handle,
    ) -> Option<Self> {
        let device = cpal::default_host().default_input_device()?;
        log::info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "<unknown>".to_string())
        );
        let openai_config = OpenAIConfig::new().with_api_key(api_key);
        Some(Self {
            client: Client::with_config(openai_config),
            model: model.into(),
            transcription_timeout,
            runtime,
            session: None,
        })
    }

    fn finish(&mut self, keep: bool) {
        if let Some(session) = self.session.take() {
            let _ = session.send(keep);
        }
    }
}

impl Recognizer for MicrophoneRecognizer {
    fn start(&mut self, sink: RecognizerSink) -> Result<(), CaptureError> {
        self.finish(false);

        let (stop_tx, stop_rx) = mpsc::channel::<bool>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();
        let client = self.client.clone();
        let model = self.model.clone();
        let transcription_timeout = self.transcription_timeout;
        let runtime = self.runtime.clone();

        thread::Builder::new()
            .name("landfall-audio-in".to_string())
            .spawn(move || {
                let samples: Samples = Arc::new(Mutex::new(Vec::new()));
                let (stream, sample_rate) = match open_input(Arc::clone(&samples), sink.clone()) {
                    Ok(opened) => opened,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // A dropped sender counts as an abort.
                let keep = stop_rx.recv().unwrap_or(false);
                drop(stream);
                if !keep {
                    log::debug!("Recording discarded");
                    return;
                }

                let recorded = match samples.lock() {
                    Ok(mut buffer) => std::mem::take(&mut *buffer),
                    Err(_) => Vec::new(),
                };
                if recorded.is_empty() {
                    sink(RecognizerEvent::Ended);
                    return;
                }

                let recording = match write_wav(&recorded, sample_rate) {
                    Ok(recording) => recording,
                    Err(e) => {
                        sink(RecognizerEvent::Error(e));
                        return;
                    }
                };
                runtime.spawn(async move {
                    let result = match tokio::time::timeout(
                        transcription_timeout,
                        transcribe(&client, &model, recording.path()),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(CaptureError::Transcription(format!(
                            "no answer after {}s",
                            transcription_timeout.as_secs()
                        ))),
                    };
                    // The recording is deleted here, whatever the outcome.
                    drop(recording);
                    match result {
                        Ok(text) => {
                            sink(RecognizerEvent::Final(text));
                            sink(RecognizerEvent::Ended);
                        }
                        Err(e) => sink(RecognizerEvent::Error(e)),
                    }
                });
            })
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| CaptureError::Device("audio input thread exited".to_string()))??;
        self.session = Some(stop_tx);
        Ok(())
    }

    fn stop(&mut self) {
        self.finish(true);
    }

    fn abort(&mut self) {
        self.finish(false);
    }
}

fn open_input(samples: Samples, sink: RecognizerSink) -> Result<(cpal::Stream, u32), CaptureError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(CaptureError::Unavailable)?;
    let supported = device.default_input_config()?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;

    let on_error = move |err: cpal::StreamError| {
        log::error!("Audio input stream error: {}", err);
        sink(RecognizerEvent::Error(CaptureError::Device(err.to_string())));
    };

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buffer) = samples.lock() {
                    buffer.extend(to_mono(data.iter().copied(), channels));
                }
            },
            on_error,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buffer) = samples.lock() {
                    let floats = data.iter().map(|s| *s as f32 / i16::MAX as f32);
                    buffer.extend(to_mono(floats, channels));
                }
            },
            on_error,
            None,
        )?,
        other => {
            return Err(CaptureError::Device(format!(
                "unsupported sample format {other:?}"
            )));
        }
    };
    stream.play()?;
    log::debug!("Recording at {}Hz, {} channels", sample_rate, channels);
    Ok((stream, sample_rate))
}

// Averages interleaved frames down to one channel.
fn to_mono(data: impl Iterator<Item = f32>, channels: usize) -> Vec<f32> {
    let interleaved: Vec<f32> = data.collect();
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Writes a mono 16-bit WAV to a temporary file that is removed when dropped.
pub fn write_wav(samples: &[f32], sample_rate: u32) -> Result<NamedTempFile, CaptureError> {
    let mut recording = tempfile::Builder::new()
        .prefix("landfall-")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| CaptureError::Recording(e.to_string()))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(BufWriter::new(recording.as_file_mut()), spec)?;
    for sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(recording)
}

async fn transcribe(
    client: &Client<OpenAIConfig>,
    model: &str,
    path: &Path,
) -> Result<String, CaptureError> {
    let request = CreateTranscriptionRequestArgs::default()
        .file(path)
        .model(model)
        .build()
        .map_err(|e| CaptureError::Transcription(e.to_string()))?;
    let response = client
        .audio()
        .transcribe(request)
        .await
        .map_err(|e| CaptureError::Transcription(e.to_string()))?;
    log::debug!("Transcribed {}: {}", path.display(), response.text);
    Ok(response.text.trim().to_string())
}
