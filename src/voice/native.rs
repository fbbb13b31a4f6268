//! Microphone capture (cpal), Vosk recognition and system text-to-speech.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::{AudioSource, Recognizer, SpeechSynthesizer, VoiceOpener};
use crate::config::VoiceSettings;
use crate::error::{AssistantError, Result};

/// Default input device opened as 16-bit mono at the configured rate.
pub struct MicrophoneSource {
    // keeps the capture running; stopped on drop
    _stream: cpal::Stream,
    samples: std_mpsc::Receiver<Vec<i16>>,
    pending: Vec<i16>,
}

impl MicrophoneSource {
    pub fn open(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AssistantError::Voice("no default input device".to_string()))?;
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let (tx, samples) = std_mpsc::channel();
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(data.to_vec());
                },
                |err| warn!("Audio input error: {}", err),
                None,
            )
            .map_err(|e| AssistantError::Voice(format!("failed to open microphone: {}", e)))?;
        stream
            .play()
            .map_err(|e| AssistantError::Voice(format!("failed to start microphone: {}", e)))?;
        Ok(Self {
            _stream: stream,
            samples,
            pending: Vec::new(),
        })
    }
}

impl AudioSource for MicrophoneSource {
    fn read_chunk(&mut self, frames: usize) -> Result<Option<Vec<i16>>> {
        while self.pending.len() < frames {
            match self.samples.recv_timeout(Duration::from_millis(250)) {
                Ok(data) => self.pending.extend_from_slice(&data),
                // hand back a short chunk so the listener can check for cancellation
                Err(std_mpsc::RecvTimeoutError::Timeout) => break,
                Err(std_mpsc::RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
        let take = frames.min(self.pending.len());
        Ok(Some(self.pending.drain(..take).collect()))
    }
}

pub struct VoskRecognizer {
    _model: vosk::Model,
    recognizer: vosk::Recognizer,
}

impl VoskRecognizer {
    pub fn new(model_dir: &Path, sample_rate: u32) -> Result<Self> {
        let model = vosk::Model::new(model_dir.to_string_lossy().to_string())
            .ok_or_else(|| AssistantError::ModelNotFound(model_dir.display().to_string()))?;
        let recognizer = vosk::Recognizer::new(&model, sample_rate as f32)
            .ok_or_else(|| AssistantError::Voice("failed to create recognizer".to_string()))?;
        Ok(Self {
            _model: model,
            recognizer,
        })
    }
}

impl Recognizer for VoskRecognizer {
    fn accept(&mut self, pcm: &[i16]) -> Result<Option<String>> {
        if pcm.is_empty() {
            return Ok(None);
        }
        let state = self
            .recognizer
            .accept_waveform(pcm)
            .map_err(|e| AssistantError::Voice(format!("recognizer rejected audio: {:?}", e)))?;
        if !matches!(state, vosk::DecodingState::Finalized) {
            return Ok(None);
        }
        let text = self
            .recognizer
            .result()
            .single()
            .map(|result| result.text.to_string())
            .unwrap_or_default();
        Ok(Some(text))
    }
}

/// Opener for live microphone listening with the configured Vosk model.
pub fn microphone_opener(settings: &VoiceSettings) -> VoiceOpener {
    let model_dir = settings.model_path();
    let sample_rate = settings.sample_rate;
    Box::new(move || {
        let recognizer: Box<dyn Recognizer> =
            Box::new(VoskRecognizer::new(&model_dir, sample_rate)?);
        let source: Box<dyn AudioSource> = Box::new(MicrophoneSource::open(sample_rate)?);
        Ok((source, recognizer))
    })
}

struct SpeakRequest {
    text: String,
    done: oneshot::Sender<Result<()>>,
}

/// System speech engine, owned by a dedicated thread.
pub struct NativeSynthesizer {
    requests: std_mpsc::Sender<SpeakRequest>,
}

impl NativeSynthesizer {
    pub fn new(rate: Option<f32>) -> Result<Self> {
        let (requests, rx) = std_mpsc::channel::<SpeakRequest>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<()>>();
        thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                let mut engine = match tts::Tts::default() {
                    Ok(engine) => engine,
                    Err(e) => {
                        let _ = ready_tx.send(Err(AssistantError::Voice(e.to_string())));
                        return;
                    }
                };
                if let Some(rate) = rate {
                    let span = engine.max_rate() - engine.min_rate();
                    let value = engine.min_rate() + span * rate.clamp(0.0, 1.0);
                    if let Err(e) = engine.set_rate(value) {
                        warn!("Could not set speech rate: {}", e);
                    }
                }
                let _ = ready_tx.send(Ok(()));
                for request in rx {
                    let result = speak_blocking(&mut engine, &request.text);
                    let _ = request.done.send(result);
                }
            })?;
        ready_rx
            .recv()
            .map_err(|_| AssistantError::Voice("speech thread exited".to_string()))??;
        info!("System speech engine ready");
        Ok(Self { requests })
    }
}

fn speak_blocking(engine: &mut tts::Tts, text: &str) -> Result<()> {
    engine
        .speak(text, false)
        .map_err(|e| AssistantError::Voice(e.to_string()))?;
    while engine.is_speaking().unwrap_or(false) {
        thread::sleep(Duration::from_millis(50));
    }
    Ok(())
}

#[async_trait]
impl SpeechSynthesizer for NativeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.requests
            .send(SpeakRequest {
                text: text.to_string(),
                done,
            })
            .map_err(|_| AssistantError::Voice("speech thread exited".to_string()))?;
        wait.await
            .map_err(|_| AssistantError::Voice("speech thread dropped request".to_string()))?
    }
}
