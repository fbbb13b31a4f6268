use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{SpeechSynthesizer, VoiceEvent};
use crate::error::{AssistantError, Result};

/// Writes what would be spoken to stdout.
pub struct ConsoleSynthesizer {
    out: Mutex<Stdout>,
}

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("🔊 {}\n", text).as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Single worker that speaks queued texts one after another.
pub struct SpeechQueue {
    tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SpeechQueue {
    pub fn spawn(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        events: mpsc::UnboundedSender<VoiceEvent>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let task = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                debug!("Speaking {} chars", text.len());
                let event = match synthesizer.synthesize(&text).await {
                    Ok(()) => VoiceEvent::Spoken(text),
                    Err(e) => {
                        warn!("Speech synthesis failed: {}", e);
                        VoiceEvent::SpeakFailed(e.to_string())
                    }
                };
                let _ = events.send(event);
            }
        });
        Self { tx, task }
    }

    pub fn speak(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(text.into())
            .map_err(|_| AssistantError::Voice("speech worker has stopped".to_string()))
    }

    /// Finish everything already queued, then stop the worker.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| AssistantError::Voice(format!("Speech worker failed: {}", e)))
    }
}
