use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{contains_stop_word, AudioSource, ListenOutcome, Recognizer, VoiceEvent};
use crate::config::VoiceSettings;
use crate::error::{AssistantError, Result};

/// Opens the audio source and recognizer on the listening thread.
pub type VoiceOpener =
    Box<dyn FnOnce() -> Result<(Box<dyn AudioSource>, Box<dyn Recognizer>)> + Send>;

#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub chunk_frames: usize,
    pub stop_word: String,
}

impl From<&VoiceSettings> for ListenConfig {
    fn from(settings: &VoiceSettings) -> Self {
        Self {
            chunk_frames: settings.chunk_frames,
            stop_word: settings.stop_word.clone(),
        }
    }
}

/// Read chunks until an utterance completes, the stop word is heard, the
/// source runs dry or `cancel` is raised.
pub fn listen_blocking(
    source: &mut dyn AudioSource,
    recognizer: &mut dyn Recognizer,
    config: &ListenConfig,
    cancel: &AtomicBool,
) -> Result<ListenOutcome> {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return Ok(ListenOutcome::Cancelled);
        }
        let Some(chunk) = source.read_chunk(config.chunk_frames)? else {
            return Ok(ListenOutcome::Exhausted);
        };
        if let Some(text) = recognizer.accept(&chunk)? {
            debug!("Recognized utterance: {:?}", text);
            if contains_stop_word(&text, &config.stop_word) {
                return Ok(ListenOutcome::Stopped);
            }
            let text = text.trim();
            if !text.is_empty() {
                return Ok(ListenOutcome::Utterance(text.to_string()));
            }
        }
    }
}

/// A running listener that can be cancelled and joined.
pub struct ListenHandle {
    cancel: Arc<AtomicBool>,
    task: JoinHandle<Result<ListenOutcome>>,
}

impl ListenHandle {
    /// Start listening on a blocking task. The outcome is also sent on `events`.
    pub fn spawn(
        opener: VoiceOpener,
        config: ListenConfig,
        events: mpsc::UnboundedSender<VoiceEvent>,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let task = tokio::task::spawn_blocking(move || {
            info!("Voice input active (say '{}' to end)", config.stop_word);
            let result = opener().and_then(|(mut source, mut recognizer)| {
                listen_blocking(source.as_mut(), recognizer.as_mut(), &config, &flag)
            });
            let event = match &result {
                Ok(outcome) => VoiceEvent::Heard(outcome.clone()),
                Err(e) => VoiceEvent::ListenFailed(e.to_string()),
            };
            // receiver may already be gone during shutdown
            let _ = events.send(event);
            result
        });
        Self { cancel, task }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<ListenOutcome> {
        self.task
            .await
            .map_err(|e| AssistantError::Voice(format!("Listener task failed: {}", e)))?
    }
}
