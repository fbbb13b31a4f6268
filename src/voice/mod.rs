//! Voice input and output.
//!
//! Listening pulls 16 kHz mono PCM chunks from an [`AudioSource`] into a
//! streaming [`Recognizer`] on a blocking task. Speech output is serialized
//! through a [`SpeechQueue`] worker. Both report back as [`VoiceEvent`]s.

pub mod listen;
#[cfg(feature = "voice")]
pub mod native;
pub mod scripted;
pub mod speak;

use async_trait::async_trait;

use crate::config::VoiceSettings;
use crate::error::{AssistantError, Result};

pub use listen::{listen_blocking, ListenConfig, ListenHandle, VoiceOpener};
pub use speak::{ConsoleSynthesizer, SpeechQueue};

/// Source of 16-bit mono PCM frames.
pub trait AudioSource {
    /// Read up to `frames` samples; `None` once the source is exhausted.
    fn read_chunk(&mut self, frames: usize) -> Result<Option<Vec<i16>>>;
}

/// Streaming speech recognizer.
pub trait Recognizer {
    /// Feed a chunk; returns the utterance text once one is complete.
    fn accept(&mut self, pcm: &[i16]) -> Result<Option<String>>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`, returning once playback has finished.
    async fn synthesize(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Utterance(String),
    /// The stop word was heard.
    Stopped,
    /// The audio source ran dry before anything was recognized.
    Exhausted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    Heard(ListenOutcome),
    ListenFailed(String),
    Spoken(String),
    SpeakFailed(String),
}

/// Case-insensitive substring test, so "stopping" and "nonstop" also end
/// listening. A blank stop word never matches.
pub fn contains_stop_word(text: &str, stop_word: &str) -> bool {
    let stop_word = stop_word.trim().to_lowercase();
    !stop_word.is_empty() && text.to_lowercase().contains(&stop_word)
}

/// Fail fast when voice input is enabled but the recognition model is absent.
pub fn check_model_dir(settings: &VoiceSettings) -> Result<()> {
    if !settings.enabled {
        return Ok(());
    }
    let path = settings.model_path();
    if !path.is_dir() {
        return Err(AssistantError::ModelNotFound(path.display().to_string()));
    }
    Ok(())
}
