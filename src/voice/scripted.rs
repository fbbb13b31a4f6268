//! Pre-recorded voice input: utterances come from a list instead of a microphone.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{AudioSource, Recognizer, VoiceOpener};
use crate::error::{AssistantError, Result};

/// Yields a fixed number of silent chunks.
pub struct SilenceSource {
    remaining: usize,
}

impl SilenceSource {
    pub fn new(chunks: usize) -> Self {
        Self { remaining: chunks }
    }
}

impl AudioSource for SilenceSource {
    fn read_chunk(&mut self, frames: usize) -> Result<Option<Vec<i16>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(vec![0; frames]))
    }
}

/// Completes one scripted utterance per accepted chunk.
pub struct ScriptedRecognizer {
    utterances: VecDeque<String>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            utterances: utterances.into_iter().map(Into::into).collect(),
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    fn accept(&mut self, _pcm: &[i16]) -> Result<Option<String>> {
        Ok(self.utterances.pop_front())
    }
}

/// Recognized lines read from a file, consumed across listening sessions.
///
/// Each opener continues where the previous listen left off; once every
/// line is used the source reports exhaustion.
#[derive(Clone)]
pub struct Transcript {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl Transcript {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::new(text.lines()))
    }

    pub fn remaining(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn opener(&self) -> VoiceOpener {
        let feed = TranscriptFeed {
            lines: Arc::clone(&self.lines),
        };
        Box::new(move || {
            let source: Box<dyn AudioSource> = Box::new(feed.clone());
            let recognizer: Box<dyn Recognizer> = Box::new(feed);
            Ok((source, recognizer))
        })
    }
}

#[derive(Clone)]
struct TranscriptFeed {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl TranscriptFeed {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<String>>> {
        self.lines
            .lock()
            .map_err(|_| AssistantError::Voice("transcript lock poisoned".to_string()))
    }
}

impl AudioSource for TranscriptFeed {
    fn read_chunk(&mut self, frames: usize) -> Result<Option<Vec<i16>>> {
        if self.lock()?.is_empty() {
            return Ok(None);
        }
        Ok(Some(vec![0; frames]))
    }
}

impl Recognizer for TranscriptFeed {
    fn accept(&mut self, _pcm: &[i16]) -> Result<Option<String>> {
        Ok(self.lock()?.pop_front())
    }
}
