//! Event-driven controller: every user action or background result arrives
//! as an [`Event`] and is applied to the [`AppState`] in order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempPath};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::extract;
use crate::ranker::SimilarityRanker;
use crate::session::AppState;
use crate::viewer;
use crate::voice::{
    ListenConfig, ListenHandle, ListenOutcome, SpeechQueue, SpeechSynthesizer, VoiceEvent,
    VoiceOpener,
};

pub const PARAGRAPH_PROMPT: &str = "Which paragraph? (e.g., 1st, 2nd)";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Upload(PathBuf),
    OpenPdf,
    SubmitText(String),
    StartVoice,
    CancelVoice,
    Voice(VoiceEvent),
    /// `None` asks which paragraph; `Some(reply)` answers the question.
    ExtractParagraph(Option<String>),
    ListHeadings,
    MakeMindMap,
    CloseDialog,
}

/// What the front end should show besides the dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Notice(String),
    Viewer(PathBuf),
    MindMap { tree: String, dot: String },
}

/// Produces a fresh opener each time listening starts.
pub type VoiceInput = Box<dyn Fn() -> VoiceOpener + Send + Sync>;

pub struct Controller {
    state: AppState,
    settings: Settings,
    ranker: SimilarityRanker,
    speech: SpeechQueue,
    voice_input: Option<VoiceInput>,
    listener: Option<ListenHandle>,
    events: mpsc::UnboundedSender<VoiceEvent>,
    upload_file: Option<NamedTempFile>,
    viewer_file: Option<TempPath>,
}

impl Controller {
    pub fn new(
        settings: Settings,
        ranker: SimilarityRanker,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice_input: Option<VoiceInput>,
        events: mpsc::UnboundedSender<VoiceEvent>,
    ) -> Self {
        let speech = SpeechQueue::spawn(synthesizer, events.clone());
        Self {
            state: AppState::default(),
            settings,
            ranker,
            speech,
            voice_input,
            listener: None,
            events,
            upload_file: None,
            viewer_file: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply an event; failures end up in the dialog instead of aborting.
    pub async fn dispatch(&mut self, event: Event) -> Vec<Response> {
        debug!("Dispatching {:?}", event);
        match self.handle(event).await {
            Ok(responses) => responses,
            Err(e) => {
                warn!("Action failed: {}", e);
                self.state.dialog.show(format!("❌ {}", e));
                Vec::new()
            }
        }
    }

    pub async fn handle(&mut self, event: Event) -> Result<Vec<Response>> {
        match event {
            Event::Upload(path) => self.upload(&path),
            Event::OpenPdf => self.open_pdf(),
            Event::SubmitText(text) => {
                self.state.last_input = Some(text.to_lowercase());
                self.state.voice_command = None;
                self.answer_query()
            }
            Event::StartVoice => self.start_voice(),
            Event::CancelVoice => {
                match &self.listener {
                    Some(listener) => {
                        listener.cancel();
                        Ok(vec![Response::Notice("Cancelling voice input...".to_string())])
                    }
                    None => Ok(vec![Response::Notice("Not listening.".to_string())]),
                }
            }
            Event::Voice(voice) => self.on_voice(voice).await,
            Event::ExtractParagraph(reply) => self.extract_paragraph(reply.as_deref()),
            Event::ListHeadings => {
                self.require_document()?;
                let text = self.state.mind_map.heading_lines();
                self.show_and_speak(text)?;
                Ok(Vec::new())
            }
            Event::MakeMindMap => {
                self.require_document()?;
                let tree = self.state.mind_map.render_tree();
                let dot = self.state.mind_map.to_dot();
                self.speech.speak("Here's your mind map.")?;
                Ok(vec![Response::MindMap { tree, dot }])
            }
            Event::CloseDialog => {
                self.state.clear_dialog();
                Ok(Vec::new())
            }
        }
    }

    fn upload(&mut self, path: &Path) -> Result<Vec<Response>> {
        let mime = mime_guess::from_path(path).first();
        if mime.as_ref().map(|m| m.essence_str()) != Some("application/pdf") {
            return Err(AssistantError::UnsupportedFileType(
                mime.map(|m| m.to_string())
                    .unwrap_or_else(|| path.display().to_string()),
            ));
        }

        let mut temp = tempfile::Builder::new()
            .prefix("voice-pdf-")
            .suffix(".pdf")
            .tempfile()?;
        let mut input = fs::File::open(path)?;
        std::io::copy(&mut input, temp.as_file_mut())?;

        let extraction = extract::extract(temp.path(), &self.settings.extract)?;
        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        info!("Loaded {} into {}", source_name, temp.path().display());

        self.state
            .load_document(temp.path().to_path_buf(), source_name, extraction);
        // the previous upload and its viewer page are removed here
        self.upload_file = Some(temp);
        self.viewer_file = None;
        Ok(vec![Response::Notice(format!(
            "PDF uploaded. {}",
            self.state.status_line()
        ))])
    }

    fn open_pdf(&mut self) -> Result<Vec<Response>> {
        let path = self.require_document()?.to_path_buf();
        self.state.show_pdf = true;
        let viewer = viewer::write_viewer(&path)?;
        let shown = viewer.to_path_buf();
        self.viewer_file = Some(viewer);
        Ok(vec![Response::Viewer(shown)])
    }

    fn answer_query(&mut self) -> Result<Vec<Response>> {
        self.require_document()?;
        let Some(query) = self.state.pending_query().map(str::to_string) else {
            return Ok(Vec::new());
        };
        let outcome = self.ranker.rank(&query, &self.state.paragraphs)?;
        if let Some(hit) = outcome.best() {
            info!("Best paragraph #{} (score {:.4}) for {:?}", hit.index + 1, hit.score, query);
        }
        self.show_and_speak(outcome.answer_text().to_string())?;
        Ok(Vec::new())
    }

    fn start_voice(&mut self) -> Result<Vec<Response>> {
        if self.listener.is_some() {
            return Ok(vec![Response::Notice("Already listening.".to_string())]);
        }
        let voice_input = self.voice_input.as_ref().ok_or_else(|| {
            AssistantError::Voice(
                "voice input is unavailable (build with the `voice` feature or pass --voice-script)"
                    .to_string(),
            )
        })?;
        let opener = voice_input();
        self.state.voice_command = None;
        self.state.listening = true;
        let config = ListenConfig::from(&self.settings.voice);
        let stop_word = config.stop_word.clone();
        self.listener = Some(ListenHandle::spawn(opener, config, self.events.clone()));
        Ok(vec![Response::Notice(format!(
            "🎧 Voice input active. Say something (say '{}' to end)...",
            stop_word
        ))])
    }

    async fn on_voice(&mut self, event: VoiceEvent) -> Result<Vec<Response>> {
        match event {
            VoiceEvent::Heard(outcome) => {
                self.finish_listening().await;
                match outcome {
                    ListenOutcome::Utterance(text) => {
                        self.state.voice_command = Some(text.clone());
                        let mut responses = vec![Response::Notice(format!("🗣 Heard: {}", text))];
                        responses.extend(self.answer_query()?);
                        Ok(responses)
                    }
                    ListenOutcome::Stopped => {
                        Ok(vec![Response::Notice("Listening stopped.".to_string())])
                    }
                    ListenOutcome::Exhausted => {
                        Ok(vec![Response::Notice("No speech recognized.".to_string())])
                    }
                    ListenOutcome::Cancelled => {
                        Ok(vec![Response::Notice("Listening cancelled.".to_string())])
                    }
                }
            }
            VoiceEvent::ListenFailed(message) => {
                self.finish_listening().await;
                Err(AssistantError::Voice(message))
            }
            VoiceEvent::Spoken(text) => {
                debug!("Finished speaking {} chars", text.len());
                Ok(Vec::new())
            }
            VoiceEvent::SpeakFailed(message) => Ok(vec![Response::Notice(format!(
                "Speech output failed: {}",
                message
            ))]),
        }
    }

    async fn finish_listening(&mut self) {
        self.state.listening = false;
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.join().await {
                debug!("Listener ended with error: {}", e);
            }
        }
    }

    fn extract_paragraph(&mut self, reply: Option<&str>) -> Result<Vec<Response>> {
        self.require_document()?;
        let Some(reply) = reply.filter(|r| !r.trim().is_empty()) else {
            self.state.dialog.show(PARAGRAPH_PROMPT);
            self.speech.speak("Which paragraph?")?;
            return Ok(Vec::new());
        };

        let count = self.state.paragraphs.len();
        let text = match parse_ordinal(reply) {
            Some(Ordinal::Last) if count > 0 => self.state.paragraphs[count - 1].clone(),
            Some(Ordinal::Nth(n)) if n <= count => self.state.paragraphs[n - 1].clone(),
            Some(Ordinal::Nth(n)) => {
                format!("Paragraph {} not found; the document has {} paragraphs.", n, count)
            }
            Some(Ordinal::Last) => "The document has no paragraphs.".to_string(),
            None => format!("Could not understand {:?}. Try 1st, 2nd, third or 4.", reply),
        };
        self.show_and_speak(text)?;
        Ok(Vec::new())
    }

    fn show_and_speak(&mut self, text: String) -> Result<()> {
        self.speech.speak(text.clone())?;
        self.state.dialog.show(text);
        Ok(())
    }

    fn require_document(&self) -> Result<&Path> {
        self.state
            .pdf_path
            .as_deref()
            .ok_or(AssistantError::NoDocument)
    }

    /// Cancel any listener, let queued speech finish and remove temp files.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(listener) = self.listener.take() {
            listener.cancel();
            let _ = listener.join().await;
        }
        drop(self.viewer_file.take());
        drop(self.upload_file.take());
        self.speech.shutdown().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    Nth(usize),
    Last,
}

const ORDINAL_WORDS: &[(&str, usize)] = &[
    ("first", 1),
    ("one", 1),
    ("second", 2),
    ("two", 2),
    ("third", 3),
    ("three", 3),
    ("fourth", 4),
    ("four", 4),
    ("fifth", 5),
    ("five", 5),
    ("sixth", 6),
    ("six", 6),
    ("seventh", 7),
    ("seven", 7),
    ("eighth", 8),
    ("eight", 8),
    ("ninth", 9),
    ("nine", 9),
    ("tenth", 10),
    ("ten", 10),
];

/// Parse replies such as "1st", "the 2nd paragraph", "third", "4" or "last".
pub fn parse_ordinal(reply: &str) -> Option<Ordinal> {
    for token in reply.split_whitespace() {
        let token: String = token
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if token == "last" {
            return Some(Ordinal::Last);
        }
        if let Some(&(_, n)) = ORDINAL_WORDS.iter().find(|(word, _)| *word == token) {
            return Some(Ordinal::Nth(n));
        }
        let digits = token
            .strip_suffix("st")
            .or_else(|| token.strip_suffix("nd"))
            .or_else(|| token.strip_suffix("rd"))
            .or_else(|| token.strip_suffix("th"))
            .unwrap_or(&token);
        if let Ok(n) = digits.parse::<usize>() {
            return (n > 0).then_some(Ordinal::Nth(n));
        }
    }
    None
}
