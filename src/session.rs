//! Per-session application state. Only the controller writes to it.

use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::mindmap::MindMap;
use crate::models::Extraction;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialog {
    pub visible: bool,
    pub text: String,
}

impl Dialog {
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.visible = true;
    }

    pub fn clear(&mut self) {
        self.visible = false;
        self.text.clear();
    }

    /// Boxed rendering for the terminal overlay.
    pub fn render(&self) -> String {
        let lines: Vec<&str> = self.text.lines().collect();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(20, 100);
        let mut out = format!("╭{}╮\n", "─".repeat(width + 2));
        for line in lines {
            for chunk in wrap(line, width) {
                let pad = width - chunk.chars().count();
                out.push_str(&format!("│ {}{} │\n", chunk, " ".repeat(pad)));
            }
        }
        out.push_str(&format!("╰{}╯", "─".repeat(width + 2)));
        out
    }
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
        }
        if word.chars().count() > width {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(width) {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current = piece.iter().collect();
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    rows.push(current);
    rows
}

#[derive(Debug, Default)]
pub struct AppState {
    pub pdf_path: Option<PathBuf>,
    pub source_name: Option<String>,
    pub uploaded_at: Option<DateTime<Local>>,
    pub paragraphs: Vec<String>,
    pub headings: Vec<String>,
    pub mind_map: MindMap,
    pub dialog: Dialog,
    pub last_input: Option<String>,
    pub voice_command: Option<String>,
    pub listening: bool,
    pub show_pdf: bool,
}

impl AppState {
    pub fn has_document(&self) -> bool {
        self.pdf_path.is_some()
    }

    /// Replace everything derived from the previous document.
    pub fn load_document(&mut self, pdf_path: PathBuf, source_name: String, extraction: Extraction) {
        self.pdf_path = Some(pdf_path);
        self.source_name = Some(source_name);
        self.uploaded_at = Some(Local::now());
        self.paragraphs = extraction.paragraphs;
        self.headings = extraction.headings;
        self.mind_map = extraction.mind_map;
        self.show_pdf = false;
        self.last_input = None;
        self.voice_command = None;
        self.dialog.clear();
    }

    /// The pending query; a spoken command wins over typed input.
    pub fn pending_query(&self) -> Option<&str> {
        self.voice_command
            .as_deref()
            .or(self.last_input.as_deref())
            .filter(|q| !q.trim().is_empty())
    }

    pub fn clear_dialog(&mut self) {
        self.dialog.clear();
        self.voice_command = None;
        self.last_input = None;
    }

    pub fn status_line(&self) -> String {
        match (&self.source_name, &self.uploaded_at) {
            (Some(name), Some(at)) => format!(
                "{} (uploaded {}): {} paragraphs, {} headings{}",
                name,
                at.format("%H:%M:%S"),
                self.paragraphs.len(),
                self.headings.len(),
                if self.listening { ", listening" } else { "" }
            ),
            _ => "No PDF uploaded.".to_string(),
        }
    }
}
