//! Page → block → line → span layout rebuilt from positioned glyphs.
//!
//! `pdf_extract` resolves fonts (simple encodings, ToUnicode CMaps, CID
//! fonts, Form XObjects) and reports every glyph with its text rendering
//! matrix. Glyphs sharing a baseline form a line, a change of rendered size
//! starts a new span, and a vertical jump of more than 1.5 line heights (or
//! any jump upwards) starts a new block.

use lopdf::Document;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

use crate::error::{AssistantError, Result};

/// Baseline drop, in line heights, that separates blocks.
const BLOCK_GAP: f64 = 1.5;
/// Baseline shift, in line heights, still read as the same line.
const SAME_BASELINE: f64 = 0.5;
/// Horizontal gap, in ems, that reads as a word break between text runs.
const WORD_GAP: f64 = 0.1;
const SIZE_TOLERANCE: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Block {
    /// All span texts joined by single spaces, trimmed.
    pub fn joined_text(&self) -> String {
        let mut text = String::new();
        for span in self.spans() {
            text.push_str(&span.text);
            text.push(' ');
        }
        text.trim().to_string()
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|line| line.spans.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub blocks: Vec<Block>,
}

pub fn load_pages(doc: &Document) -> Result<Vec<Page>> {
    let mut collector = LayoutCollector::default();
    // pdf_extract panics on some malformed fonts and content streams
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::output_doc(doc, &mut collector)
    }));
    outcome
        .map_err(|_| AssistantError::PdfExtraction("unreadable page content".to_string()))??;
    Ok(collector.finish())
}

/// One decoded glyph in page space.
#[derive(Debug, Clone, Copy)]
struct Glyph<'a> {
    x: f64,
    y: f64,
    /// Horizontal advance in page units.
    advance: f64,
    size: f64,
    text: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    y: f64,
    end_x: f64,
    size: f64,
}

#[derive(Default)]
struct LayoutCollector {
    pages: Vec<Page>,
    page_number: Option<u32>,
    blocks: Vec<Block>,
    block: Block,
    line: Line,
    span: Option<Span>,
    cursor: Option<Cursor>,
    run_start: bool,
}

impl LayoutCollector {
    fn push_glyph(&mut self, glyph: Glyph<'_>) {
        let text: String = glyph.text.chars().filter(|c| !c.is_control()).collect();
        if text.is_empty() {
            return;
        }
        let run_start = std::mem::take(&mut self.run_start);

        if let Some(prev) = self.cursor {
            let drop = prev.y - glyph.y;
            let line_height = prev.size.max(glyph.size);
            if drop.abs() > line_height * SAME_BASELINE {
                if drop < 0.0 || drop > line_height * BLOCK_GAP {
                    self.close_block();
                } else {
                    self.close_line();
                }
            } else if run_start && glyph.x > prev.end_x + glyph.size * WORD_GAP {
                self.push_space();
            }
        }

        self.push_text(&text, glyph.size as f32);
        self.cursor = Some(Cursor {
            y: glyph.y,
            end_x: glyph.x + glyph.advance,
            size: glyph.size,
        });
    }

    fn push_space(&mut self) {
        if let Some(span) = self.span.as_mut() {
            if !span.text.ends_with(' ') {
                span.text.push(' ');
            }
        }
    }

    fn push_text(&mut self, text: &str, size: f32) {
        match self.span.as_mut() {
            Some(span) if (span.size - size).abs() <= SIZE_TOLERANCE => span.text.push_str(text),
            _ => {
                self.close_span();
                self.span = Some(Span {
                    text: text.to_string(),
                    size,
                });
            }
        }
    }

    fn close_span(&mut self) {
        if let Some(span) = self.span.take() {
            if !span.text.trim().is_empty() {
                self.line.spans.push(span);
            }
        }
    }

    fn close_line(&mut self) {
        self.close_span();
        if !self.line.spans.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.block.lines.push(line);
        }
    }

    fn close_block(&mut self) {
        self.close_line();
        if !self.block.lines.is_empty() {
            let block = std::mem::take(&mut self.block);
            self.blocks.push(block);
        }
    }

    fn close_page(&mut self) {
        self.close_block();
        self.cursor = None;
        let blocks = std::mem::take(&mut self.blocks);
        let number = self.page_number.take().unwrap_or(self.pages.len() as u32 + 1);
        debug!("Page {}: {} text blocks", number, blocks.len());
        self.pages.push(Page { number, blocks });
    }

    fn finish(mut self) -> Vec<Page> {
        let pending = self.span.is_some()
            || !self.line.spans.is_empty()
            || !self.block.lines.is_empty()
            || !self.blocks.is_empty();
        if self.page_number.is_some() || pending {
            self.close_page();
        }
        self.pages
    }
}

/// Font size after the text and graphics matrices: the vertical scale of
/// the rendering matrix times the nominal size.
fn rendered_size(trm: &Transform, font_size: f64) -> f64 {
    font_size * trm.m21.hypot(trm.m22)
}

impl OutputDev for LayoutCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.page_number = Some(page_num);
        self.cursor = None;
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.close_page();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        let size = rendered_size(trm, font_size);
        self.push_glyph(Glyph {
            x: trm.m31,
            y: trm.m32,
            advance: width * size,
            size,
            text: char,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        self.run_start = true;
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}
