//! Paragraph and heading extraction from PDF documents.
//!
//! Documents are parsed with `lopdf` and laid out through `pdf_extract`,
//! which handles font encodings, ToUnicode maps and Form XObjects.

pub mod layout;

use lopdf::Document;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::ExtractSettings;
use crate::error::Result;
use crate::mindmap::generate_mindmap;
use crate::models::Extraction;
use layout::Page;

/// A parsed PDF, kept only long enough to run both extraction passes.
pub struct PdfDocument {
    pages: Vec<Page>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        let pages = layout::load_pages(&doc)?;
        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Blocks whose joined text is longer than `min_chars`, in page then block order.
    pub fn paragraphs(&self, min_chars: usize) -> Vec<String> {
        self.pages
            .iter()
            .flat_map(|page| &page.blocks)
            .map(|block| block.joined_text())
            .filter(|text| text.chars().count() > min_chars)
            .collect()
    }

    /// Short spans set in a font larger than `min_font_size`.
    pub fn headings(&self, min_font_size: f32, max_words: usize) -> BTreeSet<String> {
        self.pages
            .iter()
            .flat_map(|page| &page.blocks)
            .flat_map(|block| block.spans())
            .filter(|span| span.size > min_font_size)
            .map(|span| span.text.trim())
            .filter(|text| !text.is_empty() && text.split_whitespace().count() <= max_words)
            .map(str::to_string)
            .collect()
    }

    pub fn extraction(&self, settings: &ExtractSettings) -> Extraction {
        let headings: Vec<String> = self
            .headings(settings.heading_min_font_size, settings.heading_max_words)
            .into_iter()
            .collect();
        Extraction {
            paragraphs: self.paragraphs(settings.paragraph_min_chars),
            mind_map: generate_mindmap(headings.iter().cloned()),
            headings,
        }
    }
}

pub fn extract_text(path: &Path) -> Result<Vec<String>> {
    let settings = ExtractSettings::default();
    Ok(PdfDocument::open(path)?.paragraphs(settings.paragraph_min_chars))
}

pub fn extract_headings(path: &Path) -> Result<BTreeSet<String>> {
    let settings = ExtractSettings::default();
    Ok(PdfDocument::open(path)?
        .headings(settings.heading_min_font_size, settings.heading_max_words))
}

/// Parse once and produce paragraphs, sorted headings and the mind-map.
pub fn extract(path: &Path, settings: &ExtractSettings) -> Result<Extraction> {
    let document = PdfDocument::open(path)?;
    let extraction = document.extraction(settings);
    info!(
        "Extracted {} paragraphs and {} headings from {} pages of {}",
        extraction.paragraphs.len(),
        extraction.headings.len(),
        document.pages().len(),
        path.display()
    );
    Ok(extraction)
}
