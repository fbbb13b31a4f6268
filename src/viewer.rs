use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;

use crate::error::Result;

/// An `<iframe>` that embeds the PDF as a base64 data URI.
pub fn pdf_iframe(pdf_bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(pdf_bytes);
    format!(
        r#"<iframe src="data:application/pdf;base64,{}" width="100%" height="800px" type="application/pdf"></iframe>"#,
        encoded
    )
}

/// Write a standalone HTML viewer for `pdf_path` into a temporary file.
///
/// The page is removed when the returned path is dropped.
pub fn write_viewer(pdf_path: &Path) -> Result<TempPath> {
    let bytes = fs::read(pdf_path)?;
    let title = pdf_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body style=\"margin:0\">\n{}\n</body>\n</html>\n",
        html_escape(&title),
        pdf_iframe(&bytes)
    );
    let mut file = tempfile::Builder::new()
        .prefix("voice-pdf-viewer-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
