mod common;

use std::collections::BTreeSet;
use tempfile::TempDir;

use common::{
    block, show, write_pdf_pages, write_pdf_with_font, write_sample_pdf, FontKind, LONG_HEADING,
    RUST_PARAGRAPH, WEATHER_PARAGRAPH,
};
use lopdf::content::Operation;
use lopdf::Object;
use voice_pdf_assistant::config::ExtractSettings;
use voice_pdf_assistant::extract::PdfDocument;
use voice_pdf_assistant::{extract, extract_headings, extract_text};

#[test]
fn test_paragraphs_keep_long_blocks_in_document_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.pdf");
    write_sample_pdf(&path);

    let paragraphs = extract_text(&path).unwrap();
    assert_eq!(
        paragraphs,
        vec![
            RUST_PARAGRAPH.to_string(),
            LONG_HEADING.to_string(),
            WEATHER_PARAGRAPH.to_string()
        ]
    );
    assert!(paragraphs.iter().all(|p| p.chars().count() > 40));
    assert!(paragraphs.iter().all(|p| p.trim() == p));
}

#[test]
fn test_headings_are_large_short_and_unique() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.pdf");
    write_sample_pdf(&path);

    let headings = extract_headings(&path).unwrap();
    let expected: BTreeSet<String> = ["Introduction", "Methods", "Results"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(headings, expected);
    assert!(!headings.contains("Exactly Fourteen"));
    assert!(!headings.contains(LONG_HEADING));
}

#[test]
fn test_extraction_json_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.pdf");
    write_sample_pdf(&path);

    let extraction = extract(&path, &ExtractSettings::default()).unwrap();
    let json = serde_json::to_value(&extraction).unwrap();
    assert_eq!(
        json["headings"],
        serde_json::json!(["Introduction", "Methods", "Results"])
    );
    assert_eq!(
        json["mind_map"],
        serde_json::json!({
            "Root": [{"Introduction": []}, {"Methods": []}, {"Results": []}]
        })
    );
    assert_eq!(json["paragraphs"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_thresholds_follow_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.pdf");
    write_sample_pdf(&path);

    let document = PdfDocument::open(&path).unwrap();
    assert_eq!(document.pages().len(), 2);

    let settings = ExtractSettings {
        paragraph_min_chars: 10,
        heading_min_font_size: 13.0,
        heading_max_words: 20,
    };
    let extraction = document.extraction(&settings);
    assert!(extraction.paragraphs.contains(&"Too short to keep.".to_string()));
    assert!(extraction.headings.contains(&"Exactly Fourteen".to_string()));
    assert!(extraction.headings.contains(&LONG_HEADING.to_string()));
    assert_eq!(extraction.mind_map.len(), extraction.headings.len());
}

const TYPOGRAPHIC_PARAGRAPH: &str =
    "R\u{e9}sum\u{e9} of the design: \u{201C}layered\u{201D} caching \u{2014} the cache\u{2019}s eviction runs hourly.";

fn headings(expected: &[&str]) -> BTreeSet<String> {
    expected.iter().map(|h| h.to_string()).collect()
}

#[test]
fn test_composite_font_text_is_mapped_through_to_unicode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("type0.pdf");
    write_pdf_with_font(
        &path,
        FontKind::Type0,
        &[vec![
            block(24, &["Overview"]),
            block(11, &["Identity-H text reaches the paragraph list intact here."]),
            block(11, &[TYPOGRAPHIC_PARAGRAPH]),
        ]],
    );

    let extraction = extract(&path, &ExtractSettings::default()).unwrap();
    assert_eq!(
        extraction.paragraphs,
        vec![
            "Identity-H text reaches the paragraph list intact here.".to_string(),
            TYPOGRAPHIC_PARAGRAPH.to_string(),
        ]
    );
    assert_eq!(extraction.headings, vec!["Overview".to_string()]);
}

#[test]
fn test_win_ansi_punctuation_is_decoded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("winansi.pdf");
    write_pdf_with_font(
        &path,
        FontKind::WinAnsi,
        &[vec![
            block(16, &["\u{201C}Quoted\u{201D} \u{2014} dash"]),
            block(11, &["The author\u{2019}s note \u{2013} kept with its curly quotes and dashes."]),
        ]],
    );

    let extraction = extract(&path, &ExtractSettings::default()).unwrap();
    assert_eq!(
        extraction.headings,
        vec!["\u{201C}Quoted\u{201D} \u{2014} dash".to_string()]
    );
    assert_eq!(
        extraction.paragraphs,
        vec!["The author\u{2019}s note \u{2013} kept with its curly quotes and dashes.".to_string()]
    );
}

#[test]
fn test_heading_size_includes_text_and_graphics_scaling() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scaled.pdf");
    let font = FontKind::WinAnsi;
    let operations = vec![
        // 1pt font drawn through a 20x text matrix
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 1.into()]),
        Operation::new(
            "Tm",
            vec![20.into(), 0.into(), 0.into(), 20.into(), 72.into(), 700.into()],
        ),
        Operation::new("Tj", vec![show(font, "Scaled")]),
        Operation::new("ET", vec![]),
        // 9pt font inside a doubled graphics state
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()],
        ),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 9.into()]),
        Operation::new("Td", vec![36.into(), 250.into()]),
        Operation::new("Tj", vec![show(font, "Doubled")]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
        // plain 9pt text stays body text
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 9.into()]),
        Operation::new("Td", vec![72.into(), 200.into()]),
        Operation::new("Tj", vec![show(font, "Small")]),
        Operation::new("ET", vec![]),
    ];
    write_pdf_pages(&path, font, vec![operations], Vec::new());

    assert_eq!(extract_headings(&path).unwrap(), headings(&["Doubled", "Scaled"]));
}

#[test]
fn test_form_xobject_text_is_extracted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("form.pdf");
    let font = FontKind::WinAnsi;
    let form = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 16.into()]),
        Operation::new("Td", vec![72.into(), 600.into()]),
        Operation::new("Tj", vec![show(font, "Appendix")]),
        Operation::new("ET", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 11.into()]),
        Operation::new("Td", vec![72.into(), 500.into()]),
        Operation::new("Tj", vec![show(font, WEATHER_PARAGRAPH)]),
        Operation::new("ET", vec![]),
    ];
    let page = vec![
        Operation::new("q", vec![]),
        Operation::new("Do", vec![Object::Name(b"Fm1".to_vec())]),
        Operation::new("Q", vec![]),
    ];
    write_pdf_pages(&path, font, vec![page], vec![("Fm1", form)]);

    let extraction = extract(&path, &ExtractSettings::default()).unwrap();
    assert_eq!(extraction.headings, vec!["Appendix".to_string()]);
    assert_eq!(extraction.paragraphs, vec![WEATHER_PARAGRAPH.to_string()]);
}
