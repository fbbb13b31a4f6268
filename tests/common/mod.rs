#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::Path;

/// How page text is encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontKind {
    /// Standard Helvetica with WinAnsiEncoding, one byte per character.
    WinAnsi,
    /// Type0 composite font, Identity-H two-byte codes mapped through a
    /// ToUnicode CMap. Codes are glyph-id-like and never equal the text bytes.
    Type0,
}

/// One text object: every line is set in the same font size.
pub struct TextBlock {
    pub size: i64,
    pub lines: Vec<&'static str>,
}

pub fn block(size: i64, lines: &[&'static str]) -> TextBlock {
    TextBlock {
        size,
        lines: lines.to_vec(),
    }
}

const WIN_ANSI_EXTRAS: &[(char, u8)] = &[
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
];

const TYPE0_EXTRAS: &[char] = &['\u{2019}', '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}', '\u{e9}'];

fn type0_code(c: char) -> u16 {
    match c {
        ' '..='~' => c as u16 - 0x1D,
        _ => TYPE0_EXTRAS
            .iter()
            .position(|extra| *extra == c)
            .map(|i| 0x0100 + i as u16)
            .expect("character without a Type0 code"),
    }
}

/// Encode `text` as a string operand for the given font.
pub fn show(font: FontKind, text: &str) -> Object {
    match font {
        FontKind::WinAnsi => {
            let bytes = text
                .chars()
                .map(|c| {
                    if c.is_ascii() {
                        c as u8
                    } else {
                        WIN_ANSI_EXTRAS
                            .iter()
                            .find(|(extra, _)| *extra == c)
                            .map(|(_, byte)| *byte)
                            .expect("character outside WinAnsiEncoding")
                    }
                })
                .collect();
            Object::String(bytes, StringFormat::Literal)
        }
        FontKind::Type0 => {
            let bytes = text
                .chars()
                .flat_map(|c| type0_code(c).to_be_bytes())
                .collect();
            Object::String(bytes, StringFormat::Hexadecimal)
        }
    }
}

/// Content operations for a column of text blocks, top to bottom.
pub fn text_operations(font: FontKind, blocks: &[TextBlock]) -> Vec<Operation> {
    let mut operations = Vec::new();
    let mut y = 780.0_f32;
    for text_block in blocks {
        let leading = text_block.size as f32 * 1.2;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Integer(text_block.size)],
        ));
        operations.push(Operation::new("TL", vec![Object::Real(leading)]));
        operations.push(Operation::new(
            "Td",
            vec![Object::Integer(72), Object::Real(y)],
        ));
        for (i, line) in text_block.lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![show(font, line)]));
        }
        operations.push(Operation::new("ET", vec![]));
        y -= leading * (text_block.lines.len() as f32 - 1.0) + 60.0;
    }
    operations
}

fn to_unicode_cmap() -> Vec<u8> {
    let mut entries: Vec<(u16, char)> = (' '..='~').map(|c| (type0_code(c), c)).collect();
    entries.extend(TYPE0_EXTRAS.iter().map(|c| (type0_code(*c), *c)));

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (code, c) in chunk {
            cmap.push_str(&format!("<{:04X}> <{:04X}>\n", code, *c as u32));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap.into_bytes()
}

fn add_font(doc: &mut Document, font: FontKind) -> ObjectId {
    match font {
        FontKind::WinAnsi => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        }),
        FontKind::Type0 => {
            let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap()));
            let descendant_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "BaseFont" => "NotoSans-Regular",
                "CIDSystemInfo" => dictionary! {
                    "Registry" => Object::string_literal("Adobe"),
                    "Ordering" => Object::string_literal("Identity"),
                    "Supplement" => 0,
                },
                "DW" => 600,
            });
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "NotoSans-Regular",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![descendant_id.into()],
                "ToUnicode" => to_unicode_id,
            })
        }
    }
}

/// Write a PDF whose pages run the given operations. `forms` become Form
/// XObjects that any page can paint with `/<name> Do`.
pub fn write_pdf_pages(
    path: &Path,
    font: FontKind,
    pages: Vec<Vec<Operation>>,
    forms: Vec<(&str, Vec<Operation>)>,
) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = add_font(&mut doc, font);

    let mut xobjects = lopdf::Dictionary::new();
    for (name, operations) in forms {
        let content = Content { operations };
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            },
            content.encode().expect("encode form"),
        ));
        xobjects.set(name, form_id);
    }

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects.clone(),
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save pdf");
}

pub fn write_pdf(path: &Path, pages: &[Vec<TextBlock>]) {
    write_pdf_with_font(path, FontKind::WinAnsi, pages);
}

pub fn write_pdf_with_font(path: &Path, font: FontKind, pages: &[Vec<TextBlock>]) {
    let pages = pages
        .iter()
        .map(|blocks| text_operations(font, blocks))
        .collect();
    write_pdf_pages(path, font, pages, Vec::new());
}

pub const RUST_PARAGRAPH: &str =
    "Rust is a systems programming language that guarantees memory safety without garbage collection.";
pub const LONG_HEADING: &str =
    "This heading line has far too many words to count as a real heading";
pub const WEATHER_PARAGRAPH: &str =
    "The weather is nice today and birds are singing in the trees outside.";

/// Two pages: three distinct headings (one repeated), three paragraphs,
/// one short block and one size-14 span that is not a heading.
pub fn write_sample_pdf(path: &Path) {
    write_pdf(
        path,
        &[
            vec![
                block(24, &["Introduction"]),
                block(
                    11,
                    &[
                        "Rust is a systems programming language that",
                        "guarantees memory safety without garbage collection.",
                    ],
                ),
                block(11, &["Too short to keep."]),
                block(18, &[LONG_HEADING]),
                block(16, &["Methods"]),
            ],
            vec![
                block(24, &["Introduction"]),
                block(16, &["Results"]),
                block(11, &[WEATHER_PARAGRAPH]),
                block(14, &["Exactly Fourteen"]),
            ],
        ],
    );
}
