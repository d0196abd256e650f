//! Plain-text to PDF conversion using lopdf.
//!
//! Produces US Letter pages of 11pt Courier text. Lines are wrapped at 80
//! columns and characters outside the printable ASCII range are replaced,
//! matching what the standard PDF text encoding can represent without
//! embedding a font.

use crate::error::{ConvertError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
const WRAP_COLUMNS: usize = 80;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Convert a text file to a PDF at `output_path`.
pub fn convert(input_path: &Path, output_path: &Path) -> Result<PathBuf> {
    if !input_path.exists() {
        return Err(ConvertError::InputNotFound(input_path.to_path_buf()));
    }

    debug!("Converting TXT to PDF: {:?}", input_path);

    let text = std::fs::read_to_string(input_path)
        .or_else(|_| {
            // Not valid UTF-8; decode lossily instead of failing the file.
            std::fs::read(input_path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })?;

    let lines = layout_lines(&text);
    let document = build_document(&lines)?;
    write_document(document, output_path)?;

    info!("Created PDF: {:?}", output_path);
    Ok(output_path.to_path_buf())
}

/// Sanitize and wrap input text into printable lines.
fn layout_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let sanitized = sanitize_line(raw);
        if sanitized.is_empty() {
            lines.push(String::new());
            continue;
        }
        let chars: Vec<char> = sanitized.chars().collect();
        for chunk in chars.chunks(WRAP_COLUMNS) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

fn sanitize_line(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if (' '..='~').contains(&c) => c,
            _ => '?',
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn build_document(lines: &[String]) -> Result<Document> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    // An empty input still yields one blank page.
    let empty: &[String] = &[];
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![empty]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let mut kids: Vec<Object> = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let content = page_content(chunk);
        let encoded = content
            .encode()
            .map_err(|e| ConvertError::PdfWriteError(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

fn page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new(
            "Td",
            vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()],
        ),
    ];
    for line in lines {
        if !line.is_empty() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        }
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn write_document(mut doc: Document, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::OutputDirError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    doc.compress();
    doc.save(output_path)
        .map_err(|e| ConvertError::PdfWriteError(e.to_string()))?;
    Ok(())
}
