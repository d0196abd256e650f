//! DOCX to HTML conversion.
//!
//! Extracts paragraph text from the document body and emits a minimal,
//! correctly escaped HTML page. Styling, tables and embedded media are not
//! carried over.

use crate::error::{ConvertError, Result};
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Convert a DOCX file to an HTML file at `output_path`.
pub fn convert(input_path: &Path, output_path: &Path) -> Result<PathBuf> {
    if !input_path.exists() {
        return Err(ConvertError::InputNotFound(input_path.to_path_buf()));
    }

    debug!("Converting DOCX to HTML: {:?}", input_path);

    let bytes = std::fs::read(input_path)?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ConvertError::DocxParseError {
        path: input_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut body = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            body.push_str("<p>");
            body.push_str(&escape_html(&paragraph_text(paragraph)));
            body.push_str("</p>\n");
        }
    }

    let title = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        body
    );

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::OutputDirError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    std::fs::write(output_path, html)?;

    info!("Created HTML: {:?}", output_path);
    Ok(output_path.to_path_buf())
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push(' '),
                    _ => {}
                }
            }
        }
    }
    text
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
