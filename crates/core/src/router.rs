//! Routing of (input extension, target format) pairs to conversion operations.
//!
//! This is a pure lookup with no I/O: the batch engine asks the router which
//! external collaborator handles a file and whether the operation produces a
//! single output file or a page-indexed set.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Pdf,
    Html,
    Jpeg,
    Png,
}

impl TargetFormat {
    /// File extension used for outputs of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Pdf => "pdf",
            TargetFormat::Html => "html",
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
        }
    }

    /// True for the page-image formats.
    pub fn is_image(&self) -> bool {
        matches!(self, TargetFormat::Jpeg | TargetFormat::Png)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(TargetFormat::Pdf),
            "html" => Ok(TargetFormat::Html),
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            other => Err(ConvertError::InvalidConfig(format!(
                "unsupported target format: {other}"
            ))),
        }
    }
}

/// How many output files an operation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One output file.
    Single,
    /// One output file per PDF page.
    Multiple,
}

/// A conversion operation, naming the external collaborator that performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// DOCX/PPTX to PDF via the LibreOffice renderer.
    OfficeToPdf,
    /// Plain text to PDF via the PDF writer.
    TxtToPdf,
    /// HTML file (or URL) to PDF via wkhtmltopdf.
    HtmlToPdf,
    /// DOCX to HTML via the DOCX parser.
    DocxToHtml,
    /// PDF pages to JPEG/PNG images via pdfium.
    PdfToImages,
}

impl Operation {
    /// Output cardinality of this operation.
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Operation::PdfToImages => Cardinality::Multiple,
            _ => Cardinality::Single,
        }
    }
}

/// Select the operation for an (input extension, target format) pair.
///
/// Extensions are matched case-insensitively. Pairs outside the supported
/// table fail with [`ConvertError::UnsupportedConversion`].
pub fn route(input_ext: &str, target: TargetFormat) -> Result<Operation> {
    let ext = input_ext.to_ascii_lowercase();
    match (ext.as_str(), target) {
        ("docx", TargetFormat::Pdf) => Ok(Operation::OfficeToPdf),
        ("pptx", TargetFormat::Pdf) => Ok(Operation::OfficeToPdf),
        ("txt", TargetFormat::Pdf) => Ok(Operation::TxtToPdf),
        ("html", TargetFormat::Pdf) => Ok(Operation::HtmlToPdf),
        ("docx", TargetFormat::Html) => Ok(Operation::DocxToHtml),
        ("pdf", TargetFormat::Jpeg) | ("pdf", TargetFormat::Png) => Ok(Operation::PdfToImages),
        _ => Err(ConvertError::UnsupportedConversion {
            input_ext: ext,
            target: target.to_string(),
        }),
    }
}

/// Extension of a path, lowercased, or an empty string.
pub fn input_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Output path for a single-file conversion: `<output_dir>/<stem>.<ext>`.
pub fn single_output_path(output_dir: &Path, stem: &str, target: TargetFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", stem, target.extension()))
}

/// Per-input subdirectory for multi-image conversions: `<output_dir>/<stem>_images`.
pub fn images_output_dir(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{}_images", stem))
}

/// Page file name with a zero-padded index so lexicographic order equals
/// page order: `page_001.jpeg`, `page_002.jpeg`, ...
pub fn page_file_name(page_number: usize, target: TargetFormat) -> String {
    format!("page_{:03}.{}", page_number, target.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_office_documents_to_pdf() {
        assert_eq!(route("docx", TargetFormat::Pdf).unwrap(), Operation::OfficeToPdf);
        assert_eq!(route("pptx", TargetFormat::Pdf).unwrap(), Operation::OfficeToPdf);
        assert_eq!(route("DOCX", TargetFormat::Pdf).unwrap(), Operation::OfficeToPdf);
    }

    #[test]
    fn test_route_txt_and_html_to_pdf() {
        assert_eq!(route("txt", TargetFormat::Pdf).unwrap(), Operation::TxtToPdf);
        assert_eq!(route("html", TargetFormat::Pdf).unwrap(), Operation::HtmlToPdf);
    }

    #[test]
    fn test_route_docx_to_html() {
        assert_eq!(route("docx", TargetFormat::Html).unwrap(), Operation::DocxToHtml);
    }

    #[test]
    fn test_route_pdf_to_images_is_multiple() {
        let op = route("pdf", TargetFormat::Jpeg).unwrap();
        assert_eq!(op, Operation::PdfToImages);
        assert_eq!(op.cardinality(), Cardinality::Multiple);

        let op = route("pdf", TargetFormat::Png).unwrap();
        assert_eq!(op.cardinality(), Cardinality::Multiple);
    }

    #[test]
    fn test_route_single_cardinality() {
        assert_eq!(
            route("docx", TargetFormat::Pdf).unwrap().cardinality(),
            Cardinality::Single
        );
    }

    #[test]
    fn test_route_unsupported_pairs() {
        assert!(matches!(
            route("docx", TargetFormat::Jpeg),
            Err(ConvertError::UnsupportedConversion { .. })
        ));
        assert!(matches!(
            route("pdf", TargetFormat::Pdf),
            Err(ConvertError::UnsupportedConversion { .. })
        ));
        assert!(matches!(
            route("pptx", TargetFormat::Html),
            Err(ConvertError::UnsupportedConversion { .. })
        ));
        assert!(matches!(
            route("xyz", TargetFormat::Pdf),
            Err(ConvertError::UnsupportedConversion { .. })
        ));
    }

    #[test]
    fn test_target_format_from_str() {
        assert_eq!("pdf".parse::<TargetFormat>().unwrap(), TargetFormat::Pdf);
        assert_eq!("JPEG".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);
        assert_eq!("jpg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);
        assert!("tiff".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn test_target_format_display() {
        assert_eq!(TargetFormat::Pdf.to_string(), "pdf");
        assert_eq!(TargetFormat::Jpeg.to_string(), "jpeg");
    }

    #[test]
    fn test_input_extension() {
        assert_eq!(input_extension(Path::new("a/b/Report.DOCX")), "docx");
        assert_eq!(input_extension(Path::new("noext")), "");
    }

    #[test]
    fn test_single_output_path() {
        let path = single_output_path(Path::new("/out"), "report", TargetFormat::Pdf);
        assert_eq!(path, PathBuf::from("/out/report.pdf"));
    }

    #[test]
    fn test_images_output_dir() {
        let dir = images_output_dir(Path::new("/out"), "report");
        assert_eq!(dir, PathBuf::from("/out/report_images"));
    }

    #[test]
    fn test_page_file_name_zero_padded() {
        assert_eq!(page_file_name(1, TargetFormat::Jpeg), "page_001.jpeg");
        assert_eq!(page_file_name(12, TargetFormat::Jpeg), "page_012.jpeg");
        assert_eq!(page_file_name(123, TargetFormat::Png), "page_123.png");
    }

    #[test]
    fn test_page_file_names_sort_in_page_order() {
        let mut names: Vec<String> = (1..=12)
            .map(|n| page_file_name(n, TargetFormat::Jpeg))
            .collect();
        let ordered = names.clone();
        names.sort();
        assert_eq!(names, ordered);
    }
}
