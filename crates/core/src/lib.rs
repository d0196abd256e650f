//! # doc-converter-core
//!
//! Document conversion between PDF, DOCX, PPTX, TXT, HTML and page images,
//! built around:
//!
//! - **LibreOffice** (headless) for office-document to PDF conversion
//! - **wkhtmltopdf** for HTML to PDF rendering
//! - **pdfium** (Google's PDF engine) for PDF to image rendering
//! - A **parallel batch engine** that discovers files, fans them out across
//!   a bounded worker pool and aggregates per-file outcomes with
//!   thread-safe progress reporting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_converter_core::{BatchProcessor, ConverterConfig, DocumentConverter, TargetFormat};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> doc_converter_core::Result<()> {
//!     let converter = Arc::new(DocumentConverter::new(ConverterConfig::default())?);
//!     let batch = BatchProcessor::new(Arc::clone(&converter), 4)?;
//!
//!     let summary = batch
//!         .convert_directory(
//!             Path::new("./docs"),
//!             Path::new("./converted"),
//!             TargetFormat::Pdf,
//!             None,
//!             true,
//!         )
//!         .await?;
//!
//!     println!(
//!         "{} successful, {} failed",
//!         summary.successful_count(),
//!         summary.failed_count()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Processing with Progress
//!
//! ```rust,no_run
//! use doc_converter_core::{BatchProcessor, ConverterConfig, DocumentConverter, TargetFormat};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> doc_converter_core::Result<()> {
//!     let converter = Arc::new(DocumentConverter::with_defaults()?);
//!     let batch = BatchProcessor::new(converter, 2)?;
//!
//!     let summary = batch
//!         .convert_directory_with_progress(
//!             Path::new("./docs"),
//!             Path::new("./converted"),
//!             TargetFormat::Pdf,
//!             None,
//!             false,
//!             |completed, total, file_name| {
//!                 println!("{completed}/{total}: {file_name}");
//!             },
//!         )
//!         .await?;
//!
//!     for failure in &summary.failed {
//!         eprintln!("{:?}: {}", failure.input_path, failure.error);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod converter;
pub mod discovery;
pub mod docx_html;
pub mod error;
pub mod html_pdf;
pub mod office;
pub mod pdf_images;
pub mod progress;
pub mod router;
pub mod txt_pdf;

// Re-export main types for convenience
pub use batch::{run_tasks, BatchProcessor};
pub use config::{
    BatchConfig, BatchSummary, ConversionTask, ConverterConfig, FailedFile, FileResult,
    HtmlPdfConfig, OfficeConfig, OutputKind, RenderConfig,
};
pub use converter::{supported_formats, DocumentConverter};
pub use discovery::{discover, DEFAULT_PATTERNS};
pub use error::{ConvertError, Result};
pub use html_pdf::{HtmlRenderer, HtmlSource};
pub use office::OfficeRenderer;
pub use pdf_images::{ImageFormat, PdfImageRenderer};
pub use progress::{ProgressFn, ProgressState};
pub use router::{route, Cardinality, Operation, TargetFormat};

/// Input extensions the batch engine knows how to route.
pub const SUPPORTED_INPUT_EXTENSIONS: &[&str] = &["pdf", "docx", "pptx", "txt", "html"];

/// Check if an input extension is supported by any conversion path.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_INPUT_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_extension() {
        assert!(is_supported_extension("docx"));
        assert!(is_supported_extension("PDF"));
        assert!(is_supported_extension("pptx"));
        assert!(!is_supported_extension("xlsx"));
        assert!(!is_supported_extension(""));
    }
}
