//! Error types for document conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the doc-converter library.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input directory for a batch run does not exist.
    #[error("Input directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Invalid configuration (bad worker count, bad format, bad pattern).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No conversion path exists for this (input extension, target) pair.
    #[error("Unsupported conversion: {input_ext} -> {target}")]
    UnsupportedConversion { input_ext: String, target: String },

    /// An external rendering tool is not installed or could not be located.
    #[error("{tool} not found. Install it and ensure it is on PATH, or set an explicit path in the configuration")]
    RendererUnavailable { tool: &'static str },

    /// An external tool exited non-zero or produced no output.
    #[error("Conversion failed for '{path}': {message}")]
    ConversionFailed { path: PathBuf, message: String },

    /// An external tool exceeded its time budget.
    #[error("Conversion timed out after {timeout_secs} seconds for '{path}'")]
    Timeout { path: PathBuf, timeout_secs: u64 },

    /// Input file not found.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Output directory or file could not be created.
    #[error("Failed to write output '{path}': {message}")]
    OutputDirError { path: PathBuf, message: String },

    /// PDF rendering failed.
    #[error("PDF rendering failed: {0}")]
    PdfRenderError(String),

    /// PDF generation failed.
    #[error("PDF generation failed: {0}")]
    PdfWriteError(String),

    /// Image encoding failed.
    #[error("Image encoding failed: {0}")]
    ImageEncodingError(String),

    /// DOCX file could not be parsed.
    #[error("Failed to parse DOCX '{path}': {message}")]
    DocxParseError { path: PathBuf, message: String },

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConvertError>;
