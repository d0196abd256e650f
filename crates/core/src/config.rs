//! Configuration, task and result types for document conversion.

use crate::router::TargetFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the LibreOffice renderer pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficeConfig {
    /// Number of LibreOffice instances in the pool.
    /// Default: number of CPU cores.
    pub pool_size: usize,

    /// Timeout for individual document conversions.
    /// Default: 300 seconds.
    pub conversion_timeout: Duration,

    /// Path to the soffice binary. If None, a fallback list and PATH are searched.
    pub soffice_path: Option<PathBuf>,

    /// Directory for scratch files. Default: system temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get(),
            conversion_timeout: Duration::from_secs(300),
            soffice_path: None,
            temp_dir: None,
        }
    }
}

impl OfficeConfig {
    /// Create an office config with the given pool size.
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    /// Set the conversion timeout.
    pub fn conversion_timeout(mut self, timeout: Duration) -> Self {
        self.conversion_timeout = timeout;
        self
    }

    /// Set the soffice binary path.
    pub fn soffice_path(mut self, path: PathBuf) -> Self {
        self.soffice_path = Some(path);
        self
    }

    /// Set the scratch directory.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.pool_size == 0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.conversion_timeout.as_secs() == 0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "conversion_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the wkhtmltopdf renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlPdfConfig {
    /// Path to the wkhtmltopdf binary. If None, a fallback list and PATH are searched.
    pub wkhtmltopdf_path: Option<PathBuf>,

    /// Timeout for individual conversions.
    /// Default: 300 seconds.
    pub conversion_timeout: Duration,

    /// Page size passed to wkhtmltopdf. Default: "A4".
    pub page_size: String,

    /// Page margins (top, right, bottom, left). Default: "0.75in" each.
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,

    /// Document encoding. Default: "UTF-8".
    pub encoding: String,
}

impl Default for HtmlPdfConfig {
    fn default() -> Self {
        Self {
            wkhtmltopdf_path: None,
            conversion_timeout: Duration::from_secs(300),
            page_size: "A4".to_string(),
            margin_top: "0.75in".to_string(),
            margin_right: "0.75in".to_string(),
            margin_bottom: "0.75in".to_string(),
            margin_left: "0.75in".to_string(),
            encoding: "UTF-8".to_string(),
        }
    }
}

impl HtmlPdfConfig {
    /// Set the wkhtmltopdf binary path.
    pub fn wkhtmltopdf_path(mut self, path: PathBuf) -> Self {
        self.wkhtmltopdf_path = Some(path);
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, size: impl Into<String>) -> Self {
        self.page_size = size.into();
        self
    }

    /// Set all four page margins at once.
    pub fn margins(mut self, margin: impl Into<String>) -> Self {
        let margin = margin.into();
        self.margin_top = margin.clone();
        self.margin_right = margin.clone();
        self.margin_bottom = margin.clone();
        self.margin_left = margin;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.conversion_timeout.as_secs() == 0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "conversion_timeout must be greater than 0".to_string(),
            ));
        }
        if self.page_size.is_empty() {
            return Err(crate::error::ConvertError::InvalidConfig(
                "page_size must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for PDF to image rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output resolution in DPI. Default: 200.
    pub dpi: u32,

    /// Number of threads for parallel page encoding.
    /// Default: number of CPU cores.
    pub render_threads: usize,

    /// JPEG quality (1-100). Default: 95.
    pub jpeg_quality: u8,

    /// Directory containing the pdfium library. If None, a fallback list and
    /// the system library path are searched.
    pub pdfium_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            render_threads: num_cpus::get(),
            jpeg_quality: 95,
            pdfium_dir: None,
        }
    }
}

impl RenderConfig {
    /// Create a render config with the given DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }

    /// Set the number of encoding threads.
    pub fn render_threads(mut self, threads: usize) -> Self {
        self.render_threads = threads;
        self
    }

    /// Set the JPEG quality.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.dpi == 0 || self.dpi > 1200 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "dpi must be between 1 and 1200".to_string(),
            ));
        }
        if self.render_threads == 0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "render_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the batch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of files converted concurrently. Default: 4.
    pub max_workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

impl BatchConfig {
    /// Create a batch config with the given worker count.
    pub fn with_max_workers(max_workers: usize) -> Self {
        Self { max_workers }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_workers == 0 {
            return Err(crate::error::ConvertError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Combined configuration for the converter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// LibreOffice pool configuration.
    pub office: OfficeConfig,

    /// wkhtmltopdf configuration.
    pub html: HtmlPdfConfig,

    /// PDF to image render configuration.
    pub render: RenderConfig,

    /// Batch engine configuration.
    pub batch: BatchConfig,
}

impl ConverterConfig {
    /// Create a converter config with the given worker count and DPI.
    pub fn new(max_workers: usize, dpi: u32) -> Self {
        Self {
            batch: BatchConfig::with_max_workers(max_workers),
            render: RenderConfig::with_dpi(dpi),
            ..Default::default()
        }
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.office.validate()?;
        self.html.validate()?;
        self.render.validate()?;
        self.batch.validate()?;
        Ok(())
    }
}

/// One file's conversion request, consumed exactly once by a worker.
#[derive(Debug, Clone)]
pub struct ConversionTask {
    /// Path to the input document.
    pub input_path: PathBuf,

    /// Directory to write output into.
    pub output_dir: PathBuf,

    /// Requested target format.
    pub target: TargetFormat,
}

impl ConversionTask {
    /// Create a new conversion task.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        target: TargetFormat,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            target,
        }
    }

    /// File name of the input, for progress display.
    pub fn file_name(&self) -> String {
        self.input_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// File stem of the input, used for output naming.
    pub fn file_stem(&self) -> String {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string()
    }
}

/// Whether a conversion produced one output file or a page-indexed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// One output file.
    SingleFile,
    /// One output file per PDF page.
    MultipleImages,
}

/// Result for a single successfully converted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Original input path.
    pub input_path: PathBuf,

    /// Output paths; exactly one for `SingleFile`, one per page otherwise.
    pub outputs: Vec<PathBuf>,

    /// Target format of the conversion.
    pub target: TargetFormat,

    /// Output cardinality.
    pub kind: OutputKind,
}

/// Information about a failed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    /// Original input path.
    pub input_path: PathBuf,

    /// Error message.
    pub error: String,
}

/// Result of a batch conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of files submitted to the pool.
    pub total_files: usize,

    /// Successfully converted files, in completion order.
    pub successful: Vec<FileResult>,

    /// Failed conversions, in completion order.
    pub failed: Vec<FailedFile>,

    /// Total processing time.
    pub total_duration: Duration,
}

impl BatchSummary {
    /// An empty summary for a batch that found nothing to do.
    pub fn empty() -> Self {
        Self {
            total_files: 0,
            successful: Vec::new(),
            failed: Vec::new(),
            total_duration: Duration::ZERO,
        }
    }

    /// Number of successful conversions.
    pub fn successful_count(&self) -> usize {
        self.successful.len()
    }

    /// Number of failed conversions.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// True when at least one conversion failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // OfficeConfig tests
    #[test]
    fn test_office_config_defaults() {
        let config = OfficeConfig::default();
        assert!(config.pool_size > 0);
        assert_eq!(config.conversion_timeout.as_secs(), 300);
        assert!(config.soffice_path.is_none());
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn test_office_config_builder_pattern() {
        let config = OfficeConfig::with_pool_size(4)
            .conversion_timeout(Duration::from_secs(60))
            .soffice_path(PathBuf::from("/opt/soffice"));
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.conversion_timeout.as_secs(), 60);
        assert_eq!(config.soffice_path, Some(PathBuf::from("/opt/soffice")));
    }

    #[test]
    fn test_office_config_validation_zero_pool_size() {
        let mut config = OfficeConfig::default();
        config.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_office_config_validation_zero_timeout() {
        let mut config = OfficeConfig::default();
        config.conversion_timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }

    // HtmlPdfConfig tests
    #[test]
    fn test_html_pdf_config_defaults() {
        let config = HtmlPdfConfig::default();
        assert_eq!(config.page_size, "A4");
        assert_eq!(config.margin_top, "0.75in");
        assert_eq!(config.margin_left, "0.75in");
        assert_eq!(config.encoding, "UTF-8");
    }

    #[test]
    fn test_html_pdf_config_margins() {
        let config = HtmlPdfConfig::default().margins("1in");
        assert_eq!(config.margin_top, "1in");
        assert_eq!(config.margin_right, "1in");
        assert_eq!(config.margin_bottom, "1in");
        assert_eq!(config.margin_left, "1in");
    }

    #[test]
    fn test_html_pdf_config_validation_empty_page_size() {
        let mut config = HtmlPdfConfig::default();
        config.page_size = String::new();
        assert!(config.validate().is_err());
    }

    // RenderConfig tests
    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.dpi, 200);
        assert!(config.render_threads > 0);
        assert_eq!(config.jpeg_quality, 95);
    }

    #[test]
    fn test_render_config_jpeg_quality_clamped() {
        let config = RenderConfig::default().jpeg_quality(250);
        assert_eq!(config.jpeg_quality, 100);
        let config = RenderConfig::default().jpeg_quality(0);
        assert_eq!(config.jpeg_quality, 1);
    }

    #[test]
    fn test_render_config_validation_zero_dpi() {
        let mut config = RenderConfig::default();
        config.dpi = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_render_config_validation_excessive_dpi() {
        let mut config = RenderConfig::default();
        config.dpi = 1201;
        assert!(config.validate().is_err());
    }

    // BatchConfig tests
    #[test]
    fn test_batch_config_default_workers() {
        assert_eq!(BatchConfig::default().max_workers, 4);
    }

    #[test]
    fn test_batch_config_validation_zero_workers() {
        let config = BatchConfig::with_max_workers(0);
        assert!(config.validate().is_err());
    }

    // ConverterConfig tests
    #[test]
    fn test_converter_config_new() {
        let config = ConverterConfig::new(8, 300);
        assert_eq!(config.batch.max_workers, 8);
        assert_eq!(config.render.dpi, 300);
    }

    #[test]
    fn test_converter_config_validate_propagates() {
        let mut config = ConverterConfig::default();
        config.batch.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config2 = ConverterConfig::default();
        config2.render.dpi = 0;
        assert!(config2.validate().is_err());
    }

    // ConversionTask tests
    #[test]
    fn test_conversion_task_new() {
        let task = ConversionTask::new("input.docx", "/output", TargetFormat::Pdf);
        assert_eq!(task.input_path, PathBuf::from("input.docx"));
        assert_eq!(task.output_dir, PathBuf::from("/output"));
        assert_eq!(task.target, TargetFormat::Pdf);
    }

    #[test]
    fn test_conversion_task_file_name_and_stem() {
        let task = ConversionTask::new("path/to/report.docx", "/out", TargetFormat::Pdf);
        assert_eq!(task.file_name(), "report.docx");
        assert_eq!(task.file_stem(), "report");
    }

    // BatchSummary tests
    #[test]
    fn test_batch_summary_empty() {
        let summary = BatchSummary::empty();
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.successful_count(), 0);
        assert_eq!(summary.failed_count(), 0);
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_batch_summary_counts() {
        let summary = BatchSummary {
            total_files: 2,
            successful: vec![FileResult {
                input_path: PathBuf::from("a.docx"),
                outputs: vec![PathBuf::from("a.pdf")],
                target: TargetFormat::Pdf,
                kind: OutputKind::SingleFile,
            }],
            failed: vec![FailedFile {
                input_path: PathBuf::from("b.docx"),
                error: "boom".to_string(),
            }],
            total_duration: Duration::from_millis(10),
        };
        assert_eq!(summary.successful_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert!(summary.has_failures());
        assert_eq!(
            summary.successful_count() + summary.failed_count(),
            summary.total_files
        );
    }
}
