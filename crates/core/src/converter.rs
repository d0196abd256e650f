//! High-level document converter tying the external collaborators together.
//!
//! One `DocumentConverter` owns the LibreOffice pool, the wkhtmltopdf
//! renderer and the pdfium image renderer, and dispatches each conversion
//! task to the right one via the router.

use crate::config::{ConversionTask, ConverterConfig, FileResult, OutputKind};
use crate::docx_html;
use crate::error::{ConvertError, Result};
use crate::html_pdf::{HtmlRenderer, HtmlSource};
use crate::office::OfficeRenderer;
use crate::pdf_images::{ImageFormat, PdfImageRenderer};
use crate::router::{self, Operation};
use crate::txt_pdf;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main entry point for single-file conversions.
///
/// Construction is fail-fast: all three external renderers must be locatable
/// or [`ConvertError::RendererUnavailable`] is returned, rather than
/// degrading silently at conversion time.
pub struct DocumentConverter {
    office: OfficeRenderer,
    html: HtmlRenderer,
    images: PdfImageRenderer,
    config: ConverterConfig,
}

impl DocumentConverter {
    /// Create a converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing converter: pool_size={}, dpi={}, max_workers={}",
            config.office.pool_size, config.render.dpi, config.batch.max_workers
        );

        let office = OfficeRenderer::new(config.office.clone())?;
        let html = HtmlRenderer::new(config.html.clone())?;
        let images = PdfImageRenderer::new(config.render.clone())?;

        Ok(Self {
            office,
            html,
            images,
            config,
        })
    }

    /// Create a converter with default settings.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ConverterConfig::default())
    }

    /// Current configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Execute one conversion task: route by extension, run the collaborator,
    /// and describe the produced outputs.
    pub async fn convert_file(&self, task: &ConversionTask) -> Result<FileResult> {
        if !task.input_path.exists() {
            return Err(ConvertError::InputNotFound(task.input_path.clone()));
        }

        let ext = router::input_extension(&task.input_path);
        let operation = router::route(&ext, task.target)?;
        let stem = task.file_stem();

        debug!(
            "Dispatching {:?} -> {} via {:?}",
            task.input_path, task.target, operation
        );

        match operation {
            Operation::PdfToImages => {
                let image_dir = router::images_output_dir(&task.output_dir, &stem);
                let format = ImageFormat::try_from(task.target)?;
                let outputs = self.images.render_to_files(
                    &task.input_path,
                    &image_dir,
                    format,
                    self.config.render.dpi,
                )?;
                Ok(FileResult {
                    input_path: task.input_path.clone(),
                    outputs,
                    target: task.target,
                    kind: OutputKind::MultipleImages,
                })
            }
            single => {
                let output = router::single_output_path(&task.output_dir, &stem, task.target);
                let produced = match single {
                    Operation::OfficeToPdf => {
                        self.office.to_pdf(&task.input_path, &output).await?
                    }
                    Operation::TxtToPdf => txt_pdf::convert(&task.input_path, &output)?,
                    Operation::HtmlToPdf => {
                        let source = HtmlSource::File(task.input_path.clone());
                        self.html.convert(&source, &output).await?
                    }
                    Operation::DocxToHtml => docx_html::convert(&task.input_path, &output)?,
                    Operation::PdfToImages => unreachable!("handled above"),
                };
                Ok(FileResult {
                    input_path: task.input_path.clone(),
                    outputs: vec![produced],
                    target: task.target,
                    kind: OutputKind::SingleFile,
                })
            }
        }
    }

    /// Convert a DOCX file to PDF. With no explicit output path, the PDF is
    /// written next to the input.
    pub async fn docx_to_pdf(
        &self,
        docx_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<PathBuf> {
        let output = default_sibling(docx_path, output_path, "pdf");
        self.office.to_pdf(docx_path, &output).await
    }

    /// Convert a PPTX file to PDF; LibreOffice handles presentations through
    /// the same renderer as word documents.
    pub async fn pptx_to_pdf(
        &self,
        pptx_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<PathBuf> {
        let output = default_sibling(pptx_path, output_path, "pdf");
        self.office.to_pdf(pptx_path, &output).await
    }

    /// Convert a text file to PDF.
    pub fn txt_to_pdf(&self, txt_path: &Path, output_path: Option<&Path>) -> Result<PathBuf> {
        let output = default_sibling(txt_path, output_path, "pdf");
        txt_pdf::convert(txt_path, &output)
    }

    /// Convert an HTML file or URL to PDF.
    pub async fn html_to_pdf(&self, html_source: &str, output_path: &Path) -> Result<PathBuf> {
        let source = HtmlSource::parse(html_source);
        self.html.convert(&source, output_path).await
    }

    /// Convert a DOCX file to HTML.
    pub fn docx_to_html(&self, docx_path: &Path, output_path: Option<&Path>) -> Result<PathBuf> {
        let output = default_sibling(docx_path, output_path, "html");
        docx_html::convert(docx_path, &output)
    }

    /// Convert PDF pages to images. With no explicit output directory, a
    /// `<stem>_images` directory is created next to the input.
    pub fn pdf_to_images(
        &self,
        pdf_path: &Path,
        output_dir: Option<&Path>,
        format: ImageFormat,
        dpi: Option<u32>,
    ) -> Result<Vec<PathBuf>> {
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let parent = pdf_path.parent().unwrap_or_else(|| Path::new("."));
                let stem = pdf_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                router::images_output_dir(parent, stem)
            }
        };
        self.images
            .render_to_files(pdf_path, &dir, format, dpi.unwrap_or(self.config.render.dpi))
    }

    /// Number of pages in a PDF.
    pub fn pdf_page_count(&self, pdf_path: &Path) -> Result<usize> {
        self.images.page_count(pdf_path)
    }

    /// Render a 1-indexed inclusive page range of a PDF to images.
    pub fn pdf_page_range_to_images(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        format: ImageFormat,
        first_page: usize,
        last_page: usize,
        dpi: Option<u32>,
    ) -> Result<Vec<PathBuf>> {
        self.images.render_range(
            pdf_path,
            output_dir,
            format,
            dpi.unwrap_or(self.config.render.dpi),
            Some(first_page),
            Some(last_page),
        )
    }

    /// Total documents processed by the LibreOffice pool.
    pub fn office_documents_processed(&self) -> usize {
        self.office.total_processed()
    }
}

fn default_sibling(input: &Path, output: Option<&Path>, ext: &str) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension(ext),
    }
}

/// Supported input and output formats, for display.
pub fn supported_formats() -> (&'static [&'static str], &'static [&'static str]) {
    (crate::SUPPORTED_INPUT_EXTENSIONS, &["pdf", "html", "jpeg", "png"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sibling_explicit_output() {
        let out = default_sibling(
            Path::new("/in/doc.docx"),
            Some(Path::new("/out/custom.pdf")),
            "pdf",
        );
        assert_eq!(out, PathBuf::from("/out/custom.pdf"));
    }

    #[test]
    fn test_default_sibling_derived_output() {
        let out = default_sibling(Path::new("/in/doc.docx"), None, "pdf");
        assert_eq!(out, PathBuf::from("/in/doc.pdf"));
    }

    #[test]
    fn test_supported_formats() {
        let (inputs, outputs) = supported_formats();
        assert!(inputs.contains(&"docx"));
        assert!(inputs.contains(&"pdf"));
        assert!(outputs.contains(&"jpeg"));
        assert_eq!(inputs.len(), 5);
        assert_eq!(outputs.len(), 4);
    }

    // Construction requires all three renderers; exercised in the guarded
    // integration tests. Here only the fail-fast path is checked.
    #[test]
    fn test_converter_creation_fails_without_soffice() {
        let mut config = ConverterConfig::default();
        config.office.soffice_path = Some(PathBuf::from("/nonexistent/soffice"));
        let result = DocumentConverter::new(config);
        assert!(matches!(
            result,
            Err(ConvertError::RendererUnavailable { tool: "LibreOffice" })
        ));
    }

    #[test]
    fn test_converter_creation_fails_on_invalid_config() {
        let mut config = ConverterConfig::default();
        config.batch.max_workers = 0;
        assert!(matches!(
            DocumentConverter::new(config),
            Err(ConvertError::InvalidConfig(_))
        ));
    }
}
