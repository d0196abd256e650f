//! PDF to image rendering using pdfium (Google's PDF engine).
//!
//! Pages are rendered sequentially (pdfium documents are not thread-safe)
//! and encoded to JPEG or PNG in parallel on a rayon pool. Page files are
//! named `page_NNN.<ext>` with a zero-padded index so lexicographic order
//! equals page order.

use crate::config::RenderConfig;
use crate::error::{ConvertError, Result};
use crate::router::{page_file_name, TargetFormat};
use image::RgbaImage;
use pdfium_render::prelude::*;
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Directories probed for the pdfium library when no explicit directory is
/// configured, before falling back to the system library path.
pub const FALLBACK_PDFIUM_DIRS: &[&str] = &["./", "/usr/lib", "/usr/local/lib"];

/// Page-image output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    fn target(&self) -> TargetFormat {
        match self {
            ImageFormat::Jpeg => TargetFormat::Jpeg,
            ImageFormat::Png => TargetFormat::Png,
        }
    }
}

impl TryFrom<TargetFormat> for ImageFormat {
    type Error = ConvertError;

    fn try_from(target: TargetFormat) -> Result<Self> {
        match target {
            TargetFormat::Jpeg => Ok(ImageFormat::Jpeg),
            TargetFormat::Png => Ok(ImageFormat::Png),
            other => Err(ConvertError::InvalidConfig(format!(
                "{other} is not an image format"
            ))),
        }
    }
}

/// PDF page renderer backed by pdfium.
pub struct PdfImageRenderer {
    config: RenderConfig,
    pdfium: Arc<Pdfium>,
    thread_pool: rayon::ThreadPool,
}

impl PdfImageRenderer {
    /// Create a renderer.
    ///
    /// Fails fast with [`ConvertError::RendererUnavailable`] when the pdfium
    /// library cannot be loaded from the configured directory, the fallback
    /// directories, or the system library path.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;

        let pdfium = Pdfium::new(Self::bind_pdfium(&config)?);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.render_threads)
            .build()
            .map_err(|e| {
                ConvertError::InvalidConfig(format!("failed to create encode pool: {e}"))
            })?;

        info!(
            "PDF renderer initialized with {} threads, {} DPI",
            config.render_threads, config.dpi
        );

        Ok(Self {
            config,
            pdfium: Arc::new(pdfium),
            thread_pool,
        })
    }

    fn bind_pdfium(config: &RenderConfig) -> Result<Box<dyn PdfiumLibraryBindings>> {
        if let Some(ref dir) = config.pdfium_dir {
            return Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .map_err(|_| ConvertError::RendererUnavailable { tool: "pdfium" });
        }

        let mut binding =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                FALLBACK_PDFIUM_DIRS[0],
            ));
        for dir in &FALLBACK_PDFIUM_DIRS[1..] {
            binding = binding.or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(*dir))
            });
        }
        binding
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|_| ConvertError::RendererUnavailable { tool: "pdfium" })
    }

    /// Configured DPI.
    pub fn dpi(&self) -> u32 {
        self.config.dpi
    }

    /// Number of pages in a PDF.
    pub fn page_count(&self, pdf_path: &Path) -> Result<usize> {
        let document = self.load(pdf_path)?;
        Ok(document.pages().len() as usize)
    }

    /// Render every page of a PDF into `output_dir` at the given DPI.
    pub fn render_to_files(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        format: ImageFormat,
        dpi: u32,
    ) -> Result<Vec<PathBuf>> {
        self.render_range(pdf_path, output_dir, format, dpi, None, None)
    }

    /// Render a 1-indexed inclusive page range into `output_dir`.
    ///
    /// `first_page`/`last_page` default to the document bounds. Page numbers
    /// in the output file names refer to positions in the document, so
    /// rendering pages 3..=5 produces `page_003` through `page_005`.
    pub fn render_range(
        &self,
        pdf_path: &Path,
        output_dir: &Path,
        format: ImageFormat,
        dpi: u32,
        first_page: Option<usize>,
        last_page: Option<usize>,
    ) -> Result<Vec<PathBuf>> {
        if !pdf_path.exists() {
            return Err(ConvertError::InputNotFound(pdf_path.to_path_buf()));
        }

        let start = Instant::now();
        std::fs::create_dir_all(output_dir).map_err(|e| ConvertError::OutputDirError {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let document = self.load(pdf_path)?;
        let page_count = document.pages().len() as usize;
        if page_count == 0 {
            return Ok(Vec::new());
        }

        let first = first_page.unwrap_or(1).max(1);
        let last = last_page.unwrap_or(page_count).min(page_count);
        if first > last {
            return Err(ConvertError::InvalidConfig(format!(
                "invalid page range {first}..={last} for a {page_count}-page document"
            )));
        }

        debug!(
            "Rendering pages {}..={} of {:?} at {} DPI",
            first, last, pdf_path, dpi
        );

        // Render sequentially, then encode in parallel.
        let mut raw_pages: Vec<(usize, RgbaImage)> = Vec::with_capacity(last - first + 1);
        for page_number in first..=last {
            let image = self.render_page(&document, page_number, dpi)?;
            raw_pages.push((page_number, image));
        }

        let jpeg_quality = self.config.jpeg_quality;
        let encoded: Vec<Result<PathBuf>> = self.thread_pool.install(|| {
            raw_pages
                .into_par_iter()
                .map(|(page_number, image)| {
                    let path = output_dir.join(page_file_name(page_number, format.target()));
                    write_image(&image, &path, format, jpeg_quality)?;
                    Ok(path)
                })
                .collect()
        });

        let mut paths = Vec::with_capacity(encoded.len());
        for result in encoded {
            paths.push(result?);
        }
        paths.sort();

        info!(
            "Rendered {} pages of {:?} in {:?}",
            paths.len(),
            pdf_path,
            start.elapsed()
        );
        Ok(paths)
    }

    fn load(&self, pdf_path: &Path) -> Result<PdfDocument<'_>> {
        self.pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| ConvertError::PdfRenderError(format!("failed to load PDF: {e}")))
    }

    fn render_page(
        &self,
        document: &PdfDocument,
        page_number: usize,
        dpi: u32,
    ) -> Result<RgbaImage> {
        let page = document
            .pages()
            .get((page_number - 1) as u16)
            .map_err(|e| {
                ConvertError::PdfRenderError(format!("failed to get page {page_number}: {e}"))
            })?;

        // PDF points are 1/72 inch.
        let scale = dpi as f32 / 72.0;
        let width = (page.width().value * scale) as u32;
        let height = (page.height().value * scale) as u32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ConvertError::PdfRenderError(format!("failed to render page {page_number}: {e}"))
        })?;

        let rgba = bitmap.as_image().into_rgba8();
        Ok(flatten_onto_white(rgba))
    }
}

/// Blend transparent regions onto a white background; both JPEG and the
/// printed page expect an opaque image.
fn flatten_onto_white(mut image: RgbaImage) -> RgbaImage {
    for pixel in image.pixels_mut() {
        let alpha = pixel[3] as f32 / 255.0;
        if alpha < 1.0 {
            let inv = 1.0 - alpha;
            pixel[0] = ((pixel[0] as f32 * alpha) + (255.0 * inv)) as u8;
            pixel[1] = ((pixel[1] as f32 * alpha) + (255.0 * inv)) as u8;
            pixel[2] = ((pixel[2] as f32 * alpha) + (255.0 * inv)) as u8;
            pixel[3] = 255;
        }
    }
    image
}

fn write_image(
    image: &RgbaImage,
    path: &Path,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<()> {
    match format {
        ImageFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let file = std::fs::File::create(path).map_err(|e| ConvertError::OutputDirError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let mut writer = std::io::BufWriter::new(file);
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| ConvertError::ImageEncodingError(e.to_string()))?;
        }
        ImageFormat::Png => {
            let data = encode_png(image)?;
            std::fs::write(path, data).map_err(|e| ConvertError::OutputDirError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }
    Ok(())
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);

    let mut writer = encoder
        .write_header()
        .map_err(|e| ConvertError::ImageEncodingError(format!("PNG header: {e}")))?;
    writer
        .write_image_data(image.as_raw())
        .map_err(|e| ConvertError::ImageEncodingError(format!("PNG data: {e}")))?;
    drop(writer);

    Ok(buffer.into_inner())
}
