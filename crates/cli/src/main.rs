//! Command-line interface for document conversion.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_converter_core::{
    docx_html, router, txt_pdf, BatchProcessor, BatchSummary, ConverterConfig, DocumentConverter,
    ImageFormat, TargetFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "doc-converter",
    version,
    about = "Convert documents between PDF, DOCX, PPTX, TXT, HTML and page images"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert PDF pages to JPEG/PNG images
    PdfToImages {
        /// Input PDF file
        input: PathBuf,
        /// Output directory (default: <input>_images next to the input)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Image format: jpeg or png
        #[arg(long, default_value = "jpeg")]
        format: String,
        /// Resolution in DPI
        #[arg(long)]
        dpi: Option<u32>,
        /// First page to convert (1-indexed)
        #[arg(long)]
        first_page: Option<usize>,
        /// Last page to convert (1-indexed)
        #[arg(long)]
        last_page: Option<usize>,
    },
    /// Convert DOCX to PDF via LibreOffice
    DocxToPdf {
        input: PathBuf,
        /// Output PDF path (default: next to the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert PPTX to PDF via LibreOffice
    PptxToPdf {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert plain text to PDF
    TxtToPdf {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert an HTML file or URL to PDF via wkhtmltopdf
    HtmlToPdf {
        /// HTML file path or http(s) URL
        input: String,
        #[arg(long)]
        output: PathBuf,
    },
    /// Convert DOCX to HTML
    DocxToHtml {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Batch convert all matching files in a directory
    Batch {
        /// Directory containing input files
        #[arg(long)]
        input_dir: PathBuf,
        /// Directory for output files
        #[arg(long)]
        output_dir: PathBuf,
        /// Target format: pdf, html, jpeg or png
        #[arg(long, default_value = "pdf")]
        format: String,
        /// Glob patterns to include (default: all supported extensions)
        #[arg(long)]
        patterns: Vec<String>,
        /// Process subdirectories recursively
        #[arg(long)]
        recursive: bool,
        /// Number of parallel workers
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List supported input and output formats
    Formats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::PdfToImages {
            input,
            output_dir,
            format,
            dpi,
            first_page,
            last_page,
        } => pdf_to_images(input, output_dir, &format, dpi, first_page, last_page).await,
        Command::DocxToPdf { input, output } => {
            let converter = build_converter(1)?;
            let produced = converter.docx_to_pdf(&input, output.as_deref()).await?;
            println!("Created PDF: {}", produced.display());
            Ok(())
        }
        Command::PptxToPdf { input, output } => {
            let converter = build_converter(1)?;
            let produced = converter.pptx_to_pdf(&input, output.as_deref()).await?;
            println!("Created PDF: {}", produced.display());
            Ok(())
        }
        Command::TxtToPdf { input, output } => {
            let target = output.unwrap_or_else(|| input.with_extension("pdf"));
            txt_pdf::convert(&input, &target)?;
            println!("Created PDF: {}", target.display());
            Ok(())
        }
        Command::HtmlToPdf { input, output } => {
            let converter = build_converter(1)?;
            converter.html_to_pdf(&input, &output).await?;
            println!("Created PDF: {}", output.display());
            Ok(())
        }
        Command::DocxToHtml { input, output } => {
            let target = output.unwrap_or_else(|| input.with_extension("html"));
            docx_html::convert(&input, &target)?;
            println!("Created HTML: {}", target.display());
            Ok(())
        }
        Command::Batch {
            input_dir,
            output_dir,
            format,
            patterns,
            recursive,
            workers,
            json,
        } => {
            batch_convert(
                input_dir, output_dir, &format, patterns, recursive, workers, json,
            )
            .await
        }
        Command::Formats => {
            let (inputs, outputs) = doc_converter_core::supported_formats();
            println!("Input formats:  {}", inputs.join(", "));
            println!("Output formats: {}", outputs.join(", "));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_converter(max_workers: usize) -> Result<Arc<DocumentConverter>> {
    let config = ConverterConfig {
        batch: doc_converter_core::BatchConfig::with_max_workers(max_workers),
        ..Default::default()
    };
    let converter =
        DocumentConverter::new(config).context("failed to initialize external renderers")?;
    Ok(Arc::new(converter))
}

async fn pdf_to_images(
    input: PathBuf,
    output_dir: Option<PathBuf>,
    format: &str,
    dpi: Option<u32>,
    first_page: Option<usize>,
    last_page: Option<usize>,
) -> Result<()> {
    let target: TargetFormat = format.parse()?;
    let image_format = ImageFormat::try_from(target)?;

    let dir = output_dir.unwrap_or_else(|| {
        let parent = input.parent().unwrap_or_else(|| Path::new("."));
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        router::images_output_dir(parent, stem)
    });

    let converter = build_converter(1)?;
    let outputs = match (first_page, last_page) {
        (None, None) => converter.pdf_to_images(&input, Some(&dir), image_format, dpi)?,
        (first, last) => {
            let count = converter.pdf_page_count(&input)?;
            converter.pdf_page_range_to_images(
                &input,
                &dir,
                image_format,
                first.unwrap_or(1),
                last.unwrap_or(count),
                dpi,
            )?
        }
    };

    println!("Converted {} pages to {}", outputs.len(), dir.display());
    Ok(())
}

async fn batch_convert(
    input_dir: PathBuf,
    output_dir: PathBuf,
    format: &str,
    patterns: Vec<String>,
    recursive: bool,
    workers: usize,
    json: bool,
) -> Result<()> {
    let target: TargetFormat = format.parse()?;
    let converter = build_converter(workers)?;
    let batch = BatchProcessor::new(converter, workers)?;

    let patterns = if patterns.is_empty() {
        None
    } else {
        Some(patterns)
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .context("invalid progress template")?,
    );
    let bar_cb = bar.clone();

    let summary = batch
        .convert_directory_with_progress(
            &input_dir,
            &output_dir,
            target,
            patterns.as_deref(),
            recursive,
            move |done, total, name| {
                bar_cb.set_length(total as u64);
                bar_cb.set_position(done as u64);
                bar_cb.set_message(name.to_string());
            },
        )
        .await?;
    bar.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!("Batch conversion completed:");
    println!("  Total:      {}", summary.total_files);
    println!("  Successful: {}", summary.successful_count());
    println!("  Failed:     {}", summary.failed_count());
    if summary.has_failures() {
        println!("Errors:");
        for failure in &summary.failed {
            println!("  - {}: {}", failure.input_path.display(), failure.error);
        }
    }
}
