//! HTML to PDF conversion via wkhtmltopdf.

use crate::config::HtmlPdfConfig;
use crate::error::{ConvertError, Result};
use async_process::Command;
use std::path::{Path, PathBuf};
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Locations probed when no explicit wkhtmltopdf path is configured, before
/// falling back to a PATH lookup.
pub const FALLBACK_WKHTMLTOPDF_PATHS: &[&str] =
    &["/usr/bin/wkhtmltopdf", "/usr/local/bin/wkhtmltopdf"];

/// Input to an HTML conversion: a local file or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlSource {
    File(PathBuf),
    Url(String),
}

impl HtmlSource {
    /// Interpret a string as a URL when it carries an http(s) scheme,
    /// otherwise as a file path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            HtmlSource::Url(source.to_string())
        } else {
            HtmlSource::File(PathBuf::from(source))
        }
    }

    fn as_arg(&self) -> std::ffi::OsString {
        match self {
            HtmlSource::File(path) => path.clone().into_os_string(),
            HtmlSource::Url(url) => url.clone().into(),
        }
    }
}

/// wkhtmltopdf-backed HTML renderer.
#[derive(Debug)]
pub struct HtmlRenderer {
    config: HtmlPdfConfig,
    binary: PathBuf,
}

impl HtmlRenderer {
    /// Create a renderer.
    ///
    /// Fails fast with [`ConvertError::RendererUnavailable`] when the
    /// wkhtmltopdf binary cannot be located.
    pub fn new(config: HtmlPdfConfig) -> Result<Self> {
        config.validate()?;
        let binary = Self::find_wkhtmltopdf(&config)?;
        info!("Found wkhtmltopdf at: {:?}", binary);
        Ok(Self { config, binary })
    }

    fn find_wkhtmltopdf(config: &HtmlPdfConfig) -> Result<PathBuf> {
        if let Some(ref path) = config.wkhtmltopdf_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ConvertError::RendererUnavailable { tool: "wkhtmltopdf" });
        }

        for candidate in FALLBACK_WKHTMLTOPDF_PATHS {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        which::which("wkhtmltopdf")
            .map_err(|_| ConvertError::RendererUnavailable { tool: "wkhtmltopdf" })
    }

    /// Convert an HTML file or URL to a PDF at `output_path`.
    pub async fn convert(&self, source: &HtmlSource, output_path: &Path) -> Result<PathBuf> {
        if let HtmlSource::File(path) = source {
            if !path.exists() {
                return Err(ConvertError::InputNotFound(path.clone()));
            }
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConvertError::OutputDirError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        debug!("Converting HTML to PDF: {:?} -> {:?}", source, output_path);

        let mut cmd = Command::new(&self.binary);
        cmd.args(["--page-size", &self.config.page_size]);
        cmd.args(["--margin-top", &self.config.margin_top]);
        cmd.args(["--margin-right", &self.config.margin_right]);
        cmd.args(["--margin-bottom", &self.config.margin_bottom]);
        cmd.args(["--margin-left", &self.config.margin_left]);
        cmd.args(["--encoding", &self.config.encoding]);
        cmd.args(["--quiet", "--no-outline", "--enable-local-file-access"]);
        cmd.arg(source.as_arg());
        cmd.arg(output_path);

        let source_path = match source {
            HtmlSource::File(path) => path.clone(),
            HtmlSource::Url(url) => PathBuf::from(url),
        };

        let output = timeout(self.config.conversion_timeout, cmd.output())
            .await
            .map_err(|_| ConvertError::Timeout {
                path: source_path.clone(),
                timeout_secs: self.config.conversion_timeout.as_secs(),
            })?
            .map_err(ConvertError::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("wkhtmltopdf failed for {:?}: {}", source, stderr);
            return Err(ConvertError::ConversionFailed {
                path: source_path,
                message: stderr.trim().to_string(),
            });
        }

        if !output_path.exists() {
            return Err(ConvertError::ConversionFailed {
                path: source_path,
                message: "PDF was not created".to_string(),
            });
        }

        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_source_parse_url() {
        assert_eq!(
            HtmlSource::parse("https://example.com/page"),
            HtmlSource::Url("https://example.com/page".to_string())
        );
        assert_eq!(
            HtmlSource::parse("http://example.com"),
            HtmlSource::Url("http://example.com".to_string())
        );
    }

    #[test]
    fn test_html_source_parse_file() {
        assert_eq!(
            HtmlSource::parse("page.html"),
            HtmlSource::File(PathBuf::from("page.html"))
        );
        assert_eq!(
            HtmlSource::parse("/var/www/index.html"),
            HtmlSource::File(PathBuf::from("/var/www/index.html"))
        );
    }

    #[test]
    fn test_find_wkhtmltopdf_with_explicit_nonexistent_path() {
        let config =
            HtmlPdfConfig::default().wkhtmltopdf_path(PathBuf::from("/nonexistent/wkhtmltopdf"));
        let result = HtmlRenderer::find_wkhtmltopdf(&config);
        assert!(matches!(
            result,
            Err(ConvertError::RendererUnavailable { tool: "wkhtmltopdf" })
        ));
    }

    #[test]
    fn test_find_wkhtmltopdf_with_explicit_valid_path() {
        let current_exe = std::env::current_exe().unwrap();
        let config = HtmlPdfConfig::default().wkhtmltopdf_path(current_exe.clone());
        assert_eq!(
            HtmlRenderer::find_wkhtmltopdf(&config).unwrap(),
            current_exe
        );
    }

    #[tokio::test]
    async fn test_convert_missing_input_file() {
        let config =
            HtmlPdfConfig::default().wkhtmltopdf_path(std::env::current_exe().unwrap());
        let renderer = HtmlRenderer::new(config).unwrap();
        let source = HtmlSource::File(PathBuf::from("/missing/page.html"));
        let result = renderer.convert(&source, Path::new("/tmp/out.pdf")).await;
        assert!(matches!(result, Err(ConvertError::InputNotFound(_))));
    }
}
