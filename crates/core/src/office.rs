//! LibreOffice renderer pool for office-document to PDF conversion.
//!
//! Each instance gets its own user profile directory, which LibreOffice
//! requires for true parallel execution. Conversions run one-shot through
//! `soffice --headless --convert-to pdf` into a unique scratch directory and
//! the produced PDF is moved to the caller's requested output path.

use crate::config::OfficeConfig;
use crate::error::{ConvertError, Result};
use async_process::Command;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Locations probed when no explicit soffice path is configured, before
/// falling back to a PATH lookup.
pub const FALLBACK_SOFFICE_PATHS: &[&str] = &[
    "/usr/bin/soffice",
    "/usr/lib/libreoffice/program/soffice",
    "/opt/libreoffice/program/soffice",
    "/snap/bin/libreoffice.soffice",
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
];

/// A single LibreOffice instance in the pool.
struct OfficeInstance {
    /// Instance ID for logging.
    id: usize,
    /// Unique user profile directory.
    profile_dir: TempDir,
    /// Whether this instance is currently processing.
    busy: AtomicBool,
    /// Documents processed by this instance.
    docs_processed: AtomicU32,
}

impl OfficeInstance {
    fn new(id: usize) -> Result<Self> {
        let profile_dir = TempDir::with_prefix(format!("soffice-profile-{}-", id))?;
        debug!(
            "Created LibreOffice instance {} with profile at {:?}",
            id,
            profile_dir.path()
        );
        Ok(Self {
            id,
            profile_dir,
            busy: AtomicBool::new(false),
            docs_processed: AtomicU32::new(0),
        })
    }

    fn profile_path(&self) -> &Path {
        self.profile_dir.path()
    }
}

impl std::fmt::Debug for OfficeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfficeInstance")
            .field("id", &self.id)
            .field("busy", &self.busy.load(Ordering::SeqCst))
            .field("docs_processed", &self.docs_processed.load(Ordering::SeqCst))
            .finish()
    }
}

/// Pool of LibreOffice instances for parallel document to PDF conversion.
#[derive(Debug)]
pub struct OfficeRenderer {
    config: OfficeConfig,
    soffice_path: PathBuf,
    instances: Vec<Arc<OfficeInstance>>,
    semaphore: Arc<Semaphore>,
    /// Scratch directory holding per-conversion output subdirectories.
    scratch_dir: TempDir,
    total_processed: AtomicUsize,
}

impl OfficeRenderer {
    /// Create a renderer pool.
    ///
    /// Fails fast with [`ConvertError::RendererUnavailable`] when the soffice
    /// binary cannot be located.
    pub fn new(config: OfficeConfig) -> Result<Self> {
        config.validate()?;

        let soffice_path = Self::find_soffice(&config)?;
        info!("Found LibreOffice at: {:?}", soffice_path);

        let mut instances = Vec::with_capacity(config.pool_size);
        for i in 0..config.pool_size {
            instances.push(Arc::new(OfficeInstance::new(i)?));
        }

        let scratch_dir = match &config.temp_dir {
            Some(dir) => TempDir::with_prefix_in("doc-converter-office-", dir)?,
            None => TempDir::with_prefix("doc-converter-office-")?,
        };

        info!(
            "LibreOffice pool initialized with {} instances",
            config.pool_size
        );

        let pool_size = config.pool_size;
        Ok(Self {
            config,
            soffice_path,
            instances,
            semaphore: Arc::new(Semaphore::new(pool_size)),
            scratch_dir,
            total_processed: AtomicUsize::new(0),
        })
    }

    /// Locate the soffice binary: explicit config path, then the fallback
    /// list, then PATH.
    fn find_soffice(config: &OfficeConfig) -> Result<PathBuf> {
        if let Some(ref path) = config.soffice_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ConvertError::RendererUnavailable { tool: "LibreOffice" });
        }

        for candidate in FALLBACK_SOFFICE_PATHS {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        which::which("soffice")
            .or_else(|_| which::which("libreoffice"))
            .map_err(|_| ConvertError::RendererUnavailable { tool: "LibreOffice" })
    }

    /// Convert an office document (DOCX, PPTX, ...) to PDF at `output_path`.
    pub async fn to_pdf(&self, input_path: &Path, output_path: &Path) -> Result<PathBuf> {
        if !input_path.exists() {
            return Err(ConvertError::InputNotFound(input_path.to_path_buf()));
        }

        let _permit = self.semaphore.acquire().await.map_err(|_| {
            ConvertError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: "renderer pool shut down".to_string(),
            }
        })?;

        let instance = self.claim_instance().ok_or_else(|| {
            ConvertError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: "no idle renderer instance".to_string(),
            }
        })?;

        let result = self.run_conversion(&instance, input_path, output_path).await;
        instance.busy.store(false, Ordering::SeqCst);
        result
    }

    /// Claim an idle instance. The semaphore permit held by the caller
    /// guarantees one exists.
    fn claim_instance(&self) -> Option<Arc<OfficeInstance>> {
        for instance in &self.instances {
            if instance
                .busy
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Some(Arc::clone(instance));
            }
        }
        None
    }

    async fn run_conversion(
        &self,
        instance: &Arc<OfficeInstance>,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf> {
        let start = Instant::now();

        debug!(
            "Instance {} converting {:?}",
            instance.id,
            input_path.file_name()
        );

        let scratch = self.scratch_dir.path().join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&scratch).map_err(|e| ConvertError::OutputDirError {
            path: scratch.clone(),
            message: e.to_string(),
        })?;

        let mut cmd = Command::new(&self.soffice_path);
        cmd.args([
            "--headless",
            "--invisible",
            "--nologo",
            "--nofirststartwizard",
            "--norestore",
        ]);
        // Unique user profile, required for parallel instances.
        cmd.arg(format!(
            "-env:UserInstallation=file://{}",
            instance.profile_path().display()
        ));
        cmd.args(["--convert-to", "pdf", "--outdir"]);
        cmd.arg(&scratch);
        cmd.arg(input_path);

        let output = timeout(self.config.conversion_timeout, cmd.output())
            .await
            .map_err(|_| ConvertError::Timeout {
                path: input_path.to_path_buf(),
                timeout_secs: self.config.conversion_timeout.as_secs(),
            })?
            .map_err(ConvertError::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "LibreOffice conversion failed for {:?}: {}",
                input_path, stderr
            );
            let _ = std::fs::remove_dir_all(&scratch);
            return Err(ConvertError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: stderr.trim().to_string(),
            });
        }

        let produced = Self::locate_pdf(&scratch, input_path).ok_or_else(|| {
            let _ = std::fs::remove_dir_all(&scratch);
            ConvertError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: "PDF output file not found".to_string(),
            }
        })?;

        Self::move_into_place(&produced, output_path)?;
        let _ = std::fs::remove_dir_all(&scratch);

        instance.docs_processed.fetch_add(1, Ordering::SeqCst);
        self.total_processed.fetch_add(1, Ordering::SeqCst);

        debug!(
            "Instance {} converted {:?} in {:?}",
            instance.id,
            input_path.file_name(),
            start.elapsed()
        );

        Ok(output_path.to_path_buf())
    }

    /// Find the PDF that LibreOffice wrote: `<stem>.pdf` first, then any
    /// `.pdf` in the scratch directory (LibreOffice occasionally normalizes
    /// the name).
    fn locate_pdf(scratch: &Path, input_path: &Path) -> Option<PathBuf> {
        let stem = input_path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        let expected = scratch.join(format!("{}.pdf", stem));
        if expected.exists() {
            return Some(expected);
        }

        std::fs::read_dir(scratch).ok().and_then(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .find(|p| p.extension().map(|ext| ext == "pdf").unwrap_or(false))
        })
    }

    fn move_into_place(produced: &Path, output_path: &Path) -> Result<PathBuf> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConvertError::OutputDirError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        // rename fails across filesystems; fall back to copy + remove.
        if std::fs::rename(produced, output_path).is_err() {
            std::fs::copy(produced, output_path).map_err(|e| ConvertError::OutputDirError {
                path: output_path.to_path_buf(),
                message: e.to_string(),
            })?;
            if let Err(e) = std::fs::remove_file(produced) {
                warn!("Failed to remove scratch PDF {:?}: {}", produced, e);
            }
        }
        Ok(output_path.to_path_buf())
    }

    /// Total documents converted by this pool.
    pub fn total_processed(&self) -> usize {
        self.total_processed.load(Ordering::SeqCst)
    }

    /// Configured pool size.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }
}
