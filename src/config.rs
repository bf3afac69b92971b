//! Configuration types for a rescan run.
//!
//! Every knob lives in [`RescanConfig`], built via [`RescanConfigBuilder`].
//! Setters clamp obviously out-of-range values; [`RescanConfigBuilder::build`]
//! rejects the ones that cannot be clamped sensibly.

use crate::error::RescanError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one rescan run.
///
/// # Example
/// ```rust
/// use rescan::{OverwritePolicy, RescanConfig};
///
/// let config = RescanConfig::builder()
///     .dpi(300)
///     .jpeg_quality(85)
///     .overwrite(OverwritePolicy::Refuse)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct RescanConfig {
    /// Rasterisation resolution. Range: 72–600. Default: 200.
    ///
    /// Also used to size the pages of the re-assembled PDF, so a page comes
    /// back at its original physical size unless `max_rendered_pixels` capped
    /// its render; a capped page comes back proportionally smaller.
    pub dpi: u32,

    /// Cap on the longest edge of a rendered page, in pixels.
    /// Range: 100–65535. Default: 6000.
    ///
    /// Keeps poster-sized pages from allocating gigabytes at high DPI.
    pub max_rendered_pixels: u32,

    /// JPEG quality for page images. Range: 1–100. Default: 75.
    pub jpeg_quality: u8,

    /// LibreOffice executable used for document → PDF conversion.
    pub soffice_program: String,

    /// Upper bound on one document → PDF conversion. Default: 120 s.
    pub converter_timeout_secs: u64,

    /// User password for encrypted PDF inputs.
    pub password: Option<String>,

    /// pdfium shared library (file or containing directory).
    /// If None, the system library search path is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// What to do when an output of this run already exists.
    pub overwrite: OverwritePolicy,

    /// Keep the `<stem>_images` directory after the scan PDF is written.
    /// Default: true.
    pub keep_images: bool,

    /// Optional stage/page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RescanConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 6000,
            jpeg_quality: 75,
            soffice_program: default_soffice_program(),
            converter_timeout_secs: 120,
            password: None,
            pdfium_library_path: None,
            overwrite: OverwritePolicy::default(),
            keep_images: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RescanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RescanConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("soffice_program", &self.soffice_program)
            .field("converter_timeout_secs", &self.converter_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("overwrite", &self.overwrite)
            .field("keep_images", &self.keep_images)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RescanProgressCallback>"),
            )
            .finish()
    }
}

impl RescanConfig {
    /// Create a new builder for `RescanConfig`.
    pub fn builder() -> RescanConfigBuilder {
        RescanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RescanConfig`].
#[derive(Debug)]
pub struct RescanConfigBuilder {
    config: RescanConfig,
}

impl RescanConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(100, 65_535);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn soffice_program(mut self, program: impl Into<String>) -> Self {
        self.config.soffice_program = program.into();
        self
    }

    pub fn converter_timeout_secs(mut self, secs: u64) -> Self {
        self.config.converter_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.config.overwrite = policy;
        self
    }

    pub fn keep_images(mut self, keep: bool) -> Self {
        self.config.keep_images = keep;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RescanConfig, RescanError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(RescanError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(RescanError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.converter_timeout_secs == 0 {
            return Err(RescanError::InvalidConfig(
                "Converter timeout must be ≥ 1 second".into(),
            ));
        }
        if c.soffice_program.trim().is_empty() {
            return Err(RescanError::InvalidConfig(
                "soffice program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Behaviour when a run finds its own outputs from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverwritePolicy {
    /// Replace the PDF, page images and scan PDF in place. (default)
    #[default]
    Overwrite,
    /// Fail with [`RescanError::OutputExists`] before writing anything.
    Refuse,
}

impl OverwritePolicy {
    /// Check `path` against the policy.
    pub fn check(self, path: &Path) -> Result<(), RescanError> {
        match self {
            OverwritePolicy::Refuse if path.exists() => Err(RescanError::OutputExists {
                path: path.to_path_buf(),
            }),
            _ => Ok(()),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Locate LibreOffice's `soffice`.
///
/// Application bundles on macOS and the default Windows install directory are
/// not on `PATH`; anywhere else `soffice` is expected to be.
pub fn default_soffice_program() -> String {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &["/Applications/LibreOffice.app/Contents/MacOS/soffice"]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\LibreOffice\program\soffice.exe",
            r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
        ]
    } else {
        &[]
    };

    candidates
        .iter()
        .find(|p| Path::new(**p).is_file())
        .map(|p| p.to_string())
        .unwrap_or_else(|| "soffice".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = RescanConfig::builder().build().unwrap();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.jpeg_quality, 75);
        assert_eq!(c.overwrite, OverwritePolicy::Overwrite);
        assert!(c.keep_images);
        assert!(!c.soffice_program.is_empty());
    }

    #[test]
    fn setters_clamp() {
        let c = RescanConfig::builder()
            .dpi(10_000)
            .jpeg_quality(0)
            .max_rendered_pixels(1)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 600);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_rendered_pixels, 100);

        let c = RescanConfig::builder()
            .max_rendered_pixels(u32::MAX)
            .build()
            .unwrap();
        assert_eq!(c.max_rendered_pixels, 65_535);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = RescanConfig::builder()
            .converter_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, RescanError::InvalidConfig(_)));
    }

    #[test]
    fn empty_program_is_rejected() {
        let err = RescanConfig::builder()
            .soffice_program("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("soffice"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = RescanConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn refuse_policy_rejects_existing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("out.pdf");
        std::fs::write(&existing, b"x").unwrap();
        let missing = dir.path().join("none.pdf");

        assert!(OverwritePolicy::Refuse.check(&missing).is_ok());
        assert!(matches!(
            OverwritePolicy::Refuse.check(&existing),
            Err(RescanError::OutputExists { .. })
        ));
        assert!(OverwritePolicy::Overwrite.check(&existing).is_ok());
    }
}
