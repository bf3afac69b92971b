//! Document → PDF: hand the source to LibreOffice in headless mode.
//!
//! `soffice --convert-to pdf --outdir <dir>` writes `<dir>/<stem>.pdf`, which
//! is exactly [`crate::paths::pdf_path_for`] when `<dir>` is the source's
//! parent. The converter is a black box: we only check that it started,
//! exited zero within the timeout, and left the expected file behind.
//!
//! LibreOffice refuses to start a second instance on the same user profile,
//! so each call gets a throwaway profile in a [`TempDir`]. That also keeps a
//! user's desktop session from swallowing the conversion request.

use crate::config::RescanConfig;
use crate::error::RescanError;
use crate::paths;
use crate::pipeline::input::{self, SourceKind};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Convert a word-processor document to a sibling PDF with the same stem.
///
/// # Returns
/// The path of the generated PDF.
///
/// # Errors
/// - [`RescanError::UnsupportedInput`] when `source` is itself a PDF; its
///   derived PDF path would be the source
/// - [`RescanError::OutputExists`] when the PDF exists and the overwrite
///   policy is `Refuse`
/// - [`RescanError::ConverterNotFound`] when `soffice` cannot be started
/// - [`RescanError::ConverterFailed`] on a non-zero exit
/// - [`RescanError::ConverterTimeout`] when the timeout elapses
/// - [`RescanError::ConverterNoOutput`] when the PDF did not appear
pub async fn convert_docx_to_pdf(
    source: &Path,
    config: &RescanConfig,
) -> Result<PathBuf, RescanError> {
    let pdf_path = paths::pdf_path_for(source);
    if input::classify(source) == Some(SourceKind::Pdf) || pdf_path == source {
        return Err(RescanError::UnsupportedInput {
            path: source.to_path_buf(),
        });
    }
    config.overwrite.check(&pdf_path)?;

    // A leftover PDF from an earlier run would mask a converter that exits 0
    // without writing anything.
    if pdf_path.exists() {
        tokio::fs::remove_file(&pdf_path)
            .await
            .map_err(|e| RescanError::OutputWriteFailed {
                path: pdf_path.clone(),
                source: e,
            })?;
    }

    let out_dir = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let profile = TempDir::new()
        .map_err(|e| RescanError::Internal(format!("Failed to create soffice profile dir: {e}")))?;

    let program = config.soffice_program.as_str();
    let mut cmd = Command::new(program);
    cmd.arg("--headless")
        .arg("--norestore")
        .arg(format!(
            "-env:UserInstallation={}",
            file_url(profile.path())
        ))
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(&out_dir)
        .arg(source)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    info!(
        "Converting '{}' to PDF with {}…",
        source.display(),
        program
    );

    let secs = config.converter_timeout_secs;
    let output = match tokio::time::timeout(Duration::from_secs(secs), cmd.output()).await {
        Err(_) => {
            return Err(RescanError::ConverterTimeout {
                program: program.to_string(),
                secs,
            })
        }
        Ok(Err(e)) => {
            return Err(RescanError::ConverterNotFound {
                program: program.to_string(),
                reason: e.to_string(),
            })
        }
        Ok(Ok(output)) => output,
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        debug!("soffice: {}", stdout.trim());
    }

    if !output.status.success() {
        return Err(RescanError::ConverterFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    if !pdf_path.is_file() {
        return Err(RescanError::ConverterNoOutput { expected: pdf_path });
    }

    info!("Document converted: '{}'", pdf_path.display());
    Ok(pdf_path)
}

/// `file://` URL for a local directory, as `-env:UserInstallation` expects.
fn file_url(path: &Path) -> String {
    let s = path
        .to_string_lossy()
        .replace('\\', "/")
        .replace(' ', "%20");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverwritePolicy;

    fn fake_docx(dir: &Path) -> PathBuf {
        let p = dir.join("memo.docx");
        std::fs::write(&p, b"PK\x03\x04").unwrap();
        p
    }

    #[test]
    fn file_url_unix_and_windows() {
        assert_eq!(file_url(Path::new("/tmp/prof")), "file:///tmp/prof");
        assert_eq!(
            file_url(Path::new(r"C:\Users\Ann Lee\prof")),
            "file:///C:/Users/Ann%20Lee/prof"
        );
    }

    #[tokio::test]
    async fn missing_program_is_converter_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let src = fake_docx(dir.path());
        let config = RescanConfig::builder()
            .soffice_program("definitely-not-a-real-soffice-binary")
            .build()
            .unwrap();

        let err = convert_docx_to_pdf(&src, &config).await.unwrap_err();
        assert!(matches!(err, RescanError::ConverterNotFound { .. }), "{err}");
        assert!(!dir.path().join("memo.pdf").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_converter_failed() {
        let dir = tempfile::tempdir().unwrap();
        let src = fake_docx(dir.path());
        let config = RescanConfig::builder()
            .soffice_program("false")
            .build()
            .unwrap();

        let err = convert_docx_to_pdf(&src, &config).await.unwrap_err();
        assert!(matches!(err, RescanError::ConverterFailed { .. }), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn success_without_pdf_is_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = fake_docx(dir.path());
        // A stale PDF must not be mistaken for fresh output.
        std::fs::write(dir.path().join("memo.pdf"), b"%PDF-old").unwrap();
        let config = RescanConfig::builder()
            .soffice_program("true")
            .build()
            .unwrap();

        let err = convert_docx_to_pdf(&src, &config).await.unwrap_err();
        match err {
            RescanError::ConverterNoOutput { expected } => {
                assert_eq!(expected, dir.path().join("memo.pdf"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pdf_source_is_rejected_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let config = RescanConfig::builder()
            .soffice_program("true")
            .build()
            .unwrap();

        for name in ["paper.pdf", "PAPER.PDF"] {
            let src = dir.path().join(name);
            std::fs::write(&src, b"%PDF-1.7").unwrap();

            let err = convert_docx_to_pdf(&src, &config).await.unwrap_err();
            assert!(matches!(err, RescanError::UnsupportedInput { .. }), "{err}");
            assert_eq!(std::fs::read(&src).unwrap(), b"%PDF-1.7");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_converter_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let src = fake_docx(dir.path());
        let script = dir.path().join("slow-soffice.sh");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let config = RescanConfig::builder()
            .soffice_program(script.to_string_lossy())
            .converter_timeout_secs(1)
            .build()
            .unwrap();

        let started = std::time::Instant::now();
        let err = convert_docx_to_pdf(&src, &config).await.unwrap_err();

        match err {
            RescanError::ConverterTimeout { secs, .. } => assert_eq!(secs, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!dir.path().join("memo.pdf").exists());
    }

    #[tokio::test]
    async fn refuse_policy_keeps_existing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let src = fake_docx(dir.path());
        let existing = dir.path().join("memo.pdf");
        std::fs::write(&existing, b"%PDF-keep").unwrap();
        let config = RescanConfig::builder()
            .overwrite(OverwritePolicy::Refuse)
            .build()
            .unwrap();

        let err = convert_docx_to_pdf(&src, &config).await.unwrap_err();
        assert!(matches!(err, RescanError::OutputExists { .. }));
        assert_eq!(std::fs::read(&existing).unwrap(), b"%PDF-keep");
    }
}
