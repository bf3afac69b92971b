//! End-to-end entry points: run the three stages in order.
//!
//! Stages run strictly one after another and the first failure ends the run:
//! it is logged, reported to the progress callback, and returned. Later
//! stages never see a partial result, so a failed document conversion leaves
//! no image directory behind.
//!
//! Under [`crate::OverwritePolicy::Refuse`] every output of the run is
//! checked before the first stage starts.

use crate::config::RescanConfig;
use crate::error::RescanError;
use crate::output::{RescanOutput, RescanStats, Stage};
use crate::paths;
use crate::pipeline::input::{self, SourceDocument, SourceKind};
use crate::pipeline::{assemble, document, render};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Produce a re-scanned copy of a document.
///
/// # Arguments
/// * `input`  — a word-processor document (`.docx`, `.odt`, …) or a `.pdf`
/// * `config` — run configuration
///
/// # Returns
/// `Ok(RescanOutput)` once every stage has run. `scan_pdf_path` is `None`
/// only when the PDF had no pages to render.
///
/// # Example
/// ```rust,no_run
/// use rescan::{rescan, RescanConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = rescan("contract.docx", &RescanConfig::default()).await?;
/// if let Some(scan) = output.scan_pdf_path {
///     println!("{} pages → {}", output.stats.page_count, scan.display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn rescan(
    input: impl AsRef<Path>,
    config: &RescanConfig,
) -> Result<RescanOutput, RescanError> {
    let total_start = Instant::now();
    let source = input::resolve_input(input)?;
    info!("Starting rescan: {}", source.path.display());

    for output in planned_outputs(&source) {
        config.overwrite.check(&output).map_err(|e| {
            error!("{}", e);
            e
        })?;
    }

    // ── Step 1: Document → PDF ───────────────────────────────────────────
    let doc_start = Instant::now();
    let pdf_path = match source.kind {
        SourceKind::Document => {
            stage_started(config, Stage::Document);
            let pdf = document::convert_docx_to_pdf(&source.path, config)
                .await
                .map_err(|e| stage_failed(config, Stage::Document, e))?;
            stage_completed(config, Stage::Document, &pdf);
            pdf
        }
        SourceKind::Pdf => {
            info!("Input is already a PDF; skipping {}", Stage::Document);
            source.path.clone()
        }
    };
    let document_duration_ms = doc_start.elapsed().as_millis() as u64;

    // ── Step 2: PDF → page images ────────────────────────────────────────
    let render_start = Instant::now();
    let image_dir = paths::image_dir_for(&pdf_path);
    stage_started(config, Stage::Render);
    let image_paths = render::convert_pdf_to_images(&pdf_path, config)
        .await
        .map_err(|e| stage_failed(config, Stage::Render, e))?;
    stage_completed(config, Stage::Render, &image_dir);
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    // ── Step 3: page images → scan PDF ───────────────────────────────────
    let assemble_start = Instant::now();
    let scan_pdf_path = if image_paths.is_empty() {
        warn!("'{}' has no pages; no scan PDF written", pdf_path.display());
        None
    } else {
        stage_started(config, Stage::Assemble);
        let scan = assemble::create_pdf_from_images(image_paths.clone(), &pdf_path, config)
            .await
            .map_err(|e| stage_failed(config, Stage::Assemble, e))?;
        if let Some(ref path) = scan {
            stage_completed(config, Stage::Assemble, path);
        }
        scan
    };
    let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

    if !config.keep_images && scan_pdf_path.is_some() {
        remove_page_images(&image_dir, &image_paths).await;
    }

    let scan_pdf_bytes = match scan_pdf_path {
        Some(ref p) => tokio::fs::metadata(p).await.map(|m| m.len()).unwrap_or(0),
        None => 0,
    };

    let stats = RescanStats {
        page_count: image_paths.len(),
        document_duration_ms,
        render_duration_ms,
        assemble_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        scan_pdf_bytes,
    };

    info!(
        "Rescan complete: {} pages, {}ms total",
        stats.page_count, stats.total_duration_ms
    );

    Ok(RescanOutput {
        source: source.path,
        pdf_path,
        image_dir,
        image_paths,
        scan_pdf_path,
        stats,
    })
}

/// Synchronous wrapper around [`rescan`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn rescan_sync(
    input: impl AsRef<Path>,
    config: &RescanConfig,
) -> Result<RescanOutput, RescanError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RescanError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(rescan(input, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Every path a run will write, in stage order.
fn planned_outputs(source: &SourceDocument) -> Vec<PathBuf> {
    let pdf_path = match source.kind {
        SourceKind::Document => paths::pdf_path_for(&source.path),
        SourceKind::Pdf => source.path.clone(),
    };
    let mut outputs = Vec::with_capacity(3);
    if source.kind == SourceKind::Document {
        outputs.push(pdf_path.clone());
    }
    outputs.push(paths::image_dir_for(&pdf_path));
    outputs.push(paths::scan_pdf_path_for(&pdf_path));
    outputs
}

/// Delete the page images this run wrote, then the directory if that left
/// it empty. Anything else in the directory stays.
async fn remove_page_images(image_dir: &Path, image_paths: &[PathBuf]) {
    for path in image_paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Could not remove '{}': {}", path.display(), e);
        }
    }
    if let Err(e) = tokio::fs::remove_dir(image_dir).await {
        debug!("Keeping '{}': {}", image_dir.display(), e);
    }
}

fn stage_started(config: &RescanConfig, stage: Stage) {
    info!("[{}] starting", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_completed(config: &RescanConfig, stage: Stage, output: &Path) {
    info!("[{}] done → {}", stage, output.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, output);
    }
}

/// Log a stage failure and hand the error back for propagation.
fn stage_failed(config: &RescanConfig, stage: Stage, err: RescanError) -> RescanError {
    error!("[{}] failed: {}", stage, err);
    if err.is_missing_dependency() {
        match stage {
            Stage::Document => warn!("Please ensure LibreOffice is installed and soffice is reachable."),
            _ => warn!("Please ensure the pdfium library is installed or PDFIUM_LIB_PATH is set."),
        }
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_error(stage, &err.to_string());
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(path: &Path, kind: SourceKind) -> SourceDocument {
        SourceDocument {
            path: path.to_path_buf(),
            kind,
        }
    }

    #[test]
    fn planned_outputs_for_document() {
        let outputs = planned_outputs(&source(Path::new("/d/report.docx"), SourceKind::Document));
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("/d/report.pdf"),
                PathBuf::from("/d/report_images"),
                PathBuf::from("/d/scan_report.pdf"),
            ]
        );
    }

    #[test]
    fn planned_outputs_for_pdf_skip_the_input() {
        let outputs = planned_outputs(&source(Path::new("/d/paper.pdf"), SourceKind::Pdf));
        assert_eq!(
            outputs,
            vec![PathBuf::from("/d/paper_images"), PathBuf::from("/d/scan_paper.pdf")]
        );
    }

    #[tokio::test]
    async fn removing_page_images_keeps_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("doc_images");
        std::fs::create_dir(&image_dir).unwrap();
        let pages: Vec<PathBuf> = (1..=2).map(|n| image_dir.join(format!("{n}.jpg"))).collect();
        for p in &pages {
            std::fs::write(p, b"x").unwrap();
        }
        std::fs::write(image_dir.join("notes.txt"), b"mine").unwrap();

        remove_page_images(&image_dir, &pages).await;

        assert!(pages.iter().all(|p| !p.exists()));
        assert_eq!(std::fs::read(image_dir.join("notes.txt")).unwrap(), b"mine");
    }

    #[tokio::test]
    async fn removing_page_images_drops_emptied_dir() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("doc_images");
        std::fs::create_dir(&image_dir).unwrap();
        let page = image_dir.join("1.jpg");
        std::fs::write(&page, b"x").unwrap();

        remove_page_images(&image_dir, &[page]).await;

        assert!(!image_dir.exists());
    }
}
