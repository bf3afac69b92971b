//! CLI binary for rescan.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RescanConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rescan::{rescan, OverwritePolicy, RescanConfig, RescanProgressCallback, Stage};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while a stage has no known length, switched
/// to a page counter once the render stage knows the page count.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn pages_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl RescanProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix(stage.label());
        self.bar.set_message(match stage {
            Stage::Document => "waiting for LibreOffice…",
            Stage::Render => "opening PDF…",
            Stage::Assemble => "packing pages…",
        });
    }

    fn on_render_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_style(Self::pages_style());
        self.bar.reset_eta();
    }

    fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
        self.bar.inc(1);
    }

    fn on_stage_complete(&self, stage: Stage, output: &Path) {
        self.bar.println(format!(
            "  {} {:<11} {}",
            green("✓"),
            stage.label(),
            dim(&output.display().to_string())
        ));
    }

    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.bar.println(format!("  {} {}", red("✗"), stage.label()));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # DOCX → report.pdf → report_images/ → scan_report.pdf
  rescan report.docx

  # Start from an existing PDF (document stage skipped)
  rescan paper.pdf

  # Sharper pages, smaller files
  rescan --dpi 300 --quality 60 thesis.odt

  # Never replace outputs of an earlier run
  rescan --no-clobber report.docx

  # Keep only the final PDF
  rescan --remove-images report.docx

  # Machine-readable result
  rescan --json report.docx > result.json

OUTPUTS (next to the input):
  <stem>.pdf            document converted by LibreOffice
  <stem>_images/N.jpg   one JPEG per page, N = 1, 2, …
  scan_<stem>.pdf       image-only re-scanned PDF

HOST REQUIREMENTS:
  LibreOffice   soffice on PATH, or --soffice / RESCAN_SOFFICE
  pdfium        system library, or --pdfium-lib / PDFIUM_LIB_PATH
                (builds: https://github.com/bblanchon/pdfium-binaries)
"#;

/// Re-scan a document: DOCX → PDF → page JPEGs → image-only PDF.
#[derive(Parser, Debug)]
#[command(
    name = "rescan",
    version,
    about = "Re-scan a document: DOCX → PDF → page JPEGs → image-only PDF",
    long_about = "Convert a word-processor document to PDF with LibreOffice, rasterise \
every page to a numbered JPEG with pdfium, and pack the JPEGs into a new image-only PDF \
named scan_<stem>.pdf. All outputs are written next to the input file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document to re-scan (.docx, .doc, .odt, .rtf, … or .pdf).
    input: PathBuf,

    /// Rasterisation DPI (72–600).
    #[arg(long, env = "RESCAN_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "RESCAN_JPEG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Cap on the longest edge of a rendered page, in pixels.
    #[arg(long, env = "RESCAN_MAX_PIXELS", default_value_t = 6000,
          value_parser = clap::value_parser!(u32).range(100..=65_535))]
    max_pixels: u32,

    /// LibreOffice executable.
    #[arg(long, env = "RESCAN_SOFFICE")]
    soffice: Option<String>,

    /// Document conversion timeout in seconds.
    #[arg(long, env = "RESCAN_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// PDF user password for encrypted inputs.
    #[arg(long, env = "RESCAN_PASSWORD")]
    password: Option<String>,

    /// pdfium shared library, or the directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Fail instead of overwriting outputs of an earlier run.
    #[arg(long, env = "RESCAN_NO_CLOBBER")]
    no_clobber: bool,

    /// Delete the page-image directory once the scan PDF is written.
    #[arg(long, env = "RESCAN_REMOVE_IMAGES")]
    remove_images: bool,

    /// Print the run result as JSON on stdout.
    #[arg(long, env = "RESCAN_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "RESCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RESCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RESCAN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports each stage; library INFO logs would
    // only interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress.clone())?;

    let output = rescan(&cli.input, &config).await;
    if let Some(ref p) = progress {
        p.bar.finish_and_clear();
    }
    let output = output.with_context(|| format!("Failed to re-scan '{}'", cli.input.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    }

    let Some(ref scan) = output.scan_pdf_path else {
        anyhow::bail!(
            "'{}' has no pages; no scan PDF was written",
            output.pdf_path.display()
        );
    };

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            output.stats.page_count,
            output.stats.total_duration_ms,
            bold(&scan.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "document {}ms / render {}ms / assemble {}ms / {} bytes",
                output.stats.document_duration_ms,
                output.stats.render_duration_ms,
                output.stats.assemble_duration_ms,
                output.stats.scan_pdf_bytes,
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `RescanConfig`.
fn build_config(cli: &Cli, progress: Option<Arc<CliProgressCallback>>) -> Result<RescanConfig> {
    let mut builder = RescanConfig::builder()
        .dpi(cli.dpi)
        .jpeg_quality(cli.quality)
        .max_rendered_pixels(cli.max_pixels)
        .converter_timeout_secs(cli.timeout)
        .keep_images(!cli.remove_images)
        .overwrite(if cli.no_clobber {
            OverwritePolicy::Refuse
        } else {
            OverwritePolicy::Overwrite
        });

    if let Some(ref program) = cli.soffice {
        builder = builder.soffice_program(program.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
