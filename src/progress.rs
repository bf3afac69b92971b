//! Progress-callback trait for stage and page events.
//!
//! Inject an [`Arc<dyn RescanProgressCallback>`] via
//! [`crate::config::RescanConfigBuilder::progress_callback`] to observe a run
//! as it moves through the three stages. The CLI uses it to drive a terminal
//! progress bar; library users can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use rescan::{RescanConfig, RescanProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl RescanProgressCallback for PageCounter {
//!     fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = RescanConfig::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::Stage;
use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it runs.
///
/// All methods default to no-ops so implementors only override what they
/// need. `on_page_rendered` is invoked from the blocking render thread, hence
/// the `Send + Sync` bound.
pub trait RescanProgressCallback: Send + Sync {
    /// A stage is about to start.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// The PDF has been opened and its page count is known.
    fn on_render_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// One page image has been written.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages in the document
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// A stage finished; `output` is the file or directory it produced.
    fn on_stage_complete(&self, stage: Stage, output: &Path) {
        let _ = (stage, output);
    }

    /// A stage failed; later stages will not run.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation, equivalent to configuring no callback.
pub struct NoopProgressCallback;

impl RescanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RescanConfig`].
pub type ProgressCallback = Arc<dyn RescanProgressCallback>;
