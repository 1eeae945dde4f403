//! webshots
//!
//! Batch-renders a set of web pages at a matrix of device viewport sizes by
//! driving one headless Chrome process per (page, screen) pair, producing one
//! PNG screenshot per pair.
//!
//! # Overview
//!
//! - [`catalog`]: page and screen descriptors, the built-in device list, and
//!   the cross product that turns them into [`Job`]s
//! - [`renderer`]: the [`Renderer`] trait and the [`ChromeRenderer`] that shells
//!   out to a browser executable
//! - [`dispatch`]: the fixed-size worker pool that runs every job exactly once
//!
//! # Example
//!
//! ```no_run
//! use webshots::{catalog, ChromeRenderer, Dispatcher, RenderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let jobs = catalog::jobs(&catalog::builtin_pages(), &catalog::builtin_screens());
//! let renderer = ChromeRenderer::new(RenderConfig::default());
//! let dispatcher = Dispatcher::new(renderer, "shots", 6)?;
//! let report = dispatcher.dispatch(jobs);
//! println!("{} failures in {:?}", report.error_count, report.elapsed);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod catalog;
pub use catalog::{Job, PageDescriptor, ScreenDescriptor};

pub mod renderer;
pub use renderer::{ChromeRenderer, Renderer};

pub mod dispatch;
pub use dispatch::{DispatchReport, Dispatcher, JobOutcome, JobStatus};

/// Worker count used when none is given
pub const DEFAULT_WORKERS: usize = 6;

/// Device scale factor passed to Chrome when nothing else is configured
pub const DEFAULT_SCALE_FACTOR: f64 = 2.0;

/// How the `--force-device-scale-factor` value is chosen for each job
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleFactor {
    /// Same factor for every screen
    Fixed(f64),
    /// Use each screen's own `dpi_zoom`
    PerScreen,
}

impl ScaleFactor {
    pub fn for_screen(&self, screen: &ScreenDescriptor) -> f64 {
        match *self {
            ScaleFactor::Fixed(f) => f,
            ScaleFactor::PerScreen => screen.dpi_zoom,
        }
    }
}

/// Configuration for launching the renderer
///
/// The defaults mirror a plain desktop install of Chrome: a fixed 2x scale
/// factor, a two minute deadline per screenshot and lowered process priority.
///
/// # Examples
///
/// ```
/// let cfg = webshots::RenderConfig::default();
/// assert_eq!(cfg.timeout_ms, 120_000);
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Path of the browser executable
    pub chrome_path: PathBuf,
    /// Scale factor policy
    pub scale_factor: ScaleFactor,
    /// Per-job deadline in milliseconds (0 => wait forever)
    pub timeout_ms: u64,
    /// Whether to run the browser at idle/lowest scheduling priority
    pub low_priority: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chrome_path: default_chrome_path(),
            scale_factor: ScaleFactor::Fixed(DEFAULT_SCALE_FACTOR),
            timeout_ms: 120_000,
            low_priority: true,
        }
    }
}

/// Platform default location of the Chrome executable
pub fn default_chrome_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
    } else {
        PathBuf::from("google-chrome")
    }
}
