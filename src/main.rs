use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use webshots::{
    catalog, ChromeRenderer, Dispatcher, PageDescriptor, RenderConfig, ScaleFactor,
    DEFAULT_SCALE_FACTOR, DEFAULT_WORKERS,
};

#[derive(Parser, Debug)]
#[command(
    name = "webshots",
    version,
    about = "Screenshot web pages at a matrix of device viewport sizes using headless Chrome"
)]
struct Args {
    /// Chrome/Chromium executable used for rendering
    #[arg(long, env = "WEBSHOTS_CHROME", value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Directory the screenshots are written to (created if missing)
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Number of browsers running at once (0 = one per logical CPU)
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_WORKERS)]
    jobs: usize,

    /// Per-screenshot timeout in seconds (0 = wait forever)
    #[arg(long, value_name = "SECONDS", default_value_t = 120)]
    timeout: u64,

    /// Device scale factor passed to Chrome for every screen
    #[arg(long, value_name = "FLOAT", default_value_t = DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Use each screen's own device pixel ratio instead of --scale-factor
    #[arg(long, conflicts_with = "scale_factor")]
    screen_dpi: bool,

    /// Run Chrome at normal scheduling priority
    #[arg(long)]
    normal_priority: bool,

    /// Page to render as NAME=URL; repeatable, replaces the built-in page list
    #[arg(long = "page", value_name = "NAME=URL")]
    pages: Vec<String>,

    /// Render only these pages (comma separated names)
    #[arg(long = "only-pages", value_name = "NAMES", value_delimiter = ',')]
    only_pages: Vec<String>,

    /// Render only these screens (comma separated names)
    #[arg(long = "only-screens", value_name = "NAMES", value_delimiter = ',')]
    only_screens: Vec<String>,

    /// Also render screens at their alternate (toolbars hidden) height
    #[arg(long)]
    alternate_heights: bool,

    /// Print the job list and exit without rendering
    #[arg(long)]
    list: bool,

    /// Write a JSON report of every job to this file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    initialise_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Returns `Ok(false)` when at least one screenshot failed.
fn run(args: Args) -> Result<bool> {
    let jobs = build_jobs(&args)?;

    if args.list {
        for job in &jobs {
            println!("{}\t{}\t{}", job.label(), job.output_file_name(), job.page.url);
        }
        return Ok(true);
    }

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output dir {}", args.output_dir.display())
    })?;

    let config = render_config(&args);
    let workers = if args.jobs == 0 { num_cpus::get() } else { args.jobs };
    tracing::info!(
        jobs = jobs.len(),
        workers,
        chrome = %config.chrome_path.display(),
        output = %args.output_dir.display(),
        "rendering"
    );

    let dispatcher = Dispatcher::new(ChromeRenderer::new(config), &args.output_dir, workers)?;
    let report = dispatcher.dispatch(jobs);

    tracing::info!("Time: {:.2} sec", report.elapsed.as_secs_f64());
    if report.error_count > 0 {
        tracing::error!("ENCOUNTERED {} ERRORS", report.error_count);
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }

    Ok(report.is_success())
}

fn build_jobs(args: &Args) -> Result<Vec<webshots::Job>> {
    let pages = if args.pages.is_empty() {
        catalog::builtin_pages()
    } else {
        args.pages
            .iter()
            .map(|p| PageDescriptor::parse(p))
            .collect::<webshots::Result<Vec<_>>>()?
    };
    let pages = catalog::select(pages, &args.only_pages, |p| p.name.as_str())
        .context("--only-pages")?;

    let mut screens = catalog::select(catalog::builtin_screens(), &args.only_screens, |s| {
        s.name.as_str()
    })
    .context("--only-screens")?;
    if args.alternate_heights {
        screens = catalog::with_alternate_heights(screens);
    }

    let jobs = catalog::jobs(&pages, &screens);
    catalog::check_unique_outputs(&jobs)?;
    Ok(jobs)
}

fn render_config(args: &Args) -> RenderConfig {
    let defaults = RenderConfig::default();
    RenderConfig {
        chrome_path: args.chrome.clone().unwrap_or(defaults.chrome_path),
        scale_factor: if args.screen_dpi {
            ScaleFactor::PerScreen
        } else {
            ScaleFactor::Fixed(args.scale_factor)
        },
        timeout_ms: args.timeout.saturating_mul(1000),
        low_priority: !args.normal_priority,
    }
}
