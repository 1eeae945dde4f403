//! Renderer adapters
//!
//! A [`Renderer`] turns one [`Job`] into a screenshot file. The dispatcher
//! only cares that the call returns once the work is finished; whether the
//! file actually appeared is checked by the caller.

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::{Error, Job, RenderConfig, Result};

/// How often a running child is polled while a deadline is in force
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Produces a screenshot for a single job
pub trait Renderer: Send + Sync {
    /// Render `job` into `output` and return once rendering has finished.
    ///
    /// Returning `Ok` does not promise that `output` exists.
    fn render(&self, job: &Job, output: &Path) -> Result<()>;
}

/// Renders by launching a headless Chrome process per job
///
/// The exit status of the browser is logged but does not decide success:
/// Chrome sometimes exits non-zero after writing a perfectly good screenshot.
pub struct ChromeRenderer {
    config: RenderConfig,
}

impl ChromeRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Command line arguments for `job`, excluding the executable itself
    pub fn args(&self, job: &Job, output: &Path) -> Vec<String> {
        let scale = self.config.scale_factor.for_screen(&job.screen);
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            format!(
                "--window-size={},{}",
                job.screen.css_width, job.screen.css_height
            ),
            format!("--force-device-scale-factor={}", scale),
            format!("--screenshot={}", output.display()),
            job.page.url.clone(),
        ]
    }

    fn command(&self, job: &Job, output: &Path) -> Command {
        let mut cmd = Command::new(&self.config.chrome_path);
        cmd.args(self.args(job, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        own_process_group(&mut cmd);
        if self.config.low_priority {
            lower_priority(&mut cmd);
        }
        cmd
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        if self.config.timeout_ms == 0 {
            return Ok(child.wait()?);
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                kill_tree(child);
                return Err(Error::Timeout(self.config.timeout_ms));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Renderer for ChromeRenderer {
    fn render(&self, job: &Job, output: &Path) -> Result<()> {
        let mut child = self.command(job, output).spawn().map_err(|e| {
            Error::Launch(format!("{}: {}", self.config.chrome_path.display(), e))
        })?;
        debug!("{}: spawned renderer pid {}", job.label(), child.id());

        let status = self.wait(&mut child)?;
        if !status.success() {
            warn!("{}: renderer exited with {}", job.label(), status);
        }
        Ok(())
    }
}

// Chrome forks renderer/GPU/utility helpers; giving the browser its own
// process group lets a timeout take all of them down together.
#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Kill the child and everything in its process group, then reap it.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    match i32::try_from(child.id()) {
        Ok(pid) => unsafe {
            libc::kill(-pid, libc::SIGKILL);
        },
        Err(_) => {
            let _ = child.kill();
        }
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

// Applied in the child between fork and exec so the browser and everything it
// spawns inherit the lowered priority.
#[cfg(unix)]
fn lower_priority(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    unsafe {
        cmd.pre_exec(|| {
            // nice(2) returns the new niceness; failure just leaves priority unchanged
            libc::nice(19);
            Ok(())
        });
    }
}

#[cfg(windows)]
fn lower_priority(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    const IDLE_PRIORITY_CLASS: u32 = 0x0000_0040;
    cmd.creation_flags(IDLE_PRIORITY_CLASS);
}

#[cfg(not(any(unix, windows)))]
fn lower_priority(_cmd: &mut Command) {}
