//! External program helpers.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::process::Command;
use tokio::sync::Notify;

use voice_runtime_core::VoiceError;

/// Look `name` up in `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in(std::env::split_paths(&path), name)
}

/// Look `name` up in `dirs`, in order.
pub fn find_in<I>(dirs: I, name: &str) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    dirs.into_iter()
        .flat_map(|dir| candidates(&dir, name))
        .find(|candidate| is_executable(candidate))
}

fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(name), dir.join(format!("{}.exe", name))]
    } else {
        vec![dir.join(name)]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Stop requests for the programs an engine launches.
///
/// Each `stop` starts a new generation. Work tagged with an earlier
/// generation must not start a program, even when it gets there after the
/// stop was issued.
#[derive(Debug, Default)]
pub struct StopSignal {
    generation: AtomicU64,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag for work started now.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_stopped_since(&self, generation: u64) -> bool {
        self.generation() != generation
    }

    /// Kill running programs and cancel every pending generation.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// Run `program` to completion, or kill it once `stop` fires.
///
/// Nothing is started when `stop` fired after `generation` was taken.
/// Output is discarded. A non-zero exit is reported as `ServiceUnavailable`.
pub async fn run_until_stopped<I, S>(
    program: &Path,
    args: I,
    stop: &StopSignal,
    generation: u64,
) -> Result<(), VoiceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let label = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());

    // Registered before the generation check so a concurrent stop is not lost.
    let stopped = stop.notify.notified();
    tokio::pin!(stopped);
    stopped.as_mut().enable();
    if stop.is_stopped_since(generation) {
        log::debug!("Not starting {}: stopped", label);
        return Ok(());
    }

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| VoiceError::ServiceUnavailable(format!("failed to start {}: {}", label, e)))?;

    tokio::select! {
        status = child.wait() => {
            let status = status
                .map_err(|e| VoiceError::ServiceUnavailable(format!("{} failed: {}", label, e)))?;
            if status.success() {
                Ok(())
            } else {
                Err(VoiceError::ServiceUnavailable(format!("{} exited with {}", label, status)))
            }
        }
        _ = &mut stopped => {
            log::debug!("Stopping {}", label);
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill {}: {}", label, e);
            }
            Ok(())
        }
    }
}
