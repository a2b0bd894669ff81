use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Background session task that raises a cancellation signal when no
/// activity was recorded for `timeout`.
///
/// Interested tasks hold a receiver from `subscribe` and stop when it flips to
/// `true`. The signal is sticky: once idle, the monitor stays idle.
pub struct IdleMonitor {
    activity: watch::Sender<Instant>,
    idle: watch::Receiver<bool>,
    handle: JoinHandle<()>,
    timeout: Duration,
}

impl IdleMonitor {
    /// Spawn the monitor on the current runtime.
    pub fn start(timeout: Duration) -> Self {
        let (activity, mut activity_rx) = watch::channel(Instant::now());
        let (idle_tx, idle) = watch::channel(false);

        let handle = tokio::spawn(async move {
            loop {
                let deadline = *activity_rx.borrow_and_update() + timeout;
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        log::info!("Session idle for {:?}", timeout);
                        idle_tx.send_replace(true);
                        break;
                    }
                    changed = activity_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            activity,
            idle,
            handle,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record activity, pushing the idle deadline out.
    pub fn touch(&self) {
        self.activity.send_replace(Instant::now());
    }

    pub fn is_idle(&self) -> bool {
        *self.idle.borrow()
    }

    /// A receiver that turns `true` once the session went idle.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.idle.clone()
    }

    /// Wait until the session goes idle.
    pub async fn idle(&self) {
        let mut idle = self.idle.clone();
        // An error means the monitor task ended without firing.
        let _ = idle.wait_for(|is_idle| *is_idle).await;
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
