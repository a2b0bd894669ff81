use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::models::audio_models::DeviceInfo;
use crate::models::error::VoiceError;

/// Exclusive ownership of the capture device.
///
/// The device is released when the lease is released explicitly or dropped,
/// so every exit path (error, panic, cancelled future) gives it back.
#[derive(Debug)]
pub struct DeviceLease {
    id: u64,
    permit: Option<OwnedSemaphorePermit>,
    acquired_at: Instant,
    deadline: Instant,
}

impl DeviceLease {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// When the lease was granted.
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// The acquisition deadline this lease was granted under.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_held(&self) -> bool {
        self.permit.is_some()
    }

    /// Give the device back. Safe to call more than once.
    pub fn release(&mut self) {
        if self.permit.take().is_some() {
            log::debug!(
                "Released device lease {} after {:?}",
                self.id,
                self.acquired_at.elapsed()
            );
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.release();
    }
}

/// Grants mutually exclusive, time-bounded access to the single capture
/// device.
///
/// There is no queue fairness: a caller that cannot get the device before its
/// timeout receives `Busy` and decides for itself whether to retry.
#[derive(Debug)]
pub struct DeviceArbiter {
    device: DeviceInfo,
    slot: Arc<Semaphore>,
    next_id: AtomicU64,
}

impl DeviceArbiter {
    pub fn new(device: DeviceInfo) -> Self {
        Self {
            device,
            slot: Arc::new(Semaphore::new(1)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    /// Wait up to `timeout` for the device.
    pub async fn acquire(&self, timeout: Duration) -> Result<DeviceLease, VoiceError> {
        let deadline = Instant::now() + timeout;
        let permit = match tokio::time::timeout_at(deadline, Arc::clone(&self.slot).acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => return Err(VoiceError::DeviceUnavailable),
            Err(_) => {
                log::warn!("Capture device {} busy after {:?}", self.device.name, timeout);
                return Err(VoiceError::Busy);
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("Granted device lease {} on {}", id, self.device.name);
        Ok(DeviceLease {
            id,
            permit: Some(permit),
            acquired_at: Instant::now(),
            deadline,
        })
    }

    /// Take the device only if it is free right now.
    pub fn try_acquire(&self) -> Result<DeviceLease, VoiceError> {
        let permit = Arc::clone(&self.slot)
            .try_acquire_owned()
            .map_err(|_| VoiceError::Busy)?;
        let now = Instant::now();
        Ok(DeviceLease {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            permit: Some(permit),
            acquired_at: now,
            deadline: now,
        })
    }

    /// Release a lease. Equivalent to dropping it.
    pub fn release(&self, mut lease: DeviceLease) {
        lease.release();
    }

    /// Whether no lease is outstanding.
    pub fn is_free(&self) -> bool {
        self.slot.available_permits() == 1
    }
}
