use crate::config::SearchConfig;
use crate::driver::{DriverError, FrameDriver};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// Stand-in deadline for frame timeouts too large to add to the clock
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Owns a driver and the frame cursor it carries
///
/// Only fatal driver errors (a lost session) come back as `Err`. Everything
/// else is folded into the return value: a failed listing is an empty list,
/// a frame that cannot be entered in time is `false`.
pub struct Navigator<D: FrameDriver> {
    driver: D,
    frame_timeout: Duration,
    poll_interval: Duration,
    depth: usize,
    cancel: Option<CancellationToken>,
}

impl<D: FrameDriver> Navigator<D> {
    /// Wrap a driver, taking frame-entry timing from `config`
    pub fn new(driver: D, config: &SearchConfig) -> Self {
        Self {
            driver,
            frame_timeout: config.frame_timeout(),
            poll_interval: config.poll_interval(),
            depth: 0,
            cancel: None,
        }
    }

    /// Abort frame-entry waits as soon as `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of frames entered below the outermost document
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Move the cursor to the outermost document
    pub async fn reset_to_top(&mut self) -> Result<(), DriverError> {
        match self.driver.switch_to_top().await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("Switch to top document reported: {}", e),
        }
        self.depth = 0;
        Ok(())
    }

    /// Direct child frames of the current document, re-queried on every call
    pub async fn list_child_frames(&mut self) -> Result<Vec<D::Frame>, DriverError> {
        match self.driver.child_frames().await {
            Ok(frames) => Ok(frames),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::debug!("Listing child frames at depth {} failed: {}", self.depth, e);
                Ok(Vec::new())
            }
        }
    }

    /// Enter `frame`, retrying until the frame timeout elapses
    ///
    /// A stale frame reference fails immediately. Any other non-fatal
    /// failure is retried every poll interval. On `false` the cursor has not
    /// moved.
    pub async fn enter_child(&mut self, frame: &D::Frame) -> Result<bool, DriverError> {
        let now = Instant::now();
        let deadline = now.checked_add(self.frame_timeout).unwrap_or(now + FAR_FUTURE);
        let mut attempts = 0u32;

        loop {
            if self.is_cancelled() {
                return Ok(false);
            }
            attempts += 1;

            match tokio::time::timeout_at(deadline, self.driver.switch_to_frame(frame)).await {
                Ok(Ok(())) => {
                    self.depth += 1;
                    tracing::debug!("Entered frame {:?} (depth {})", frame, self.depth);
                    return Ok(true);
                }
                Ok(Err(e)) if e.is_fatal() => return Err(e),
                Ok(Err(e)) if e.is_stale() => {
                    tracing::debug!("Frame {:?} went stale before entry: {}", frame, e);
                    return Ok(false);
                }
                Ok(Err(e)) => {
                    tracing::debug!("Frame {:?} not available (attempt {}): {}", frame, attempts, e);
                }
                Err(_) => break,
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let period = self.poll_interval.min(deadline - now);
            if !pause(self.cancel.as_ref(), period).await {
                return Ok(false);
            }
        }

        tracing::debug!(
            "Gave up entering frame {:?} after {} attempts ({}ms)",
            frame,
            attempts,
            self.frame_timeout.as_millis()
        );
        Ok(false)
    }

    /// Move the cursor to the parent of the current frame
    pub async fn exit_to_parent(&mut self) -> Result<(), DriverError> {
        if self.depth == 0 {
            tracing::warn!("exit_to_parent called at the outermost document");
        }
        match self.driver.switch_to_parent().await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("Switch to parent frame reported: {}", e),
        }
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }
}

/// Sleep for `period`; `false` when cancelled first
async fn pause(cancel: Option<&CancellationToken>, period: Duration) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(period) => true,
        },
        None => {
            tokio::time::sleep(period).await;
            true
        }
    }
}
