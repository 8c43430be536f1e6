use crate::cdp_driver::{CdpFrameDriver, DEFAULT_FRAME_SELECTOR, HandlerGuard};
use crate::{Error, Result};
use chromiumoxide::browser::Browser;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Connects to a running Chrome over the DevTools Protocol
pub struct CdpSession {
    debugging_port: u16,
    frame_selector: String,
}

impl CdpSession {
    /// Create a new CDP session
    pub fn new(debugging_port: u16) -> Self {
        Self {
            debugging_port,
            frame_selector: DEFAULT_FRAME_SELECTOR.to_string(),
        }
    }

    /// Selector the returned driver uses to list child frames
    pub fn with_frame_selector(mut self, selector: impl Into<String>) -> Self {
        self.frame_selector = selector.into();
        self
    }

    pub fn debugging_port(&self) -> u16 {
        self.debugging_port
    }

    fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debugging_port)
    }

    /// Connect to Chrome and return a frame driver for its first page
    ///
    /// Chrome may still be starting, so the connection is retried a few
    /// times. When no page is open, one is created at `about:blank`.
    pub async fn connect(&self) -> Result<CdpFrameDriver> {
        let endpoint = self.endpoint();
        tracing::info!("CDP session: connecting to Chrome at {}", endpoint);

        let (browser, mut handler) = {
            let mut retries = CONNECT_ATTEMPTS;
            loop {
                tracing::debug!("Attempting CDP connection to {}...", endpoint);
                match Browser::connect(&endpoint).await {
                    Ok(result) => {
                        tracing::info!("CDP connection established");
                        break result;
                    }
                    Err(e) => {
                        retries -= 1;
                        if retries == 0 {
                            return Err(Error::Cdp(format!(
                                "Failed to connect to Chrome after {} attempts: {}",
                                CONNECT_ATTEMPTS, e
                            )));
                        }
                        tracing::info!(
                            "CDP connection attempt failed, retrying... ({} left)",
                            retries
                        );
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        };

        // Commands only complete while the handler is being polled
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });
        let guard = Arc::new(HandlerGuard(handler_task));

        let page = match browser.pages().await?.into_iter().next() {
            Some(page) => {
                tracing::info!("CDP: Using existing page");
                page
            }
            None => {
                tracing::info!("CDP: No existing pages, creating new page");
                browser.new_page("about:blank").await?
            }
        };

        Ok(CdpFrameDriver::with_handler(page, guard).with_frame_selector(self.frame_selector.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_session_defaults() {
        let session = CdpSession::new(9222);
        assert_eq!(session.debugging_port(), 9222);
        assert_eq!(session.endpoint(), "http://localhost:9222");
        assert_eq!(session.frame_selector, "iframe, frame");
    }

    #[test]
    fn test_cdp_session_frame_selector() {
        let session = CdpSession::new(9333).with_frame_selector("iframe");
        assert_eq!(session.frame_selector, "iframe");
    }

    #[tokio::test]
    async fn test_connect_fails_without_chrome() {
        // nothing listens on port 1
        let err = CdpSession::new(1).connect().await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect to Chrome after 5 attempts"));
    }
}
