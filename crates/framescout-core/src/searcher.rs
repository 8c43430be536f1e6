use crate::config::{SearchConfig, UnenterablePolicy};
use crate::driver::FrameDriver;
use crate::locate::Locate;
use crate::navigator::Navigator;
use crate::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Position of a frame as sibling indices from the outermost document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramePath(Vec<usize>);

impl FramePath {
    /// Number of frames between the outermost document and this frame
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// An element that passed the liveness check, and the frame holding it
///
/// The handle is only usable while the driver's cursor stays in that frame.
#[derive(Debug)]
pub struct Found<E> {
    pub element: E,
    pub path: FramePath,
}

enum Visit<E> {
    Found(Found<E>),
    Exhausted,
    Aborted,
}

/// Depth-first search for an element across nested frames
///
/// Each frame's own document is checked before its children, and siblings
/// are visited in the order the driver lists them, so the shallowest and
/// earliest match wins. The outermost document itself is never checked.
pub struct FrameSearcher<D: FrameDriver, L> {
    navigator: Navigator<D>,
    locate: L,
    check_timeout: Duration,
    policy: UnenterablePolicy,
}

impl<D, L> FrameSearcher<D, L>
where
    D: FrameDriver,
    L: Locate<D>,
{
    pub fn new(driver: D, locate: L, config: &SearchConfig) -> Self {
        Self {
            navigator: Navigator::new(driver, config),
            locate,
            check_timeout: config.check_timeout(),
            policy: config.on_unenterable,
        }
    }

    /// Stop the search, reporting not-found, once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.navigator = self.navigator.with_cancellation(token);
        self
    }

    pub fn navigator(&self) -> &Navigator<D> {
        &self.navigator
    }

    pub fn driver_mut(&mut self) -> &mut D {
        self.navigator.driver_mut()
    }

    pub fn into_driver(self) -> D {
        self.navigator.into_driver()
    }

    /// Walk the frame tree once and return the first live match
    ///
    /// On a match the cursor is left in the frame that holds the element.
    /// Otherwise every entered frame has been exited again and the cursor is
    /// back at the outermost document. Only a lost driver session is an
    /// error.
    pub async fn find(&mut self) -> Result<Option<Found<D::Element>>> {
        self.navigator.reset_to_top().await?;

        let mut path = Vec::new();
        match self.visit_children(&mut path).await? {
            Visit::Found(found) => {
                tracing::debug!("Element found in frame {}", found.path);
                Ok(Some(found))
            }
            Visit::Exhausted => {
                tracing::debug!("Element not found in any frame");
                Ok(None)
            }
            Visit::Aborted => {
                tracing::info!("Frame search stopped early, reporting not found");
                Ok(None)
            }
        }
    }

    /// Return the cursor to the outermost document
    pub async fn reset(&mut self) -> Result<()> {
        self.navigator.reset_to_top().await?;
        Ok(())
    }

    fn visit_frame<'a>(
        &'a mut self,
        path: &'a mut Vec<usize>,
    ) -> BoxFuture<'a, Result<Visit<D::Element>>> {
        Box::pin(async move {
            if let Some(element) = self.probe().await {
                return Ok(Visit::Found(Found {
                    element,
                    path: FramePath(path.clone()),
                }));
            }
            self.visit_children(path).await
        })
    }

    fn visit_children<'a>(
        &'a mut self,
        path: &'a mut Vec<usize>,
    ) -> BoxFuture<'a, Result<Visit<D::Element>>> {
        Box::pin(async move {
            let mut next = 0;
            let mut last: Option<D::Frame> = None;
            loop {
                if self.navigator.is_cancelled() {
                    tracing::info!("Frame search cancelled at depth {}", path.len());
                    return Ok(Visit::Aborted);
                }

                // The tree may have changed since the last sibling was visited.
                // Resume after that sibling; its old slot only counts once it is gone.
                let frames = self.navigator.list_child_frames().await?;
                let index = last
                    .as_ref()
                    .and_then(|prev| frames.iter().position(|f| f == prev))
                    .map_or(next, |position| position + 1);
                let Some(frame) = frames.into_iter().nth(index) else {
                    return Ok(Visit::Exhausted);
                };
                next = index;

                if !self.navigator.enter_child(&frame).await? {
                    match self.policy {
                        UnenterablePolicy::AbortSearch => {
                            tracing::info!(
                                "Frame {:?} at depth {} could not be entered, aborting search",
                                frame,
                                path.len() + 1
                            );
                            return Ok(Visit::Aborted);
                        }
                        UnenterablePolicy::SkipFrame => {
                            tracing::warn!("Skipping frame {:?} that could not be entered", frame);
                            last = Some(frame);
                            continue;
                        }
                    }
                }

                path.push(index);
                let visit = self.visit_frame(path).await?;
                if matches!(visit, Visit::Found(_)) {
                    return Ok(visit);
                }
                path.pop();
                self.navigator.exit_to_parent().await?;

                if matches!(visit, Visit::Aborted) {
                    return Ok(visit);
                }
                last = Some(frame);
            }
        })
    }

    /// Locate the candidate in the current frame and confirm it is attached
    async fn probe(&mut self) -> Option<D::Element> {
        let element = match self.locate.locate(self.navigator.driver_mut()).await {
            Ok(element) => element,
            Err(e) => {
                tracing::trace!("Locate failed at depth {}: {}", self.navigator.depth(), e);
                return None;
            }
        };

        let cancel = self.navigator.cancellation().cloned();
        let bound = self.check_timeout;
        let check = tokio::time::timeout(bound, self.navigator.driver_mut().is_attached(&element));
        let outcome = match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => return None,
                outcome = check => outcome,
            },
            None => check.await,
        };

        match outcome {
            Ok(Ok(true)) => Some(element),
            Ok(Ok(false)) => {
                tracing::debug!("Located element {:?} is detached", element);
                None
            }
            Ok(Err(e)) => {
                tracing::debug!("Liveness check failed: {}", e);
                None
            }
            Err(_) => {
                tracing::debug!("Liveness check exceeded {}ms", bound.as_millis());
                None
            }
        }
    }
}
