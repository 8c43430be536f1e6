use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Failures reported by a [`FrameDriver`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("No element matches locator: {0}")]
    NoSuchElement(String),

    #[error("Stale reference: {0}")]
    StaleReference(String),

    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),

    #[error("Driver session disconnected: {0}")]
    Disconnected(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// The referenced node or frame was detached after it was obtained
    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleReference(_))
    }

    /// The session is gone; no further driver call can succeed
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Disconnected(_))
    }
}

/// Selector handed to the driver as-is
///
/// Selector syntax belongs to the driver. The CDP driver interprets it as a
/// CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn tag(name: &str) -> Self {
        Self(name.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document automation primitives the frame search is built on
///
/// Every call is relative to the driver's current frame. Methods take
/// `&mut self` so that exactly one caller moves the cursor at a time.
#[async_trait]
pub trait FrameDriver: Send {
    /// Reference to a frame owner element in the current document
    ///
    /// Equal references denote the same frame owner across listings.
    type Frame: Clone + PartialEq + fmt::Debug + Send + Sync;
    /// Handle to a located element
    type Element: fmt::Debug + Send + Sync;

    /// Make the outermost document current
    async fn switch_to_top(&mut self) -> Result<(), DriverError>;

    /// Direct child frames of the current document in DOM order
    async fn child_frames(&mut self) -> Result<Vec<Self::Frame>, DriverError>;

    /// Single attempt to make `frame`'s document current
    async fn switch_to_frame(&mut self, frame: &Self::Frame) -> Result<(), DriverError>;

    /// Make the parent of the current document current
    async fn switch_to_parent(&mut self) -> Result<(), DriverError>;

    /// Locate an element inside the current document
    async fn find_element(&mut self, locator: &Locator) -> Result<Self::Element, DriverError>;

    /// Whether a located element is still connected to its document
    async fn is_attached(&mut self, element: &Self::Element) -> Result<bool, DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(DriverError::StaleReference("frame 2".into()).is_stale());
        assert!(!DriverError::FrameUnavailable("frame 2".into()).is_stale());
        assert!(DriverError::Disconnected("ws closed".into()).is_fatal());
        assert!(!DriverError::Protocol("bad params".into()).is_fatal());
    }

    #[test]
    fn test_locator_tag_is_lowercased() {
        assert_eq!(Locator::tag("IFRAME").as_str(), "iframe");
        assert_eq!(
            Locator::css("input[name='firstname']").to_string(),
            "input[name='firstname']"
        );
    }
}
