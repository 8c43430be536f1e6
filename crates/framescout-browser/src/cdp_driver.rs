use crate::error::{classify_message, driver_error};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::dom::{
    DescribeNodeParams, GetDocumentParams, NodeId, PushNodesByBackendIdsToFrontendParams,
    QuerySelectorAllParams, QuerySelectorParams, ResolveNodeParams,
};
use chromiumoxide::cdp::js_protocol::runtime::CallFunctionOnParams;
use framescout_core::{DriverError, FrameDriver, Locator};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// Selector used to enumerate frame owner elements
pub const DEFAULT_FRAME_SELECTOR: &str = "iframe, frame";

const IS_CONNECTED_FN: &str = "function() { return this.isConnected; }";

/// Frame owner element in the current document
#[derive(Debug, Clone)]
pub struct CdpFrame {
    pub node_id: NodeId,
}

impl PartialEq for CdpFrame {
    fn eq(&self, other: &Self) -> bool {
        self.node_id.inner() == other.node_id.inner()
    }
}

/// Element located through the DOM domain
#[derive(Debug, Clone)]
pub struct CdpElement {
    pub node_id: NodeId,
}

/// Aborts the CDP handler task once the last driver clone is dropped
#[derive(Debug)]
pub(crate) struct HandlerGuard(pub(crate) JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Root document id shared by every clone of a driver
///
/// `DOM.getDocument` discards every node id the page handed out before, so
/// clones reuse one root and only fetch a new one once it has gone stale.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedRoot(Arc<Mutex<Option<NodeId>>>);

impl SharedRoot {
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<NodeId>> {
        self.0.lock().await
    }
}

/// [`FrameDriver`] backed by a Chrome page
///
/// The cursor is a stack of document node ids, outermost first. Frames
/// whose document lives in another renderer process (cross-origin iframes)
/// have no content document here and report as unavailable.
///
/// Clones keep separate cursors over the same page and share its root
/// document, so handles found by one clone survive searches by another.
#[derive(Clone)]
pub struct CdpFrameDriver {
    page: Page,
    frame_selector: String,
    root: SharedRoot,
    documents: Vec<NodeId>,
    _handler: Option<Arc<HandlerGuard>>,
}

impl CdpFrameDriver {
    /// Drive an existing page whose handler is run elsewhere
    pub fn new(page: Page) -> Self {
        Self {
            page,
            frame_selector: DEFAULT_FRAME_SELECTOR.to_string(),
            root: SharedRoot::default(),
            documents: Vec::new(),
            _handler: None,
        }
    }

    pub(crate) fn with_handler(page: Page, handler: Arc<HandlerGuard>) -> Self {
        Self {
            _handler: Some(handler),
            ..Self::new(page)
        }
    }

    /// Override the selector used to list child frames
    pub fn with_frame_selector(mut self, selector: impl Into<String>) -> Self {
        self.frame_selector = selector.into();
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Frames entered below the outermost document
    pub fn depth(&self) -> usize {
        self.documents.len().saturating_sub(1)
    }

    /// Whether `document` still resolves in the page
    async fn document_is_live(&self, document: &NodeId) -> Result<bool, DriverError> {
        let params = DescribeNodeParams::builder().node_id(document.clone()).build();
        match self.page.execute(params).await {
            Ok(_) => Ok(true),
            Err(e) => match driver_error(e) {
                e if e.is_fatal() => Err(e),
                e => {
                    tracing::debug!("Cached root document is gone: {}", e);
                    Ok(false)
                }
            },
        }
    }

    async fn current_document(&mut self) -> Result<NodeId, DriverError> {
        if let Some(document) = self.documents.last() {
            return Ok(document.clone());
        }
        self.switch_to_top().await?;
        self.documents
            .last()
            .cloned()
            .ok_or_else(|| DriverError::Protocol("no document available".to_string()))
    }
}

impl fmt::Debug for CdpFrameDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpFrameDriver")
            .field("frame_selector", &self.frame_selector)
            .field("documents", &self.documents)
            .finish()
    }
}

#[async_trait]
impl FrameDriver for CdpFrameDriver {
    type Frame = CdpFrame;
    type Element = CdpElement;

    async fn switch_to_top(&mut self) -> Result<(), DriverError> {
        let shared = self.root.clone();
        let mut root = shared.lock().await;

        let cached = match root.clone() {
            Some(document) => self.document_is_live(&document).await?.then_some(document),
            None => None,
        };
        let document = match cached {
            Some(document) => document,
            None => {
                let response = self
                    .page
                    .execute(GetDocumentParams::default())
                    .await
                    .map_err(driver_error)?;
                let document = response.result.root.node_id.clone();
                *root = Some(document.clone());
                document
            }
        };
        drop(root);

        self.documents.clear();
        self.documents.push(document);
        Ok(())
    }

    async fn child_frames(&mut self) -> Result<Vec<CdpFrame>, DriverError> {
        let document = self.current_document().await?;
        let params = QuerySelectorAllParams::new(document, self.frame_selector.clone());
        let response = self.page.execute(params).await.map_err(driver_error)?;

        Ok(response
            .result
            .node_ids
            .iter()
            .map(|node_id| CdpFrame {
                node_id: node_id.clone(),
            })
            .collect())
    }

    async fn switch_to_frame(&mut self, frame: &CdpFrame) -> Result<(), DriverError> {
        let params = DescribeNodeParams::builder()
            .node_id(frame.node_id.clone())
            .build();
        let response = self.page.execute(params).await.map_err(driver_error)?;

        let content = response.result.node.content_document.ok_or_else(|| {
            DriverError::FrameUnavailable(format!(
                "frame {:?} has no content document",
                frame.node_id
            ))
        })?;

        let params = PushNodesByBackendIdsToFrontendParams::new(vec![content.backend_node_id.clone()]);
        let response = self.page.execute(params).await.map_err(driver_error)?;
        let document = response
            .result
            .node_ids
            .first()
            .cloned()
            .filter(|id| *id.inner() != 0)
            .ok_or_else(|| {
                DriverError::FrameUnavailable(format!(
                    "frame {:?} document is not attached",
                    frame.node_id
                ))
            })?;

        self.documents.push(document);
        Ok(())
    }

    async fn switch_to_parent(&mut self) -> Result<(), DriverError> {
        if self.documents.len() > 1 {
            self.documents.pop();
        }
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<CdpElement, DriverError> {
        let document = self.current_document().await?;
        let params = QuerySelectorParams::new(document, locator.as_str());
        let response = self.page.execute(params).await.map_err(driver_error)?;

        let node_id = response.result.node_id.clone();
        if *node_id.inner() == 0 {
            return Err(DriverError::NoSuchElement(locator.to_string()));
        }
        Ok(CdpElement { node_id })
    }

    async fn is_attached(&mut self, element: &CdpElement) -> Result<bool, DriverError> {
        let params = ResolveNodeParams::builder()
            .node_id(element.node_id.clone())
            .build();
        let object_id = match self.page.execute(params).await {
            Ok(response) => response.result.object.object_id.clone(),
            Err(e) => match driver_error(e) {
                DriverError::StaleReference(_) => return Ok(false),
                other => return Err(other),
            },
        };
        let Some(object_id) = object_id else {
            return Ok(false);
        };

        let params = CallFunctionOnParams::builder()
            .function_declaration(IS_CONNECTED_FN)
            .object_id(object_id)
            .return_by_value(true)
            .build()
            .map_err(classify_message)?;
        let response = self.page.execute(params).await.map_err(driver_error)?;

        Ok(response
            .result
            .result
            .value
            .as_ref()
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_compare_by_node_id() {
        let frame = CdpFrame { node_id: NodeId::new(4) };
        assert_eq!(frame, CdpFrame { node_id: NodeId::new(4) });
        assert_ne!(frame, CdpFrame { node_id: NodeId::new(5) });
    }

    #[tokio::test]
    async fn test_clones_share_root_document() {
        let root = SharedRoot::default();
        let clone = root.clone();
        assert!(clone.lock().await.is_none());

        *root.lock().await = Some(NodeId::new(7));
        let cached = clone.lock().await.clone();
        assert_eq!(cached.map(|id| *id.inner()), Some(7));
    }
}
