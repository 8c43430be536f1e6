//! Scripted in-memory driver used by the unit tests

use crate::driver::{DriverError, FrameDriver, Locator};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct FakeFrame {
    name: String,
    elements: Vec<String>,
    children: Vec<FakeFrame>,
    unenterable: bool,
    attach_after: u32,
}

impl FakeFrame {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            elements: Vec::new(),
            children: Vec::new(),
            unenterable: false,
            attach_after: 0,
        }
    }

    pub fn element(mut self, name: &str) -> Self {
        self.elements.push(name.to_string());
        self
    }

    pub fn child(mut self, frame: FakeFrame) -> Self {
        self.children.push(frame);
        self
    }

    /// Every switch attempt reports the frame as not yet available
    pub fn unenterable(mut self) -> Self {
        self.unenterable = true;
        self
    }

    /// The first `attempts` switches fail, later ones succeed
    pub fn attaches_after(mut self, attempts: u32) -> Self {
        self.attach_after = attempts;
        self
    }

    fn remove(&mut self, name: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|f| f.name != name);
        if self.children.len() != before {
            return true;
        }
        self.children.iter_mut().any(|f| f.remove(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeFrameRef(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub name: String,
    pub frame: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FakeDriver {
    root: FakeFrame,
    cursor: Vec<String>,
    attempts: HashMap<String, u32>,
    entered: Vec<String>,
    locate_calls: Vec<Vec<String>>,
    listing_error: Option<DriverError>,
    locate_error: Option<DriverError>,
    detached: HashSet<String>,
    hanging_checks: bool,
    remove_on_enter: Option<(String, String)>,
}

impl FakeDriver {
    pub fn new(frames: Vec<FakeFrame>) -> Self {
        let mut root = FakeFrame::new("top");
        root.children = frames;
        Self::with_root(root)
    }

    pub fn with_root(root: FakeFrame) -> Self {
        Self {
            root,
            cursor: Vec::new(),
            attempts: HashMap::new(),
            entered: Vec::new(),
            locate_calls: Vec::new(),
            listing_error: None,
            locate_error: None,
            detached: HashSet::new(),
            hanging_checks: false,
            remove_on_enter: None,
        }
    }

    pub fn fail_listing(&mut self, error: DriverError) {
        self.listing_error = Some(error);
    }

    pub fn fail_locate(&mut self, error: DriverError) {
        self.locate_error = Some(error);
    }

    /// Elements with this name are found but report as detached
    pub fn detach_element(&mut self, name: &str) {
        self.detached.insert(name.to_string());
    }

    /// Liveness checks never complete
    pub fn hang_checks(&mut self) {
        self.hanging_checks = true;
    }

    /// Remove frame `victim` from the tree when `trigger` is entered
    pub fn remove_on_enter(&mut self, trigger: &str, victim: &str) {
        self.remove_on_enter = Some((trigger.to_string(), victim.to_string()));
    }

    pub fn remove_frame(&mut self, name: &str) {
        self.root.remove(name);
    }

    pub fn cursor_names(&self) -> Vec<String> {
        self.cursor.clone()
    }

    pub fn switch_attempts(&self, name: &str) -> u32 {
        self.attempts.get(name).copied().unwrap_or(0)
    }

    pub fn total_switch_attempts(&self) -> u32 {
        self.attempts.values().sum()
    }

    /// Names of successfully entered frames, in order
    pub fn entered(&self) -> &[String] {
        &self.entered
    }

    /// Cursor positions at which a locate was attempted
    pub fn locate_calls(&self) -> &[Vec<String>] {
        &self.locate_calls
    }

    fn current(&self) -> Option<&FakeFrame> {
        let mut frame = &self.root;
        for name in &self.cursor {
            frame = frame.children.iter().find(|f| &f.name == name)?;
        }
        Some(frame)
    }
}

#[async_trait]
impl FrameDriver for FakeDriver {
    type Frame = FakeFrameRef;
    type Element = FakeElement;

    async fn switch_to_top(&mut self) -> Result<(), DriverError> {
        self.cursor.clear();
        Ok(())
    }

    async fn child_frames(&mut self) -> Result<Vec<FakeFrameRef>, DriverError> {
        if let Some(err) = &self.listing_error {
            return Err(err.clone());
        }
        let frame = self
            .current()
            .ok_or_else(|| DriverError::Protocol("current document detached".into()))?;
        Ok(frame
            .children
            .iter()
            .map(|f| FakeFrameRef(f.name.clone()))
            .collect())
    }

    async fn switch_to_frame(&mut self, frame: &FakeFrameRef) -> Result<(), DriverError> {
        let attempt = {
            let counter = self.attempts.entry(frame.0.clone()).or_default();
            *counter += 1;
            *counter
        };
        let target = self
            .current()
            .and_then(|current| current.children.iter().find(|f| f.name == frame.0))
            .ok_or_else(|| DriverError::StaleReference(frame.0.clone()))?;

        if target.unenterable || attempt <= target.attach_after {
            return Err(DriverError::FrameUnavailable(frame.0.clone()));
        }

        self.cursor.push(frame.0.clone());
        self.entered.push(frame.0.clone());

        if let Some((trigger, victim)) = self.remove_on_enter.clone() {
            if trigger == frame.0 {
                self.root.remove(&victim);
            }
        }
        Ok(())
    }

    async fn switch_to_parent(&mut self) -> Result<(), DriverError> {
        self.cursor.pop();
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<FakeElement, DriverError> {
        self.locate_calls.push(self.cursor.clone());
        if let Some(err) = &self.locate_error {
            return Err(err.clone());
        }
        let frame = self
            .current()
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))?;
        if frame.elements.iter().any(|e| e == locator.as_str()) {
            Ok(FakeElement {
                name: locator.as_str().to_string(),
                frame: self.cursor.clone(),
            })
        } else {
            Err(DriverError::NoSuchElement(locator.to_string()))
        }
    }

    async fn is_attached(&mut self, element: &FakeElement) -> Result<bool, DriverError> {
        if self.hanging_checks {
            std::future::pending::<()>().await;
        }
        Ok(!self.detached.contains(&element.name))
    }
}
