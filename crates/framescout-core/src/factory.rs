use crate::config::SearchConfig;
use crate::driver::{FrameDriver, Locator};
use crate::locate::Locate;
use crate::searcher::FrameSearcher;
use crate::Result;

/// Hands out frame searchers bound to one driver session
///
/// Every searcher gets its own clone of the driver handle and with it its own
/// frame cursor. Clones still drive the same browser page, so drivers must
/// keep node references valid across clones (the CDP driver shares one root
/// document between them). Searches on one page should not run concurrently.
/// Suitable for sharing through dependency injection.
#[derive(Debug, Clone)]
pub struct SearchFactory<D> {
    driver: D,
    config: SearchConfig,
}

impl<D> SearchFactory<D>
where
    D: FrameDriver + Clone,
{
    /// Create a factory with default timeouts
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            config: SearchConfig::default(),
        }
    }

    /// Create a factory with a validated configuration
    pub fn with_config(driver: D, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { driver, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for the element matching `locator`
    pub fn search(&self, locator: Locator) -> FrameSearcher<D, Locator> {
        self.search_with(locator)
    }

    /// Search using a custom locate step, e.g. one built with [`crate::locate_fn`]
    pub fn search_with<L: Locate<D>>(&self, locate: L) -> FrameSearcher<D, L> {
        FrameSearcher::new(self.driver.clone(), locate, &self.config)
    }
}
