//! Locate an element without knowing which frame holds it
//!
//! [`FrameSearcher`] walks the live frame tree of a document depth-first,
//! entering each child frame with a bounded wait, checking it with a
//! caller-supplied locate step and backing out to the parent after every
//! subtree. The document automation itself sits behind [`FrameDriver`].

pub mod config;
pub mod driver;
pub mod error;
pub mod factory;
pub mod locate;
pub mod navigator;
pub mod searcher;

#[cfg(test)]
mod fake;

pub use config::{SearchConfig, UnenterablePolicy};
pub use driver::{DriverError, FrameDriver, Locator};
pub use error::{Error, Result};
pub use factory::SearchFactory;
pub use locate::{Locate, LocateFn, locate_fn};
pub use navigator::Navigator;
pub use searcher::{Found, FramePath, FrameSearcher};
pub use tokio_util::sync::CancellationToken;
