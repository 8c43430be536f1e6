//! Chrome DevTools Protocol driver for framescout frame searches

mod cdp_driver;
mod cdp_session;
mod error;

pub use cdp_driver::{CdpElement, CdpFrame, CdpFrameDriver, DEFAULT_FRAME_SELECTOR};
pub use cdp_session::CdpSession;
pub use error::{Error, Result};
