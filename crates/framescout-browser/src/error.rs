use framescout_core::DriverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CDP error: {0}")]
    Cdp(String),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Map a CDP failure onto the driver error taxonomy
pub(crate) fn driver_error(err: chromiumoxide::error::CdpError) -> DriverError {
    use chromiumoxide::error::CdpError;

    match err {
        CdpError::Ws(e) => DriverError::Disconnected(e.to_string()),
        CdpError::NoResponse => DriverError::Disconnected("no response from browser".to_string()),
        other => classify_message(other.to_string()),
    }
}

/// Chrome reports lookups of nodes that left the document as plain messages
pub(crate) fn classify_message(message: String) -> DriverError {
    const STALE_MARKERS: [&str; 3] = [
        "Could not find node with given id",
        "No node with given id found",
        "Node with given id does not belong to the document",
    ];

    if STALE_MARKERS.iter().any(|marker| message.contains(marker)) {
        DriverError::StaleReference(message)
    } else {
        DriverError::Protocol(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_is_stale() {
        let err = classify_message("-32000: Could not find node with given id".to_string());
        assert!(err.is_stale());

        let err = classify_message("No node with given id found".to_string());
        assert!(err.is_stale());
    }

    #[test]
    fn test_other_messages_are_protocol_errors() {
        let err = classify_message("-32602: Invalid parameters".to_string());
        assert!(matches!(err, DriverError::Protocol(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_no_response_is_fatal() {
        let err = driver_error(chromiumoxide::error::CdpError::NoResponse);
        assert!(err.is_fatal());
    }
}
