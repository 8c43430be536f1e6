use crate::driver::DriverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
