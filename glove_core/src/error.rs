use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DeviceError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for input")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing input source")]
    MissingInput,
    #[error("missing display")]
    MissingDisplay,
    #[error("missing storage")]
    MissingStorage,
    #[error("missing transport")]
    MissingTransport,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
