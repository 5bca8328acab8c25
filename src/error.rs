use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No sensors found under {0}")]
    DiscoveryEmpty(String),

    #[error("{0}")]
    Transport(String),

    #[error("Sensor not found: {0}")]
    UnresolvedSensor(String),

    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}
