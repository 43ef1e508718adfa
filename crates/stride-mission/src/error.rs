use stride_location::LocationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MissionError {
    #[error("location error: {0}")]
    Location(#[from] LocationError),

    #[error("session log error: {0}")]
    SessionLog(#[from] std::io::Error),
}
