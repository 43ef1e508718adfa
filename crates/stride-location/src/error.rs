use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("missing location API key")]
    MissingApiKey,

    #[error("location fetch failed: {0}")]
    FetchFailed(String),

    #[error("unexpected location payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        LocationError::FetchFailed(e.to_string())
    }
}
