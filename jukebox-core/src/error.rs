use thiserror::Error;

/// Reasons the playlist could not be obtained
#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(#[source] ureq::Error),
    #[error("invalid songs payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fetch worker stopped before answering")]
    WorkerGone,
}

impl From<ureq::Error> for PlaylistError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => PlaylistError::Status(code),
            other => PlaylistError::Request(other),
        }
    }
}

impl PlaylistError {
    /// Message shown in place of the playlist
    pub fn user_message(&self) -> String {
        format!("Error fetching songs: {}", self)
    }
}
