use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no page at index {index}")]
    NotFound { index: usize },

    #[error("no schedule could be found in date ranges {searched}")]
    NoSchedule { searched: String },

    #[error("access token was rejected")]
    InvalidCredential,

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("missing credential: {0}")]
    MissingCredentials(&'static str),

    /// Something the person running a command needs to fix.
    #[error("{0}")]
    Usage(String),

    #[error("unexpected upstream response: {0}")]
    Upstream(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("discord error: {0}")]
    Discord(#[from] serenity::Error),
}

impl Error {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Errors the menu treats as "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
