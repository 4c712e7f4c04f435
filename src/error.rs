use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GITHUB_TOKEN not set.")]
    MissingToken,

    #[error("GITHUB_REPOSITORY not set.")]
    MissingRepository,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub API error in {operation}{}: {message}", http_status(.status))]
    Api {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}
