use thiserror::Error;

/// Failure while materializing video bytes from a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to run yt-dlp: {0}. Make sure yt-dlp is installed.")]
    ToolNotAvailable(String),

    #[error("yt-dlp download failed: {0}")]
    Download(String),

    #[error("downloaded file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure reported by a downstream analysis or generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Api(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not parse provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("file upload failed: {0}")]
    Upload(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("timed out after {0} seconds waiting for the provider")]
    Timeout(u64),

    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller-side contract violation, caught before any provider is contacted.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no video source provided")]
    NoVideoSource,

    #[error("image_urls must contain at least one entry")]
    EmptyImageList,
}
