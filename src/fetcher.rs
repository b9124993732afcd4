// Source Fetcher: turns a video URL into bytes.
//
// Social-media URLs go through the yt-dlp executable (several platforms
// refuse plain HTTP clients); everything else is a direct GET. yt-dlp
// downloads land in a scratch directory that is removed on every exit
// path before the bytes are returned.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::error::FetchError;

/// Host fragments that route a URL to the yt-dlp path. Matching is
/// case-insensitive and substring-based, not a host-equality check.
const SOCIAL_MEDIA_HOSTS: &[&str] = &[
    "tiktok.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "reddit.com",
    "snapchat.com",
    "vimeo.com",
];

// TikTok rejects obvious non-browser clients, so yt-dlp is told to look
// like a desktop Chrome.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub fn is_social_media_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    SOCIAL_MEDIA_HOSTS.iter().any(|host| lower.contains(host))
}

#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: reqwest::Client,
    ytdlp_bin: String,
}

impl SourceFetcher {
    pub fn new(ytdlp_bin: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            ytdlp_bin: ytdlp_bin.into(),
        }
    }

    /// Materialize the video behind `url` as raw bytes.
    ///
    /// The direct-GET path returns the response body verbatim regardless
    /// of status code; callers must not assume the bytes are valid video.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if is_social_media_url(url) {
            tracing::info!(url, "social media URL detected, downloading with yt-dlp");
            self.download_with_ytdlp(url).await
        } else {
            tracing::info!(url, "downloading video with direct GET");
            let response = self.http.get(url).send().await?;
            Ok(response.bytes().await?.to_vec())
        }
    }

    async fn download_with_ytdlp(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bin = self.ytdlp_bin.clone();
        let url = url.to_string();
        with_scratch_dir(move |dir| async move {
            run_ytdlp(&bin, &url, &dir).await?;
            read_downloaded_file(&dir).await
        })
        .await
    }
}

async fn run_ytdlp(bin: &str, url: &str, dir: &Path) -> Result<(), FetchError> {
    let output_template = dir.join("video.%(ext)s");

    let output = Command::new(bin)
        .arg("--format")
        .arg("best[ext=mp4]/best")
        .arg("--output")
        .arg(&output_template)
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg("--extractor-args")
        .arg("tiktok:webpage_download_timeout=30")
        .arg("--user-agent")
        .arg(BROWSER_USER_AGENT)
        .arg("--add-headers")
        .arg("Accept:text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .arg("--add-headers")
        .arg("Accept-Language:en-us,en;q=0.5")
        .arg("--add-headers")
        .arg("Sec-Fetch-Mode:navigate")
        .arg(url)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| FetchError::ToolNotAvailable(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("yt-dlp error: {}", stderr);
        return Err(FetchError::Download(stderr.trim().to_string()));
    }

    Ok(())
}

async fn read_downloaded_file(dir: &Path) -> Result<Vec<u8>, FetchError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tracing::debug!(file = %entry.path().display(), "reading downloaded video");
            return Ok(tokio::fs::read(entry.path()).await?);
        }
    }
    Err(FetchError::Download(
        "yt-dlp reported success but produced no file".to_string(),
    ))
}

/// Run `f` with an exclusively-owned scratch directory that is removed
/// once `f` resolves, whether it succeeded or failed. Removal itself is
/// best-effort: a cleanup failure is logged, never surfaced.
pub(crate) async fn with_scratch_dir<T, F, Fut>(f: F) -> Result<T, FetchError>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let dir = tempfile::tempdir()?;
    let result = f(dir.path().to_path_buf()).await;
    if let Err(e) = dir.close() {
        tracing::warn!("failed to remove scratch directory: {}", e);
    }
    result
}
