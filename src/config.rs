// Environment-derived configuration, read once at startup.
//
// Provider clients are constructed from these values in main and handed
// to the invokers; nothing reads process environment at call time.

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub fal_api_key: Option<String>,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Path to the yt-dlp executable.
    pub ytdlp_bin: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let default_model = std::env::var("GEMINI_MODEL")
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let ytdlp_bin = std::env::var("YTDLP_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "yt-dlp".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            fal_api_key: std::env::var("FAL_KEY").ok().filter(|k| !k.is_empty()),
            default_model,
            ytdlp_bin,
            port,
        }
    }
}
