use thiserror::Error;
use url::Url;

/// Errors from validating the configured server URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validate a cafeteria server URL from config.
///
/// Accepts http and https; `Url::parse` already requires a host for those
/// schemes. Unlike a URL taken from remote content, the server URL is the
/// user's own configuration, so localhost and private addresses are
/// deliberately allowed: campus cafeteria servers live on LAN addresses,
/// and the test suite points the client at 127.0.0.1.
pub fn validate_server_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}
