use crate::{UrlError, UrlResult};
use url::Url;

/// Path extensions that never lead to page text
const SKIPPED_EXTENSIONS: &[&str] = &[
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "rtf",
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tif", "tiff",
    // archives
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz",
    // audio and video
    "mp3", "wav", "ogg", "mp4", "avi", "mov", "wmv", "webm", "mkv", "flv",
    // binaries and assets
    "exe", "dmg", "msi", "apk", "iso", "css", "js", "woff", "woff2", "ttf", "eot",
];

/// Normalizes a URL string into its frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` are accepted
/// 3. Drop the query string and the fragment
/// 4. Remove trailing slashes from the path (the root becomes `scheme://host`)
///
/// Two links that differ only by query parameters, fragment, or a trailing
/// slash therefore collapse to the same key.
///
/// # Examples
///
/// ```
/// use site_harvest::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/about/?ref=nav#team").unwrap();
/// assert_eq!(url, "https://example.com/about");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(&url)
}

/// Normalizes an already parsed URL, see [`normalize_url`]
pub fn normalize_parsed(url: &Url) -> UrlResult<String> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlError::InvalidScheme(scheme.to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host.to_lowercase(), port),
        None => host.to_lowercase(),
    };

    let path = url.path().trim_end_matches('/');

    Ok(format!("{}://{}{}", scheme, authority, path))
}

/// Returns true when the path ends in an extension that is not page text
pub fn has_skipped_extension(url: &Url) -> bool {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            SKIPPED_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
