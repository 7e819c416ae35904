const HTTPS: &str = "https://";
const HTTP: &str = "http://";

/// Canonical form of a user-entered site address.
///
/// Trims, lower-cases, prepends `https://` unless an http(s) scheme is
/// already present, and strips every trailing `/`. Purely lexical: malformed
/// input passes through and is left for the checker to reject.
pub fn normalize_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let (scheme, rest) = if let Some(rest) = lowered.strip_prefix(HTTPS) {
        (HTTPS, rest)
    } else if let Some(rest) = lowered.strip_prefix(HTTP) {
        (HTTP, rest)
    } else {
        (HTTPS, lowered.as_str())
    };
    // Whitespace is stripped together with the slashes so that "a.com /"
    // does not leave a trailing blank behind for the next pass to trim.
    let rest = rest.trim_end_matches(|c: char| c == '/' || c.is_whitespace());
    format!("{scheme}{rest}")
}

/// Host part of a URL for display, or the input unchanged if it does not parse.
pub fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| url.to_string())
}
