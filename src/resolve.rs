/// Make an image reference absolute against the page host.
///
/// Anything starting with `http` is taken as already absolute. Everything else
/// is glued onto the host as a protocol-relative URL, verbatim: no `..`
/// collapsing, no slash deduplication, query strings left alone.
pub fn resolve(reference: &str, host: &str) -> String {
    if reference.starts_with("http") {
        return reference.to_string();
    }
    format!("//{}/{}", host, reference)
}

/// Final `/`-delimited segment of a URL. A URL without `/` is its own name;
/// a trailing slash yields an empty name.
pub fn image_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
