/// Request URLs are the base URL followed by the path, with no separator
/// handling. `("http://x", "/a")` and `("http://x/", "a")` both give `http://x/a`.
pub(crate) fn request_url(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}
