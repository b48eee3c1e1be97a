//! `Link` header parsing for cursor-style pagination
//!
//! Format: `<url>; rel="next", <url>; rel="last"`. Only the `next`
//! relation matters; page numbers are never computed locally.

/// URL of the `rel="next"` entry, if any.
pub fn next_link(header: &str) -> Option<String> {
    let mut rest = header;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let end = after.find('>')?;
        let url = &after[..end];
        let tail = &after[end + 1..];
        let params_end = tail.find('<').unwrap_or(tail.len());
        if tail[..params_end].split(';').any(is_rel_next) {
            return Some(url.trim().to_string());
        }
        rest = &tail[params_end..];
    }
    None
}

/// `rel="next"`, `rel=next`, or a space-separated list containing `next`.
fn is_rel_next(param: &str) -> bool {
    let param = param.trim().trim_end_matches(',').trim();
    let Some((key, value)) = param.split_once('=') else {
        return false;
    };
    key.trim().eq_ignore_ascii_case("rel")
        && value
            .trim()
            .trim_matches('"')
            .split_whitespace()
            .any(|rel| rel.eq_ignore_ascii_case("next"))
}
