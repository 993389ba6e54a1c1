/// Checks whether a URL path contains a segment matching any configured pattern
///
/// A segment matches a pattern when it equals the pattern, its plural form
/// (`post` matches `posts`), or the pattern followed by a `-` or `_` suffix
/// (`article` matches `article-12345`). Matching is case-insensitive on the
/// segment side; patterns are validated to be lowercase.
///
/// # Examples
///
/// ```
/// use gleaner::classify::path_matches;
///
/// let patterns = vec!["news".to_string(), "post".to_string()];
/// assert!(path_matches("/news/2024/landing", &patterns));
/// assert!(path_matches("/posts/hello-world", &patterns));
/// assert!(!path_matches("/newsletter/signup", &patterns));
/// ```
pub fn path_matches(path: &str, patterns: &[String]) -> bool {
    path.split('/')
        .filter(|s| !s.is_empty())
        .any(|segment| {
            let segment = segment.to_ascii_lowercase();
            patterns.iter().any(|p| segment_matches(&segment, p))
        })
}

fn segment_matches(segment: &str, pattern: &str) -> bool {
    if segment == pattern {
        return true;
    }

    match segment.strip_prefix(pattern) {
        Some(rest) => rest == "s" || rest.starts_with('-') || rest.starts_with('_'),
        None => false,
    }
}
