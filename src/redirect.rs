/// URL schemes a caller-supplied `next_path` must never carry.
///
/// Matched at the start of the candidate, ASCII-case-insensitively. Anything
/// else (relative paths, protocol-relative `//…`, other schemes) is left for
/// the router to resolve against the app's own origin.
const DISALLOWED_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// Whether a `next_path` candidate may be used as a redirect target verbatim.
#[must_use]
pub fn is_safe_next_path(candidate: &str) -> bool {
    !DISALLOWED_SCHEMES
        .iter()
        .any(|scheme| starts_with_ignore_ascii_case(candidate, scheme))
}

/// Drops empty, unsafe, and malformed `next_path` candidates.
///
/// A malformed candidate is treated as absent, never as an error; callers fall
/// through to workspace-slug resolution. ASCII control characters count as
/// malformed: a target carrying one cannot travel in a `Location` header.
#[must_use]
pub fn sanitize_next_path(candidate: Option<&str>) -> Option<&str> {
    candidate.filter(|path| {
        !path.is_empty()
            && is_safe_next_path(path)
            && !path.bytes().any(|b| b.is_ascii_control())
    })
}

fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_absolute_http_and_https() {
        assert!(!is_safe_next_path("http://evil.example/x"));
        assert!(!is_safe_next_path("https://evil.example/x"));
    }

    #[test]
    fn rejects_ftp() {
        assert!(!is_safe_next_path("ftp://evil.example/x"));
    }

    #[test]
    fn scheme_match_ignores_ascii_case() {
        assert!(!is_safe_next_path("HTTPS://evil.example"));
        assert!(!is_safe_next_path("Http://evil.example"));
        assert!(!is_safe_next_path("FtP://evil.example"));
    }

    #[test]
    fn allows_relative_paths() {
        assert!(is_safe_next_path("/acme"));
        assert!(is_safe_next_path("/acme/projects/1"));
        assert!(is_safe_next_path("profile"));
    }

    #[test]
    fn scheme_check_is_anchored_at_the_start() {
        // Only a leading scheme is an absolute URL; anything later is a path.
        assert!(is_safe_next_path("/redirect?to=https://ok.example"));
        assert!(is_safe_next_path(" https://padded.example"));
    }

    #[test]
    fn sanitize_drops_empty_and_unsafe() {
        assert_eq!(sanitize_next_path(None), None);
        assert_eq!(sanitize_next_path(Some("")), None);
        assert_eq!(sanitize_next_path(Some("https://evil.example")), None);
        assert_eq!(sanitize_next_path(Some("/acme")), Some("/acme"));
    }

    #[test]
    fn sanitize_drops_control_characters() {
        assert_eq!(sanitize_next_path(Some("/x\ny")), None);
        assert_eq!(sanitize_next_path(Some("/x\r\ny")), None);
        assert_eq!(sanitize_next_path(Some("/x\0y")), None);
        assert_eq!(sanitize_next_path(Some("\t/acme")), None);
        assert_eq!(sanitize_next_path(Some("/acme\u{7f}")), None);
    }
}
