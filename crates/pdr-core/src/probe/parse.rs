//! Parse HTTP response header lines into the fields a probe needs.

/// Headers of the final response in a (possibly redirected) exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ResponseHeaders {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Parse collected header lines. libcurl hands us the headers of every
/// response in a redirect chain; each status line starts a fresh block so
/// only the last response's headers survive.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut out = ResponseHeaders::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            out = ResponseHeaders::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-type") && !value.is_empty() {
                out.content_type = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    out.content_length = Some(n);
                }
            }
        }
    }

    out
}
