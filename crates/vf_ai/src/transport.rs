use std::time::Duration;

use serde::de::DeserializeOwned;
use vf_core::error::AppError;

/// Validated `http(s)://host[:port]` base URL with no credentials, path or query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let base_url = raw.trim().trim_end_matches('/').to_string();
        let invalid = |why: &str| {
            AppError::new("AI_ENDPOINT_INVALID", "Inference base URL is not a valid http(s) origin")
                .with_details(format!("base_url={base_url}; reason={why}"))
        };

        let authority = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"))
            .ok_or_else(|| invalid("scheme must be http or https"))?;
        if authority.is_empty() {
            return Err(invalid("missing host"));
        }
        if authority.contains(['/', '@', '?', '#']) || authority.chars().any(char::is_whitespace) {
            return Err(invalid("only scheme, host and port are allowed"));
        }

        let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
            let close = rest.find(']').ok_or_else(|| invalid("unterminated IPv6 host"))?;
            let after = &rest[close + 1..];
            let port = match after {
                "" => None,
                p => Some(p.strip_prefix(':').ok_or_else(|| invalid("junk after IPv6 host"))?),
            };
            (&rest[..close], port)
        } else {
            match authority.split_once(':') {
                Some((h, p)) => (h, Some(p)),
                None => (authority, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if let Some(p) = port {
            match p.parse::<u16>() {
                Ok(n) if n > 0 => {}
                _ => return Err(invalid("port must be within 1..=65535")),
            }
        }

        Ok(Self { base_url })
    }

    pub fn as_str(&self) -> &str {
        &self.base_url
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Blocking JSON POST. Transport failures and 5xx are retryable; other statuses are not.
pub(crate) fn post_json<T: DeserializeOwned>(
    url: &str,
    body: serde_json::Value,
    timeout: Duration,
    code: &str,
    what: &str,
) -> Result<T, AppError> {
    let resp = ureq::post(url).timeout(timeout).send_json(body);

    match resp {
        Ok(r) => r.into_json::<T>().map_err(|e| {
            AppError::new(code, format!("Failed to decode {what} response"))
                .with_details(format!("url={url}; err={e}"))
        }),
        Err(ureq::Error::Status(status, r)) => {
            let body = r.into_string().unwrap_or_default();
            Err(AppError::new(code, format!("{what} request failed"))
                .with_details(format!("url={url}; status={status}; body={}", snippet(&body, 200)))
                .with_retryable(status >= 500))
        }
        Err(e) => Err(AppError::new(code, format!("Failed to call {what} endpoint"))
            .with_details(format!("url={url}; err={e}"))
            .with_retryable(true)),
    }
}

/// Prefix of `text` of at most `max_bytes`, cut on a char boundary.
pub(crate) fn snippet(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_origins() {
        assert!(Endpoint::parse("http://127.0.0.1:11434").is_ok());
        assert!(Endpoint::parse("http://localhost").is_ok());
        assert!(Endpoint::parse("https://inference.internal:8443").is_ok());
        assert!(Endpoint::parse("http://[::1]:11434").is_ok());
        assert_eq!(
            Endpoint::parse("http://127.0.0.1:11434/").unwrap().as_str(),
            "http://127.0.0.1:11434"
        );
    }

    #[test]
    fn rejects_malformed_origins() {
        for bad in [
            "127.0.0.1:11434",
            "ftp://127.0.0.1",
            "http://",
            "http://127.0.0.1:",
            "http://127.0.0.1:0",
            "http://127.0.0.1:99999",
            "http://127.0.0.1:11434/api",
            "http://user@127.0.0.1:11434",
            "http://[::1",
            "http://[::1]x",
        ] {
            let err = Endpoint::parse(bad).expect_err(bad);
            assert_eq!(err.code, "AI_ENDPOINT_INVALID", "{bad}");
        }
    }

    #[test]
    fn join_builds_api_urls() {
        let ep = Endpoint::parse("http://127.0.0.1:11434/").unwrap();
        assert_eq!(ep.join("/api/generate"), "http://127.0.0.1:11434/api/generate");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("héllo", 2), "h");
        assert_eq!(snippet("abc", 10), "abc");
    }
}
