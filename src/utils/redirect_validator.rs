use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// Control characters, encoded line breaks / nulls, bidi and invisible spacing
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)[\x00-\x1F\x7F-\x9F]|%(?:00|0[aAdD]|09)",
        r"|[\u{200E}\u{200F}\u{2060}-\u{2064}\u{2000}-\u{200A}]",
    ))
    .unwrap()
});

// Reliers are only ever sent back over the web
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

const MAX_REDIRECT_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("redirect URI is too long")]
    TooLong,
    #[error("redirect URI could not be parsed")]
    Unparseable,
    #[error("redirect URI scheme `{0}` is not allowed")]
    Scheme(String),
    #[error("redirect URI has no host")]
    MissingHost,
    #[error("redirect URI contains suspicious characters")]
    Suspicious,
}

/// Validate the relying-party redirect returned when an OAuth flow finishes.
///
/// The redirect must be an absolute `http`/`https` URL with a host and must
/// not smuggle control characters, raw or percent-encoded.
///
/// # Errors
///
/// Returns the first rule the redirect violates.
pub fn validate_relier_redirect(redirect: &str) -> Result<String, RedirectError> {
    debug!("Validating relier redirect URI");

    if redirect.len() > MAX_REDIRECT_LENGTH {
        warn!("Excessively long relier redirect: {} characters", redirect.len());
        return Err(RedirectError::TooLong);
    }

    for variant in decoded_variants(redirect) {
        if SUSPICIOUS_PATTERN.is_match(&variant) {
            warn!("Suspicious pattern detected in relier redirect");
            return Err(RedirectError::Suspicious);
        }
    }

    // Browsers read `\` as `/` in the authority and path; query values may carry it
    if authority_and_path(redirect).contains('\\') {
        warn!("Backslash detected in relier redirect authority or path");
        return Err(RedirectError::Suspicious);
    }

    let parsed = url::Url::parse(redirect).map_err(|e| {
        warn!("Failed to parse relier redirect: {e}");
        RedirectError::Unparseable
    })?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        warn!("Invalid scheme '{}' in relier redirect", parsed.scheme());
        return Err(RedirectError::Scheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(RedirectError::MissingHost);
    }

    Ok(redirect.to_string())
}

/// Everything before the query or fragment, undecoded
fn authority_and_path(redirect: &str) -> &str {
    redirect
        .find(['?', '#'])
        .map_or(redirect, |end| &redirect[..end])
}

/// The raw value plus its single and double URL-decoded forms, when they differ
fn decoded_variants(value: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(3);
    variants.push(value.to_string());

    if let Ok(decoded) = urlencoding::decode(value) {
        let decoded = decoded.into_owned();
        if decoded != value {
            if let Ok(double_decoded) = urlencoding::decode(&decoded) {
                let double_decoded = double_decoded.into_owned();
                if double_decoded != decoded {
                    variants.push(double_decoded);
                }
            }
            variants.push(decoded);
        }
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legitimate_relier_redirects() {
        let redirects = [
            "https://rp.example.com/oauth/callback?code=abc&state=xyz",
            "http://localhost:8080/api/oauth?code=abc",
            concat!(
                "https://monitor.example.org/oauth/success/dcdb5ae7add825d2",
                "?code=1&state=2&action=signin"
            ),
        ];

        for redirect in redirects {
            assert_eq!(
                validate_relier_redirect(redirect),
                Ok(redirect.to_string()),
                "Legitimate redirect should be allowed: {redirect}"
            );
        }
    }

    #[test]
    fn test_dangerous_schemes_blocked() {
        for redirect in [
            "javascript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "file:///etc/passwd",
            "ftp://evil.com",
        ] {
            assert!(
                matches!(validate_relier_redirect(redirect), Err(RedirectError::Scheme(_))),
                "Dangerous scheme should be blocked: {redirect}"
            );
        }
    }

    #[test]
    fn test_relative_redirects_blocked() {
        assert_eq!(
            validate_relier_redirect("/settings"),
            Err(RedirectError::Unparseable)
        );
    }

    #[test]
    fn test_encoded_control_characters_blocked() {
        for redirect in [
            "https://rp.example.com/cb%0d%0aSet-Cookie:x",
            "https://rp.example.com/cb%250a",
            "https://rp.example.com/cb\\evil",
        ] {
            assert_eq!(
                validate_relier_redirect(redirect),
                Err(RedirectError::Suspicious),
                "Encoded control characters should be blocked: {redirect}"
            );
        }
    }

    #[test]
    fn test_backslash_in_authority_blocked() {
        assert_eq!(
            validate_relier_redirect("https://rp.example.com\\@evil.example.com/cb"),
            Err(RedirectError::Suspicious)
        );
    }

    #[test]
    fn test_encoded_backslash_in_state_allowed() {
        // JSON state {"a":"b\c"}
        let redirect = "https://rp.example.com/cb?code=abc&state=%7B%22a%22%3A%22b%5Cc%22%7D";
        assert_eq!(validate_relier_redirect(redirect), Ok(redirect.to_string()));
    }

    #[test]
    fn test_encoded_line_break_in_state_blocked() {
        assert_eq!(
            validate_relier_redirect("https://rp.example.com/cb?state=a%0d%0aSet-Cookie:x"),
            Err(RedirectError::Suspicious)
        );
    }

    #[test]
    fn test_overlong_redirect_blocked() {
        let redirect = format!("https://rp.example.com/{}", "a".repeat(MAX_REDIRECT_LENGTH));
        assert_eq!(validate_relier_redirect(&redirect), Err(RedirectError::TooLong));
    }
}
