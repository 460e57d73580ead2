//! Cross-origin policy built from the configured origin list.

use axum::http::{HeaderValue, request::Parts};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// One entry of the allowed-origin list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginPattern {
    Any,
    Exact(String),
    /// `scheme://*.suffix`, stored as `scheme://` and `.suffix`.
    Subdomain {
        scheme: String,
        suffix: String,
    },
}

impl OriginPattern {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed == "*" {
            return Self::Any;
        }
        let wildcard = trimmed.split_once("://").and_then(|(scheme, host)| {
            host.strip_prefix('*').map(|suffix| Self::Subdomain {
                scheme: format!("{scheme}://"),
                suffix: suffix.to_owned(),
            })
        });
        wildcard.unwrap_or_else(|| Self::Exact(trimmed.to_owned()))
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == origin,
            Self::Subdomain { scheme, suffix } => origin
                .strip_prefix(scheme.as_str())
                .and_then(|host| host.strip_suffix(suffix.as_str()))
                .is_some_and(|label| !label.is_empty()),
        }
    }
}

/// Builds a credentialed CORS layer that echoes the origin when it matches
/// one of `origins`.
pub(super) fn cors_layer(origins: &[String]) -> CorsLayer {
    let patterns: Vec<OriginPattern> = origins.iter().map(|raw| OriginPattern::parse(raw)).collect();
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        origin
            .to_str()
            .is_ok_and(|value| patterns.iter().any(|pattern| pattern.matches(value)))
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:3000", "http://localhost:3000", true)]
    #[case("http://localhost:3000/", "http://localhost:3000", true)]
    #[case("http://localhost:3000", "http://localhost:5173", false)]
    #[case("https://*.vercel.app", "https://preview-42.vercel.app", true)]
    #[case("https://*.vercel.app", "https://vercel.app", false)]
    #[case("https://*.vercel.app", "http://preview.vercel.app", false)]
    #[case("https://*.vercel.app", "https://preview.vercel.app.evil.com", false)]
    #[case("*", "https://anything.example", true)]
    fn origin_patterns_match(#[case] pattern: &str, #[case] origin: &str, #[case] expected: bool) {
        assert_eq!(OriginPattern::parse(pattern).matches(origin), expected);
    }

    #[rstest]
    fn wildcard_entries_parse_into_scheme_and_suffix() {
        assert_eq!(
            OriginPattern::parse("https://*.vercel.app"),
            OriginPattern::Subdomain {
                scheme: "https://".to_owned(),
                suffix: ".vercel.app".to_owned(),
            }
        );
    }
}
