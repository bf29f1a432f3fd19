use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One saved link. `id` and `created_at` are assigned by the store at
/// insertion; `created_at` (descending) is the only sort key. Serde derives
/// are here because rows ride the change-feed wire as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Trims the input and prefixes `https://` when no scheme is present.
/// An existing `http://` or `https://` scheme is never altered.
/// Returns `None` for an empty submission.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

/// Blank titles fall back to the (already normalized) URL.
pub fn title_or_url(title: &str, url: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        url.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_scheme() {
        assert_eq!(
            normalize_url("example.com").as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn existing_schemes_are_preserved() {
        assert_eq!(
            normalize_url("http://example.com").as_deref(),
            Some("http://example.com")
        );
        assert_eq!(
            normalize_url("https://example.com/a?b=c").as_deref(),
            Some("https://example.com/a?b=c")
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            normalize_url("  example.com/path  ").as_deref(),
            Some("https://example.com/path")
        );
    }

    #[test]
    fn empty_submission_is_rejected() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
    }

    #[test]
    fn blank_title_falls_back_to_url() {
        assert_eq!(
            title_or_url("  ", "https://example.com"),
            "https://example.com"
        );
        assert_eq!(title_or_url("Docs", "https://example.com"), "Docs");
    }
}
