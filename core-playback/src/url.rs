//! Audio URL expiry checks.
//!
//! Storage-backed audio URLs are signed with a limited lifetime (an `exp`
//! query parameter holding a Unix timestamp). Once expired they return 403
//! and playback dies mid-session, so the player checks ahead of need and
//! asks for a refresh shortly before the deadline rather than after it.

use bridge_traits::time::Clock;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Refresh is requested this long before the signed URL expires.
pub const URL_REFRESH_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Result of checking an audio URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCheck {
    /// Whether the URL can be played right now.
    pub is_valid: bool,
    /// Whether a fresh URL should be minted (expired or expiring soon).
    pub needs_refresh: bool,
    /// Expiry deadline for signed URLs.
    pub expires_at: Option<DateTime<Utc>>,
}

impl UrlCheck {
    fn invalid() -> Self {
        Self {
            is_valid: false,
            needs_refresh: true,
            expires_at: None,
        }
    }
}

/// Pieces of a storage object URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedStorageUrl {
    bucket: String,
    path: String,
    signed: bool,
    expires_at_unix: Option<i64>,
}

/// Parse a storage object URL of the form
/// `https://{host}/storage/v1/object/public/{bucket}/{path}` or
/// `.../object/sign/{bucket}/{path}?token=...&exp=...`.
fn parse_storage_url(raw: &str) -> Option<ParsedStorageUrl> {
    let url = Url::parse(raw).ok()?;

    let rest = url.path().split("/storage/v1/object/").nth(1)?;
    let mut segments = rest.split('/');
    let kind = segments.next()?;
    let signed = match kind {
        "public" => false,
        "sign" => true,
        _ => return None,
    };
    let bucket = segments.next()?.to_string();
    let path = segments.collect::<Vec<_>>().join("/");
    if path.is_empty() {
        return None;
    }

    let expires_at_unix = url
        .query_pairs()
        .find(|(key, _)| key == "exp")
        .and_then(|(_, value)| value.parse::<i64>().ok());

    Some(ParsedStorageUrl {
        bucket,
        path,
        signed,
        expires_at_unix,
    })
}

/// Check whether an audio URL is playable and whether it should be
/// refreshed.
///
/// Unparsable URLs are reported invalid; public (unsigned) URLs are always
/// valid; signed URLs go through the expiry ladder.
pub fn check_audio_url(raw: &str, clock: &dyn Clock) -> UrlCheck {
    if raw.is_empty() {
        return UrlCheck::invalid();
    }

    let Some(parsed) = parse_storage_url(raw) else {
        warn!(url = raw, "audio URL does not match storage layout");
        return UrlCheck::invalid();
    };

    let Some(exp) = parsed.expires_at_unix else {
        // Public object URL, never expires.
        return UrlCheck {
            is_valid: true,
            needs_refresh: false,
            expires_at: None,
        };
    };

    let expires_at = Utc.timestamp_opt(exp, 0).single();
    let now = clock.unix_timestamp();
    let until_expiry = exp - now;

    debug!(
        bucket = %parsed.bucket,
        path = %parsed.path,
        signed = parsed.signed,
        seconds_until_expiry = until_expiry,
        "audio URL expiry check"
    );

    if until_expiry <= 0 {
        warn!(url = raw, "audio URL has expired");
        return UrlCheck {
            is_valid: false,
            needs_refresh: true,
            expires_at,
        };
    }

    if until_expiry < URL_REFRESH_THRESHOLD.as_secs() as i64 {
        UrlCheck {
            is_valid: true,
            needs_refresh: true,
            expires_at,
        }
    } else {
        UrlCheck {
            is_valid: true,
            needs_refresh: false,
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FixedClock {
        now: Mutex<i64>,
    }

    impl FixedClock {
        fn at(unix: i64) -> Self {
            Self {
                now: Mutex::new(unix),
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(*self.now.lock(), 0).unwrap()
        }
    }

    fn signed_url(exp: i64) -> String {
        format!("https://proj.storage.example/storage/v1/object/sign/audio/track.mp3?token=abc&exp={exp}")
    }

    #[test]
    fn empty_and_garbage_urls_are_invalid() {
        let clock = FixedClock::at(1_000_000);
        assert_eq!(check_audio_url("", &clock), UrlCheck::invalid());
        assert_eq!(check_audio_url("not a url", &clock), UrlCheck::invalid());
        assert_eq!(
            check_audio_url("https://example.com/some/file.mp3", &clock),
            UrlCheck::invalid()
        );
    }

    #[test]
    fn public_url_is_always_valid() {
        let clock = FixedClock::at(1_000_000);
        let check = check_audio_url(
            "https://proj.storage.example/storage/v1/object/public/audio/track.mp3",
            &clock,
        );
        assert!(check.is_valid);
        assert!(!check.needs_refresh);
        assert_eq!(check.expires_at, None);
    }

    #[test]
    fn expired_url_needs_refresh() {
        let clock = FixedClock::at(1_000_000);
        let check = check_audio_url(&signed_url(999_999), &clock);
        assert!(!check.is_valid);
        assert!(check.needs_refresh);
        assert!(check.expires_at.is_some());
    }

    #[test]
    fn url_expiring_soon_is_valid_but_flagged() {
        let clock = FixedClock::at(1_000_000);
        // Five minutes left, under the ten-minute threshold.
        let check = check_audio_url(&signed_url(1_000_000 + 300), &clock);
        assert!(check.is_valid);
        assert!(check.needs_refresh);
    }

    #[test]
    fn fresh_url_passes_clean() {
        let clock = FixedClock::at(1_000_000);
        let check = check_audio_url(&signed_url(1_000_000 + 3_600), &clock);
        assert!(check.is_valid);
        assert!(!check.needs_refresh);
    }

    #[test]
    fn parses_bucket_and_path() {
        let parsed = parse_storage_url(&signed_url(123)).unwrap();
        assert_eq!(parsed.bucket, "audio");
        assert_eq!(parsed.path, "track.mp3");
        assert!(parsed.signed);
        assert_eq!(parsed.expires_at_unix, Some(123));
    }
}
