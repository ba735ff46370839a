// Input sanitization, validation, and request rate limiting.
//
// Everything that enters an LLM prompt goes through `validate` then
// `sanitize`; everything that comes back from the LLM goes through
// `sanitize` before it reaches the UI or storage.

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("input must be a non-empty string")]
    Empty,

    #[error("minimum {min} characters required")]
    TooShort { min: usize },

    #[error("maximum {max} characters allowed")]
    TooLong { max: usize },

    #[error("input contains potentially unsafe content")]
    Unsafe,
}

// ---------------------------------------------------------------------------
// Sanitization
// ---------------------------------------------------------------------------

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"));

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static SCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:javascript|vbscript):").expect("valid regex"));

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("valid regex"));

static DATA_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)data:[a-z0-9.+/-]*;base64,").expect("valid regex"));

/// Patterns that disqualify an input outright rather than being stripped.
static SUSPICIOUS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)eval\s*\(",
        r"(?i)function\s*\(",
        r"(?i)setTimeout\s*\(",
        r"(?i)setInterval\s*\(",
        r"(?i)<iframe",
        r"(?i)<object",
        r"(?i)<embed",
        r"(?is)data:.*base64",
        r"(?i)vbscript:",
        r"(?i)onload\s*=",
        r"(?i)onerror\s*=",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Strip markup and script vectors from `input` and truncate to `max_chars`.
///
/// Removal order: script blocks, remaining tags, script URL schemes, inline
/// event handlers, non-image base64 data URIs. The result is trimmed and
/// truncated on a character boundary.
pub fn sanitize(input: &str, max_chars: usize) -> String {
    let mut s = input.trim().to_string();

    s = SCRIPT_BLOCK.replace_all(&s, "").into_owned();
    s = HTML_TAG.replace_all(&s, "").into_owned();
    s = SCRIPT_SCHEME.replace_all(&s, "").into_owned();
    s = EVENT_HANDLER.replace_all(&s, "").into_owned();
    // Keep inline images; everything else base64-encoded is stripped.
    s = DATA_URI
        .replace_all(&s, |caps: &regex::Captures<'_>| {
            let m = caps.get(0).map(|m| m.as_str()).unwrap_or("");
            if m.to_ascii_lowercase().starts_with("data:image/") {
                m.to_string()
            } else {
                String::new()
            }
        })
        .into_owned();

    truncate_chars(&s, max_chars).trim().to_string()
}

/// Truncate `s` to at most `max_chars` characters, never splitting a
/// multi-byte character.
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a user-provided string against length bounds and the
/// suspicious-pattern list. Returns the rule that failed.
pub fn validate(input: &str, min_chars: usize, max_chars: usize) -> Result<(), GuardError> {
    if input.is_empty() {
        return Err(GuardError::Empty);
    }

    let len = input.chars().count();
    if len < min_chars {
        return Err(GuardError::TooShort { min: min_chars });
    }
    if len > max_chars {
        return Err(GuardError::TooLong { max: max_chars });
    }

    if SUSPICIOUS.iter().any(|p| p.is_match(input)) {
        return Err(GuardError::Unsafe);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Rate limiter
// ---------------------------------------------------------------------------

/// Process-local sliding-window rate limiter.
///
/// Holds the timestamps of recent requests; a request is admitted when fewer
/// than `max_requests` timestamps fall within the trailing `window`. There is
/// no cross-process or persistent coordination.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Vec<Instant>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            requests: Vec::new(),
        }
    }

    /// Admit or reject a request at time `now`. Admission records the
    /// timestamp.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.evict(now);
        if self.requests.len() >= self.max_requests {
            return false;
        }
        self.requests.push(now);
        true
    }

    /// Admit or reject a request now.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// How many requests remain in the current window.
    pub fn remaining(&mut self) -> usize {
        self.evict(Instant::now());
        self.max_requests.saturating_sub(self.requests.len())
    }

    /// Time until the next request would be admitted. Zero when one would be
    /// admitted immediately.
    pub fn retry_after(&mut self) -> Duration {
        let now = Instant::now();
        self.evict(now);
        if self.requests.len() < self.max_requests {
            return Duration::ZERO;
        }
        // The oldest recorded timestamp is the next to leave the window.
        match self.requests.first() {
            Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }

    fn evict(&mut self, now: Instant) {
        let window = self.window;
        self.requests
            .retain(|t| now.duration_since(*t) < window);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
