//! Rate Limiting Module for AgentPDF
//!
//! Provides in-memory rate limiting for WASM and server-side use.
//! Designed for PDF processing, email dispatch, and session management endpoints.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Rate limit configuration for an endpoint
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub limit: u32,
    /// Time window for rate limiting
    pub window: Duration,
    /// Block duration after exceeding limit
    pub block_duration: Duration,
}

impl RateLimitConfig {
    /// Create a new rate limit config
    pub fn new(limit: u32, window_secs: u64, block_secs: u64) -> Self {
        Self {
            limit,
            window: Duration::from_secs(window_secs),
            block_duration: Duration::from_secs(block_secs),
        }
    }

    /// Preset for PDF rendering (10 req/min, 60s block)
    pub fn pdf_render() -> Self {
        Self::new(10, 60, 60)
    }

    /// Preset for session creation (5 req/min, 60s block)
    pub fn session_create() -> Self {
        Self::new(5, 60, 60)
    }

    /// Preset for email dispatch (10 req/hour, 300s block)
    pub fn email_dispatch() -> Self {
        Self::new(10, 3600, 300)
    }

    /// Preset for file upload (5 uploads/10min, 120s block)
    pub fn file_upload() -> Self {
        Self::new(5, 600, 120)
    }
}

/// Entry tracking requests for a single key
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of requests in current window
    count: u32,
    /// When the current window started
    window_start: Instant,
    /// When the block expires (if blocked)
    blocked_until: Option<Instant>,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            count: 1,
            window_start: Instant::now(),
            blocked_until: None,
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed,
    /// Request is rate limited, retry after duration
    Limited { retry_after: Duration },
    /// Client is blocked, blocked for duration
    Blocked { blocked_for: Duration },
}

impl RateLimitResult {
    /// Check if the request is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed)
    }

    /// Get retry/block duration if limited
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitResult::Allowed => None,
            RateLimitResult::Limited { retry_after } => Some(*retry_after),
            RateLimitResult::Blocked { blocked_for } => Some(*blocked_for),
        }
    }
}

/// In-memory rate limiter
///
/// Thread-safe for single-threaded WASM, requires Arc<Mutex> for multi-threaded use.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: HashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Check if a request from the given key is allowed
    ///
    /// If allowed, increments the counter. If not, returns when to retry.
    pub fn check(&mut self, key: &str) -> RateLimitResult {
        let now = Instant::now();

        if let Some(entry) = self.entries.get_mut(key) {
            // Check if blocked
            if let Some(blocked_until) = entry.blocked_until {
                if now < blocked_until {
                    return RateLimitResult::Blocked {
                        blocked_for: blocked_until - now,
                    };
                }
                // Block expired, reset
                entry.blocked_until = None;
                entry.count = 0;
                entry.window_start = now;
            }

            // Check if window expired
            if now.duration_since(entry.window_start) > self.config.window {
                // Reset window
                entry.count = 1;
                entry.window_start = now;
                return RateLimitResult::Allowed;
            }

            // Check limit
            if entry.count >= self.config.limit {
                // Rate exceeded, block the client
                let blocked_until = now + self.config.block_duration;
                entry.blocked_until = Some(blocked_until);
                return RateLimitResult::Blocked {
                    blocked_for: self.config.block_duration,
                };
            }

            // Increment and allow
            entry.count += 1;
            RateLimitResult::Allowed
        } else {
            // First request from this key
            self.entries.insert(key.to_string(), RateLimitEntry::new());
            RateLimitResult::Allowed
        }
    }

    /// Check without incrementing (peek)
    pub fn peek(&self, key: &str) -> RateLimitResult {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if let Some(blocked_until) = entry.blocked_until {
                if now < blocked_until {
                    return RateLimitResult::Blocked {
                        blocked_for: blocked_until - now,
                    };
                }
            }

            if now.duration_since(entry.window_start) > self.config.window {
                return RateLimitResult::Allowed;
            }

            if entry.count >= self.config.limit {
                let remaining = self.config.window - now.duration_since(entry.window_start);
                return RateLimitResult::Limited {
                    retry_after: remaining,
                };
            }

            RateLimitResult::Allowed
        } else {
            RateLimitResult::Allowed
        }
    }

    /// Get current request count for a key
    pub fn count(&self, key: &str) -> u32 {
        self.entries.get(key).map_or(0, |e| e.count)
    }

    /// Reset rate limit for a key (admin override)
    pub fn reset(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Clean up expired entries (call periodically in long-running processes)
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let window = self.config.window;

        self.entries.retain(|_, entry| {
            // Keep if blocked and block not expired
            if let Some(blocked_until) = entry.blocked_until {
                if now < blocked_until {
                    return true;
                }
            }
            // Keep if window not expired
            now.duration_since(entry.window_start) <= window
        });
    }

    /// Get number of tracked keys
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }
}

/// Validate PDF processing limits
pub fn validate_pdf_limits(
    bytes_len: usize,
    page_count: usize,
    object_count: usize,
) -> Result<(), PdfLimitError> {
    const MAX_PDF_SIZE: usize = 50 * 1024 * 1024; // 50 MB
    const MAX_PAGE_COUNT: usize = 500;
    const MAX_OBJECT_COUNT: usize = 100_000;

    if bytes_len > MAX_PDF_SIZE {
        return Err(PdfLimitError::TooLarge {
            size: bytes_len,
            max: MAX_PDF_SIZE,
        });
    }

    if page_count > MAX_PAGE_COUNT {
        return Err(PdfLimitError::TooManyPages {
            count: page_count,
            max: MAX_PAGE_COUNT,
        });
    }

    if object_count > MAX_OBJECT_COUNT {
        return Err(PdfLimitError::TooManyObjects {
            count: object_count,
            max: MAX_OBJECT_COUNT,
        });
    }

    Ok(())
}

/// PDF processing limit errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfLimitError {
    TooLarge { size: usize, max: usize },
    TooManyPages { count: usize, max: usize },
    TooManyObjects { count: usize, max: usize },
}

impl std::fmt::Display for PdfLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLarge { size, max } => {
                write!(f, "PDF too large: {} bytes (max: {} bytes)", size, max)
            }
            Self::TooManyPages { count, max } => {
                write!(f, "Too many pages: {} (max: {})", count, max)
            }
            Self::TooManyObjects { count, max } => {
                write!(f, "Too many objects: {} (max: {})", count, max)
            }
        }
    }
}

impl std::error::Error for PdfLimitError {}

/// Validate email dispatch limits
pub fn validate_email_limits(
    recipient_count: usize,
    body_size: usize,
) -> Result<(), EmailLimitError> {
    const MAX_RECIPIENTS_PER_REQUEST: usize = 10;
    const MAX_EMAIL_SIZE: usize = 500 * 1024; // 500 KB

    if recipient_count > MAX_RECIPIENTS_PER_REQUEST {
        return Err(EmailLimitError::TooManyRecipients {
            count: recipient_count,
            max: MAX_RECIPIENTS_PER_REQUEST,
        });
    }

    if body_size > MAX_EMAIL_SIZE {
        return Err(EmailLimitError::BodyTooLarge {
            size: body_size,
            max: MAX_EMAIL_SIZE,
        });
    }

    Ok(())
}

/// Email dispatch limit errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailLimitError {
    TooManyRecipients { count: usize, max: usize },
    BodyTooLarge { size: usize, max: usize },
}

impl std::fmt::Display for EmailLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyRecipients { count, max } => {
                write!(f, "Too many recipients: {} (max: {})", count, max)
            }
            Self::BodyTooLarge { size, max } => {
                write!(
                    f,
                    "Email body too large: {} bytes (max: {} bytes)",
                    size, max
                )
            }
        }
    }
}

impl std::error::Error for EmailLimitError {}
