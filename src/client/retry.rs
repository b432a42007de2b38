//! Retry budget and retry log formatting
//!
//! [`RetryBudget`] turns the configured retry count into an attempt limit,
//! and [`RetryContext`] formats consistent log lines for retried and
//! exhausted requests.

use std::fmt;

use super::ClientError;

/// How many attempts a single logical request may make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    /// At most this many attempts (never less than one)
    Attempts(u32),
    /// Retry until success, absence, a terminal error or cancellation
    Unbounded,
}

impl RetryBudget {
    /// Interpret a configured retry count
    ///
    /// `0` and `1` both mean a single attempt; negative values are unbounded.
    pub fn from_count(retries: i32) -> Self {
        match retries {
            n if n < 0 => RetryBudget::Unbounded,
            0 | 1 => RetryBudget::Attempts(1),
            n => RetryBudget::Attempts(n.unsigned_abs()),
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub fn allows_another(&self, attempt: u32) -> bool {
        match self {
            RetryBudget::Attempts(max) => attempt < *max,
            RetryBudget::Unbounded => true,
        }
    }
}

impl fmt::Display for RetryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryBudget::Attempts(max) => write!(f, "{max}"),
            RetryBudget::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Classification of a failed attempt for user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Transport could not complete the request
    Network,
    /// HTTP 5xx server error
    ServerError(u16),
    /// Non-404 client error or other unexpected status
    UnexpectedStatus(u16),
    /// Body did not decode into the expected shape
    Decode,
    /// Anything that is never retried
    Terminal,
}

impl RetryErrorType {
    /// Classify a client error
    pub fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::Network(_) => Self::Network,
            ClientError::Status { code, .. } if (500..600).contains(code) => {
                Self::ServerError(*code)
            }
            ClientError::Status { code, .. } => Self::UnexpectedStatus(*code),
            ClientError::Decode(_) => Self::Decode,
            _ => Self::Terminal,
        }
    }

    /// User-friendly description used inside retry log messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::UnexpectedStatus(_) => "unexpected status",
            Self::Decode => "malformed response",
            Self::Terminal => "terminal error",
        }
    }
}

/// Context for formatting retry messages
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Budget for this request
    pub budget: RetryBudget,
    /// Type of error that triggered the retry
    pub error_type: RetryErrorType,
    /// Original error message
    pub error_message: String,
    /// Path that failed
    pub endpoint: String,
}

impl RetryContext {
    /// Build a context for a failed attempt
    pub fn new(attempt: u32, budget: RetryBudget, err: &ClientError, endpoint: &str) -> Self {
        Self {
            attempt,
            budget,
            error_type: RetryErrorType::from_error(err),
            error_message: err.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Format retry message with attempt counters
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying {} (attempt {}/{}) after {}: {}",
            self.endpoint,
            self.attempt + 1,
            self.budget,
            self.error_type.description(),
            self.error_message
        )
    }

    /// Format message for an attempt that succeeded after earlier failures
    pub fn format_success(attempt: u32, budget: RetryBudget, endpoint: &str) -> String {
        format!("Request to {endpoint} succeeded on attempt {attempt}/{budget}")
    }

    /// Format final failure summary
    pub fn format_failure(&self) -> String {
        let attempts = if self.attempt == 1 {
            "1 attempt".to_string()
        } else {
            format!("{} attempts", self.attempt)
        };
        format!(
            "Request to {} failed after {}: {}",
            self.endpoint, attempts, self.error_message
        )
    }
}
