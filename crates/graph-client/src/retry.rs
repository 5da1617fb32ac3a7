//! Retry policy for lead page requests.

use std::time::Duration;

use crate::error::GraphError;

/// What to do when a page request fails.
///
/// The default is [`RetryPolicy::None`]: the first failure aborts the fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    None,
    /// Retry transient failures with delays of `base_delay * 2^n`.
    Exponential {
        max_retries: u32,
        base_delay: Duration,
    },
}

impl RetryPolicy {
    /// Exponential backoff policy.
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        if max_retries == 0 {
            return RetryPolicy::None;
        }
        RetryPolicy::Exponential {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based), or `None` to give up.
    pub fn delay_for(&self, attempt: u32, err: &GraphError) -> Option<Duration> {
        match *self {
            RetryPolicy::None => None,
            RetryPolicy::Exponential {
                max_retries,
                base_delay,
            } => {
                if attempt == 0 || attempt > max_retries || !err.is_transient() {
                    return None;
                }
                let factor = 2u32.saturating_pow(attempt - 1);
                Some(base_delay.saturating_mul(factor))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> GraphError {
        GraphError::upstream(503, "unavailable")
    }

    #[test]
    fn test_none_never_retries() {
        assert_eq!(RetryPolicy::None.delay_for(1, &server_error()), None);
    }

    #[test]
    fn test_exponential_doubles() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1, &server_error()), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(2, &server_error()), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for(3, &server_error()), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for(4, &server_error()), None);
    }

    #[test]
    fn test_exponential_skips_permanent_errors() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1, &GraphError::upstream(400, "{}")), None);
    }

    #[test]
    fn test_zero_retries_is_none() {
        assert_eq!(
            RetryPolicy::exponential(0, Duration::from_millis(100)),
            RetryPolicy::None
        );
    }
}
