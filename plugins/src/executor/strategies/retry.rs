use std::time::Duration;

use maestro_core::config::RetryConfig;
use maestro_core::executor::traits::RetryStrategy;

pub struct ExponentialBackoff {
    config: RetryConfig,
}

pub struct LinearBackoff {
    config: RetryConfig,
}

impl ExponentialBackoff {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearBackoff {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.config.max_attempts {
            return None;
        }
        let exp = 1u64 << attempt.saturating_sub(1).min(30);
        let delay = self.config.base_delay_ms.saturating_mul(exp);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }
}

impl RetryStrategy for LinearBackoff {
    fn name(&self) -> &str {
        "linear"
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.config.max_attempts {
            return None;
        }
        let delay = self.config.base_delay_ms.saturating_mul(attempt.max(1) as u64);
        let delay = delay.min(self.config.max_delay_ms);
        Some(Duration::from_millis(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(strategy: &str, max_attempts: u32, base: u64, max: u64) -> RetryConfig {
        RetryConfig {
            strategy: strategy.to_string(),
            max_attempts,
            base_delay_ms: base,
            max_delay_ms: max,
        }
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let strategy = ExponentialBackoff::new(cfg("exponential-backoff", 4, 100, 300));
        assert_eq!(strategy.next_delay(1).unwrap().as_millis(), 100);
        assert_eq!(strategy.next_delay(2).unwrap().as_millis(), 200);
        assert_eq!(strategy.next_delay(3).unwrap().as_millis(), 300);
        assert_eq!(strategy.next_delay(4), None);
    }

    #[test]
    fn linear_grows_with_the_attempt() {
        let strategy = LinearBackoff::new(cfg("linear", 4, 50, 200));
        assert_eq!(strategy.next_delay(1).unwrap().as_millis(), 50);
        assert_eq!(strategy.next_delay(2).unwrap().as_millis(), 100);
        assert_eq!(strategy.next_delay(3).unwrap().as_millis(), 150);
        assert_eq!(strategy.next_delay(4), None);
    }
}
