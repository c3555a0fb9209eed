//! Sliding-window rate limiter for provider calls.
//!
//! One limiter is shared (via `Arc`) across every request in the process.
//! Each provider has its own window of recent attempt timestamps; a call is
//! allowed when fewer than `max_requests` attempts fall inside the window.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::provider::ProviderId;
use crate::settings::{self, ConfigProvider};

pub const DEFAULT_MAX_REQUESTS: u32 = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Tunables for [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimitConfig {
    /// Read `rate_limit_max_requests` / `rate_limit_window_secs`, falling back
    /// to the defaults for unset or unparsable values. A zero window is
    /// treated as unset.
    pub fn from_settings(settings: &dyn ConfigProvider) -> Self {
        let defaults = Self::default();
        let max_requests = settings
            .get_option(settings::RATE_LIMIT_MAX_REQUESTS)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.max_requests);
        let window = settings
            .get_option(settings::RATE_LIMIT_WINDOW_SECS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.window);
        Self {
            max_requests,
            window,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Limiter
// ---------------------------------------------------------------------------

/// Process-wide per-provider limiter. Check-and-record happens under one
/// lock, so concurrent callers never exceed the budget.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<ProviderId, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        debug!(
            max_requests = config.max_requests,
            window_secs = config.window.as_secs(),
            "creating rate limiter"
        );
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderId, VecDeque<Instant>>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop timestamps that have left the window ending at `now`.
    fn prune(window: &mut VecDeque<Instant>, now: Instant, span: Duration) {
        while let Some(oldest) = window.front() {
            if now.saturating_duration_since(*oldest) >= span {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record an attempt for `provider` if the budget allows it.
    ///
    /// Denied attempts are not recorded.
    pub fn allow(&self, provider: ProviderId) -> bool {
        let now = self.clock.now();
        let mut windows = self.lock();
        let window = windows.entry(provider).or_default();
        Self::prune(window, now, self.config.window);

        let used = window.len();
        if used >= self.config.max_requests as usize {
            warn!(
                provider = %provider,
                used,
                limit = self.config.max_requests,
                "rate limit reached"
            );
            return false;
        }

        window.push_back(now);
        debug!(
            provider = %provider,
            used = used + 1,
            limit = self.config.max_requests,
            "rate limit slot consumed"
        );
        true
    }

    /// Attempts still available for `provider` in the current window.
    pub fn remaining(&self, provider: ProviderId) -> u32 {
        let now = self.clock.now();
        let mut windows = self.lock();
        let used = match windows.get_mut(&provider) {
            Some(window) => {
                Self::prune(window, now, self.config.window);
                window.len()
            }
            None => 0,
        };
        let used = u32::try_from(used).unwrap_or(u32::MAX);
        self.config.max_requests.saturating_sub(used)
    }

    /// Forget all recorded attempts for `provider`.
    pub fn reset(&self, provider: ProviderId) {
        self.lock().remove(&provider);
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MapConfig;

    fn manual_limiter(max: u32, window_secs: u64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(
            RateLimitConfig {
                max_requests: max,
                window: Duration::from_secs(window_secs),
            },
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn allows_n_then_denies_until_window_passes() {
        let (limiter, clock) = manual_limiter(10, 60);
        for i in 0..10 {
            assert!(limiter.allow(ProviderId::OpenAi), "call {i} should pass");
        }
        assert!(!limiter.allow(ProviderId::OpenAi));
        assert_eq!(limiter.remaining(ProviderId::OpenAi), 0);

        clock.advance(Duration::from_secs(59));
        assert!(!limiter.allow(ProviderId::OpenAi));

        clock.advance(Duration::from_secs(1));
        assert!(limiter.allow(ProviderId::OpenAi));
    }

    #[test]
    fn window_slides_per_timestamp() {
        let (limiter, clock) = manual_limiter(2, 60);
        assert!(limiter.allow(ProviderId::Gemini));
        clock.advance(Duration::from_secs(30));
        assert!(limiter.allow(ProviderId::Gemini));
        assert!(!limiter.allow(ProviderId::Gemini));

        // First attempt expires; the second is still in the window.
        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.remaining(ProviderId::Gemini), 1);
        assert!(limiter.allow(ProviderId::Gemini));
        assert!(!limiter.allow(ProviderId::Gemini));
    }

    #[test]
    fn providers_are_independent() {
        let (limiter, _clock) = manual_limiter(1, 60);
        assert!(limiter.allow(ProviderId::OpenAi));
        assert!(!limiter.allow(ProviderId::OpenAi));
        assert!(limiter.allow(ProviderId::DeepSeek));
        assert_eq!(limiter.remaining(ProviderId::Gemini), 1);
    }

    #[test]
    fn denied_attempts_are_not_recorded() {
        let (limiter, clock) = manual_limiter(1, 10);
        assert!(limiter.allow(ProviderId::OpenAi));
        clock.advance(Duration::from_secs(5));
        assert!(!limiter.allow(ProviderId::OpenAi));
        clock.advance(Duration::from_secs(5));
        // Only the first attempt counted, and it has now expired.
        assert!(limiter.allow(ProviderId::OpenAi));
    }

    #[test]
    fn reset_clears_the_window() {
        let (limiter, _clock) = manual_limiter(1, 60);
        assert!(limiter.allow(ProviderId::OpenAi));
        limiter.reset(ProviderId::OpenAi);
        assert_eq!(limiter.remaining(ProviderId::OpenAi), 1);
        assert!(limiter.allow(ProviderId::OpenAi));
    }

    #[test]
    fn zero_budget_denies_everything() {
        let (limiter, _clock) = manual_limiter(0, 60);
        assert!(!limiter.allow(ProviderId::OpenAi));
    }

    #[test]
    fn shared_across_threads() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window: Duration::from_secs(3600),
        }));
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.allow(ProviderId::OpenAi))
            })
            .collect();
        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(allowed, 5);
    }

    #[test]
    fn config_from_settings() {
        let cfg = RateLimitConfig::from_settings(&MapConfig::new());
        assert_eq!(cfg, RateLimitConfig::default());

        let settings = MapConfig::new()
            .with(settings::RATE_LIMIT_MAX_REQUESTS, "3")
            .with(settings::RATE_LIMIT_WINDOW_SECS, "120");
        let cfg = RateLimitConfig::from_settings(&settings);
        assert_eq!(cfg.max_requests, 3);
        assert_eq!(cfg.window, Duration::from_secs(120));

        let settings = MapConfig::new()
            .with(settings::RATE_LIMIT_MAX_REQUESTS, "lots")
            .with(settings::RATE_LIMIT_WINDOW_SECS, "0");
        assert_eq!(
            RateLimitConfig::from_settings(&settings),
            RateLimitConfig::default()
        );
    }
}
