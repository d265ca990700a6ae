use std::time::Duration;

/// Engine tuning, read from `CAPACITYD_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Default wait for a per-engineer section when the request has no deadline.
    /// `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lock_timeout = lookup("CAPACITYD_LOCK_TIMEOUT_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        Self { lock_timeout }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lock_timeout() {
        let cfg = EngineConfig::from_lookup(|k| {
            (k == "CAPACITYD_LOCK_TIMEOUT_MS").then(|| "250".to_string())
        });
        assert_eq!(cfg.lock_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn missing_or_bad_values_fall_back() {
        assert_eq!(EngineConfig::from_lookup(|_| None), EngineConfig::default());
        let junk = EngineConfig::from_lookup(|_| Some("soon".into()));
        assert_eq!(junk.lock_timeout, None);
        let zero = EngineConfig::from_lookup(|_| Some("0".into()));
        assert_eq!(zero.lock_timeout, None);
    }
}
