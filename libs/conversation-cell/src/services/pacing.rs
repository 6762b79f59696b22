use std::time::Duration;

use rand::Rng;

use shared_config::AppConfig;

/// "Assistant is typing" delay before each reply. Presentational only.
#[derive(Debug, Clone)]
pub struct TypingPacer {
    base: Duration,
    jitter_ms: u64,
}

impl TypingPacer {
    pub fn new(base: Duration, jitter_ms: u64) -> Self {
        Self { base, jitter_ms }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Duration::from_millis(config.typing_delay_ms), config.typing_jitter_ms)
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn next_delay(&self) -> Duration {
        if self.jitter_ms == 0 {
            return self.base;
        }
        let jitter = rand::thread_rng().gen_range(0..=self.jitter_ms);
        self.base + Duration::from_millis(jitter)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
