use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use shared_config::AppConfig;

use crate::models::{Classification, IntentSource, Turn};
use crate::services::{heuristic, keyword, remote::RemoteClassifier};

/// Three-tier classifier: remote, then local scoring, then substring rules.
/// Never fails and never waits longer than the configured call timeout.
pub struct IntentClassifier {
    remote: Option<RemoteClassifier>,
    call_timeout: Duration,
}

impl IntentClassifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            remote: RemoteClassifier::from_config(config),
            call_timeout: Duration::from_millis(config.external_call_timeout_ms),
        }
    }

    /// Local tiers only.
    pub fn offline() -> Self {
        Self {
            remote: None,
            call_timeout: Duration::from_millis(AppConfig::default().external_call_timeout_ms),
        }
    }

    #[instrument(skip(self, text, history))]
    pub async fn classify(&self, text: &str, history: &[Turn]) -> Classification {
        if let Some(remote) = &self.remote {
            match timeout(self.call_timeout, remote.classify(text, history)).await {
                Ok(Ok(intent)) => {
                    debug!("Remote classifier decided {}", intent.as_str());
                    return Classification { intent, source: IntentSource::Remote };
                }
                Ok(Err(e)) => warn!("Remote classifier failed, falling back: {}", e),
                Err(_) => warn!(
                    "Remote classifier timed out after {} ms, falling back",
                    self.call_timeout.as_millis()
                ),
            }
        }

        if let Some(intent) = heuristic::classify(text) {
            debug!("Heuristic classifier decided {}", intent.as_str());
            return Classification { intent, source: IntentSource::Heuristic };
        }

        let intent = keyword::classify(text);
        debug!("Keyword rules decided {}", intent.as_str());
        Classification { intent, source: IntentSource::Keyword }
    }
}
