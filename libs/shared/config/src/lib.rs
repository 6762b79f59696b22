use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hospital_api_url: String,
    pub hospital_api_key: String,
    pub hospital_id: String,
    pub classifier_api_url: String,
    pub classifier_api_key: Option<String>,
    pub classifier_model: String,
    pub external_call_timeout_ms: u64,
    pub typing_delay_ms: u64,
    pub typing_jitter_ms: u64,
    pub appointment_day_limit: u32,
    pub tracking_base_url: String,
    pub bind_address: String,
    /// Sessions untouched this long are dropped; 0 keeps them until deleted.
    pub session_idle_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hospital_api_url: "http://localhost:8000/api".to_string(),
            hospital_api_key: String::new(),
            hospital_id: String::new(),
            classifier_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            classifier_api_key: None,
            classifier_model: "gpt-4o-mini".to_string(),
            external_call_timeout_ms: 10_000,
            typing_delay_ms: 600,
            typing_jitter_ms: 400,
            appointment_day_limit: 7,
            tracking_base_url: "http://localhost:3000".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            session_idle_ttl_secs: 1_800,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            hospital_api_url: string_var("HOSPITAL_API_URL", defaults.hospital_api_url),
            hospital_api_key: env::var("HOSPITAL_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_API_KEY not set, requests will be sent without an api key");
                    String::new()
                }),
            hospital_id: env::var("HOSPITAL_ID")
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_ID not set, using empty value");
                    String::new()
                }),
            classifier_api_url: string_var("CLASSIFIER_API_URL", defaults.classifier_api_url),
            classifier_api_key: env::var("CLASSIFIER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            classifier_model: string_var("CLASSIFIER_MODEL", defaults.classifier_model),
            external_call_timeout_ms: parsed_var("EXTERNAL_CALL_TIMEOUT_MS", defaults.external_call_timeout_ms),
            typing_delay_ms: parsed_var("TYPING_DELAY_MS", defaults.typing_delay_ms),
            typing_jitter_ms: parsed_var("TYPING_JITTER_MS", defaults.typing_jitter_ms),
            appointment_day_limit: parsed_var("APPOINTMENT_DAY_LIMIT", defaults.appointment_day_limit),
            tracking_base_url: string_var("TRACKING_BASE_URL", defaults.tracking_base_url),
            bind_address: string_var("BIND_ADDRESS", defaults.bind_address),
            session_idle_ttl_secs: parsed_var("SESSION_IDLE_TTL_SECS", defaults.session_idle_ttl_secs),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }
        if !config.is_classifier_configured() {
            warn!("CLASSIFIER_API_KEY not set, intent classification will run locally");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.hospital_api_url.is_empty() && !self.hospital_id.is_empty()
    }

    pub fn is_classifier_configured(&self) -> bool {
        self.classifier_api_key.is_some() && !self.classifier_api_url.is_empty()
    }
}

fn string_var(name: &str, default: String) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using default", name);
        default
    })
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
