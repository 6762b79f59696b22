use anyhow::{Result, anyhow};
use reqwest::{Client, header};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{Intent, Turn, TurnRole};

/// Number of prior turns sent along with the utterance.
pub const HISTORY_WINDOW: usize = 6;

const SYSTEM_PROMPT: &str = "You classify messages sent to a hospital appointment assistant. \
Answer with JSON of the form {\"intent\": \"<label>\"} where <label> is one of: \
book_appointment (the user wants to book or schedule a visit), \
hospital_info (the user asks about the hospital, its address, timings or services), \
contact_info (the user wants a phone number, email or other contact details), \
none (anything else). Messages may be in English, Hindi or Marathi.";

/// Chat-completions backed classifier.
pub struct RemoteClassifier {
    http_client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl RemoteClassifier {
    /// `None` unless a classifier key is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.classifier_api_key.clone()?;
        if config.classifier_api_url.is_empty() {
            return None;
        }

        Some(Self {
            http_client: Client::new(),
            api_url: config.classifier_api_url.clone(),
            api_key,
            model: config.classifier_model.clone(),
        })
    }

    pub async fn classify(&self, text: &str, history: &[Turn]) -> Result<Intent> {
        let mut messages = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];

        let skip = history.len().saturating_sub(HISTORY_WINDOW);
        for turn in history.iter().skip(skip) {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            };
            messages.push(json!({ "role": role, "content": turn.text }));
        }
        messages.push(json!({ "role": "user", "content": text }));

        let request = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0
        });

        debug!("Requesting remote intent classification");

        let response = self.http_client.post(&self.api_url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Classifier API error ({}): {}", status, error_text));
        }

        let ai_response: Value = response.json().await?;
        let content = ai_response["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| anyhow!("Invalid classifier response format"))?;

        parse_intent(content)
    }
}

/// Accepts `{"intent": "..."}` or a bare label.
fn parse_intent(content: &str) -> Result<Intent> {
    let content = content.trim();

    if let Ok(parsed) = serde_json::from_str::<Value>(content) {
        if let Some(label) = parsed["intent"].as_str() {
            return Intent::from_label(label)
                .ok_or_else(|| anyhow!("Unknown intent label: {}", label));
        }
    }

    Intent::from_label(content).ok_or_else(|| anyhow!("Unparseable classifier reply: {}", content))
}
