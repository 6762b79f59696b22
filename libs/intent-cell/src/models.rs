use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BookAppointment,
    HospitalInfo,
    ContactInfo,
    None,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::BookAppointment => "book_appointment",
            Intent::HospitalInfo => "hospital_info",
            Intent::ContactInfo => "contact_info",
            Intent::None => "none",
        }
    }

    /// Lenient parse of a classifier label, e.g. `"Book Appointment"` or `"contact"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.')
            .to_lowercase()
            .replace([' ', '-'], "_");

        match normalized.as_str() {
            "book_appointment" | "book" | "booking" | "appointment" => Some(Intent::BookAppointment),
            "hospital_info" | "hospital" | "info" => Some(Intent::HospitalInfo),
            "contact_info" | "contact" => Some(Intent::ContactInfo),
            "none" | "unknown" | "other" => Some(Intent::None),
            _ => None,
        }
    }
}

/// Which tier produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    Remote,
    Heuristic,
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub source: IntentSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Assistant, text: text.into() }
    }
}
