use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hospital_gateway_cell::{DayPeriod, Doctor, PatientRecord};
use intent_cell::Turn;

use crate::i18n;

/// What input the assistant expects next. Exactly one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    LanguageSelection,
    Menu,
    Idle,
    CollectingPhone,
    CollectingName,
    CollectingDob,
    CollectingGender,
    PatientSelection,
    DoctorSelection,
    DateSelection,
    TimeSelection,
    Finalized,
}

impl ConversationStage {
    pub fn accepts_text(&self) -> bool {
        matches!(
            self,
            ConversationStage::Menu
                | ConversationStage::Idle
                | ConversationStage::CollectingPhone
                | ConversationStage::CollectingName
                | ConversationStage::CollectingDob
                | ConversationStage::CollectingGender
        )
    }

    /// Stages where the menu is live and free text goes to the classifier.
    pub fn is_open(&self) -> bool {
        matches!(self, ConversationStage::Menu | ConversationStage::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Marathi,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Marathi];

    pub fn native_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिंदी",
            Language::Marathi => "मराठी",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuOption {
    BookAppointment,
    HospitalInfo,
    ContactInfo,
}

impl MenuOption {
    pub const ALL: [MenuOption; 3] = [
        MenuOption::BookAppointment,
        MenuOption::HospitalInfo,
        MenuOption::ContactInfo,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Booking details gathered across turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub phone: Option<String>,
    pub patient_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time_label: Option<String>,
}

impl BookingDraft {
    /// Drops the patient identity but keeps the phone number.
    pub fn start_over(&mut self) {
        self.patient_id = None;
        self.patient_name = None;
        self.date_of_birth = None;
        self.gender = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DoctorChoice {
    Doctor { id: String, name: String },
    BestMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotGroup {
    pub period: DayPeriod,
    pub slots: Vec<SlotOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryAction {
    DoctorSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationDetails {
    pub patient_name: Option<String>,
    pub hospital_name: Option<String>,
    pub doctor_name: Option<String>,
    pub date: Option<String>,
    pub time_range: Option<String>,
    pub token_number: Option<String>,
    pub appointment_uid: Option<String>,
    pub tracking_link: Option<String>,
}

/// Rich content attached to a message. Pure data; the host renders it and
/// answers with the matching [`crate::DialogueEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MessagePayload {
    Plain,
    LanguageChoices { languages: Vec<Language> },
    MenuChoices { options: Vec<MenuOption> },
    PatientChoices { patients: Vec<PatientRecord>, allow_new_patient: bool },
    DoctorChoices { doctors: Vec<Doctor>, best_match: bool },
    DateChoices { dates: Vec<NaiveDate>, look_ahead_days: u32 },
    SlotChoices { date: NaiveDate, groups: Vec<SlotGroup> },
    NoSlots { date: NaiveDate, retry: RetryAction },
    Confirmation(ConfirmationDetails),
}

impl MessagePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            MessagePayload::Plain => "plain",
            MessagePayload::LanguageChoices { .. } => "language_choices",
            MessagePayload::MenuChoices { .. } => "menu_choices",
            MessagePayload::PatientChoices { .. } => "patient_choices",
            MessagePayload::DoctorChoices { .. } => "doctor_choices",
            MessagePayload::DateChoices { .. } => "date_choices",
            MessagePayload::SlotChoices { .. } => "slot_choices",
            MessagePayload::NoSlots { .. } => "no_slots",
            MessagePayload::Confirmation(_) => "confirmation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub payload: MessagePayload,
}

impl Message {
    fn new(author: Author, text: impl Into<String>, payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author,
            created_at: Utc::now(),
            payload,
        }
    }
}

/// Append-only dialogue history in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub(crate) fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The last `limit` messages as classifier turns, oldest first.
    pub fn recent_turns(&self, limit: usize) -> Vec<Turn> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages
            .iter()
            .skip(skip)
            .map(|message| match message.author {
                Author::User => Turn::user(message.text.clone()),
                Author::Assistant => Turn::assistant(message.text.clone()),
            })
            .collect()
    }
}

/// One chat widget's state. Only the dialogue controller mutates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    id: Uuid,
    stage: ConversationStage,
    language: Language,
    draft: BookingDraft,
    messages: MessageLog,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            stage: ConversationStage::LanguageSelection,
            language: Language::English,
            draft: BookingDraft::default(),
            messages: MessageLog::default(),
            created_at: Utc::now(),
        };
        session.messages.append(Message::new(
            Author::Assistant,
            i18n::LANGUAGE_PROMPT,
            MessagePayload::LanguageChoices { languages: Language::ALL.to_vec() },
        ));
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> ConversationStage {
        self.stage
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn accepts_text(&self) -> bool {
        self.stage.accepts_text()
    }

    pub(crate) fn set_stage(&mut self, stage: ConversationStage) {
        self.stage = stage;
    }

    pub(crate) fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub(crate) fn draft_mut(&mut self) -> &mut BookingDraft {
        &mut self.draft
    }

    pub(crate) fn push_user(&mut self, text: impl Into<String>) {
        self.messages.append(Message::new(Author::User, text, MessagePayload::Plain));
    }

    pub(crate) fn push_assistant(&mut self, text: impl Into<String>, payload: MessagePayload) {
        self.messages.append(Message::new(Author::Assistant, text, payload));
    }

    /// Localized plain assistant message.
    pub(crate) fn say(&mut self, key: i18n::MessageKey) {
        let text = i18n::text(self.language, key);
        self.push_assistant(text, MessagePayload::Plain);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
