use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use hospital_gateway_cell::{DayPeriod, PatientRecord};

use crate::i18n::{self, MessageKey};
use crate::models::{ConversationStage, DoctorChoice, Language, MenuOption, SlotOption};

/// Every way the host can drive a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueEvent {
    SelectLanguage { language: Language },
    SelectMenuOption { option: MenuOption },
    SubmitPhone { text: String },
    SubmitName { text: String },
    SubmitDob { text: String },
    SubmitGender { text: String },
    SelectPatient { patient: PatientRecord },
    SelectNewPatient,
    SelectDoctor { doctor: DoctorChoice },
    SelectDate { date: NaiveDate },
    SelectTimeSlot { slot: SlotOption, period: DayPeriod },
    RetryDoctorSelection,
    SubmitFreeText { text: String },
}

impl DialogueEvent {
    /// Routes text from the input box to the operation the stage expects.
    pub fn text_for_stage(stage: ConversationStage, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        match stage {
            ConversationStage::CollectingPhone => Some(DialogueEvent::SubmitPhone { text }),
            ConversationStage::CollectingName => Some(DialogueEvent::SubmitName { text }),
            ConversationStage::CollectingDob => Some(DialogueEvent::SubmitDob { text }),
            ConversationStage::CollectingGender => Some(DialogueEvent::SubmitGender { text }),
            ConversationStage::Menu | ConversationStage::Idle => Some(DialogueEvent::SubmitFreeText { text }),
            _ => None,
        }
    }

    pub fn is_allowed_in(&self, stage: ConversationStage) -> bool {
        use ConversationStage as S;
        match self {
            DialogueEvent::SelectLanguage { .. } => stage == S::LanguageSelection,
            DialogueEvent::SelectMenuOption { .. } => stage.is_open() || stage == S::Finalized,
            DialogueEvent::SubmitPhone { .. } => stage == S::CollectingPhone,
            DialogueEvent::SubmitName { .. } => stage == S::CollectingName,
            DialogueEvent::SubmitDob { .. } => stage == S::CollectingDob,
            DialogueEvent::SubmitGender { .. } => stage == S::CollectingGender,
            DialogueEvent::SelectPatient { .. } | DialogueEvent::SelectNewPatient => {
                stage == S::PatientSelection
            }
            DialogueEvent::SelectDoctor { .. } => stage == S::DoctorSelection,
            DialogueEvent::SelectDate { .. } => stage == S::DateSelection,
            DialogueEvent::SelectTimeSlot { .. } => stage == S::TimeSelection,
            DialogueEvent::RetryDoctorSelection => {
                matches!(stage, S::DoctorSelection | S::DateSelection)
            }
            DialogueEvent::SubmitFreeText { .. } => stage.is_open(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DialogueEvent::SelectLanguage { .. } => "select_language",
            DialogueEvent::SelectMenuOption { .. } => "select_menu_option",
            DialogueEvent::SubmitPhone { .. } => "submit_phone",
            DialogueEvent::SubmitName { .. } => "submit_name",
            DialogueEvent::SubmitDob { .. } => "submit_dob",
            DialogueEvent::SubmitGender { .. } => "submit_gender",
            DialogueEvent::SelectPatient { .. } => "select_patient",
            DialogueEvent::SelectNewPatient => "select_new_patient",
            DialogueEvent::SelectDoctor { .. } => "select_doctor",
            DialogueEvent::SelectDate { .. } => "select_date",
            DialogueEvent::SelectTimeSlot { .. } => "select_time_slot",
            DialogueEvent::RetryDoctorSelection => "retry_doctor_selection",
            DialogueEvent::SubmitFreeText { .. } => "submit_free_text",
        }
    }

    /// What the user-side bubble shows for this event.
    pub fn echo_text(&self, language: Language) -> String {
        match self {
            DialogueEvent::SelectLanguage { language } => language.native_name().to_string(),
            DialogueEvent::SelectMenuOption { option } => i18n::menu_label(language, *option).to_string(),
            DialogueEvent::SubmitPhone { text }
            | DialogueEvent::SubmitName { text }
            | DialogueEvent::SubmitDob { text }
            | DialogueEvent::SubmitGender { text }
            | DialogueEvent::SubmitFreeText { text } => text.trim().to_string(),
            DialogueEvent::SelectPatient { patient } => patient.name.clone(),
            DialogueEvent::SelectNewPatient => i18n::text(language, MessageKey::NewPatientLabel).to_string(),
            DialogueEvent::SelectDoctor { doctor: DoctorChoice::Doctor { name, .. } } => name.clone(),
            DialogueEvent::SelectDoctor { doctor: DoctorChoice::BestMatch } => {
                i18n::text(language, MessageKey::BestMatchLabel).to_string()
            }
            DialogueEvent::SelectDate { date } => date.format("%Y-%m-%d").to_string(),
            DialogueEvent::SelectTimeSlot { slot, .. } => slot.label.clone(),
            DialogueEvent::RetryDoctorSelection => i18n::text(language, MessageKey::RetryLabel).to_string(),
        }
    }
}
