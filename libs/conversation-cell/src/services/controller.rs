use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use hospital_gateway_cell::{
    format_time_range, AppointmentRecord, BookAppointmentRequest, BookingResponse, DayPeriod,
    Doctor, GatewayError, HospitalGateway, PatientRecord, RegisterPatientRequest, Slot, SlotQuery,
};
use intent_cell::services::remote::HISTORY_WINDOW;
use intent_cell::{Intent, IntentClassifier};
use shared_config::AppConfig;
use shared_utils::{is_iso_date_shape, normalize_phone};

use crate::events::DialogueEvent;
use crate::i18n::{self, MessageKey};
use crate::models::{
    ConfirmationDetails, ConversationStage, DoctorChoice, Language, MenuOption, MessagePayload,
    RetryAction, Session, SlotGroup, SlotOption,
};

#[derive(Debug, Clone)]
pub struct DialogueSettings {
    pub call_timeout: Duration,
    pub appointment_day_limit: u32,
    pub tracking_base_url: String,
}

impl DialogueSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            call_timeout: Duration::from_millis(config.external_call_timeout_ms),
            appointment_day_limit: config.appointment_day_limit.max(1),
            tracking_base_url: config.tracking_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Sole authority over stage transitions.
///
/// `handle` takes the current session by value and returns its successor.
/// Events that do not fit the current stage come back untouched, and no
/// gateway failure escapes: each call site has its own fallback.
pub struct DialogueController {
    gateway: Arc<dyn HospitalGateway>,
    classifier: Arc<IntentClassifier>,
    settings: DialogueSettings,
}

impl DialogueController {
    pub fn new(
        gateway: Arc<dyn HospitalGateway>,
        classifier: Arc<IntentClassifier>,
        settings: DialogueSettings,
    ) -> Self {
        Self { gateway, classifier, settings }
    }

    #[instrument(skip(self, session, event), fields(session_id = %session.id(), event = event.name()))]
    pub async fn handle(&self, session: Session, event: DialogueEvent) -> Session {
        let before = session.stage();
        if !event.is_allowed_in(before) {
            debug!("Ignoring {} in stage {:?}", event.name(), before);
            return session;
        }

        let mut session = session;
        let echo = event.echo_text(session.language());
        session.push_user(echo);

        match event {
            DialogueEvent::SelectLanguage { language } => self.select_language(&mut session, language),
            DialogueEvent::SelectMenuOption { option } => self.select_menu_option(&mut session, option).await,
            DialogueEvent::SubmitPhone { text } => self.submit_phone(&mut session, &text).await,
            DialogueEvent::SubmitName { text } => self.submit_name(&mut session, &text),
            DialogueEvent::SubmitDob { text } => self.submit_dob(&mut session, &text),
            DialogueEvent::SubmitGender { text } => self.submit_gender(&mut session, &text).await,
            DialogueEvent::SelectPatient { patient } => self.select_patient(&mut session, patient).await,
            DialogueEvent::SelectNewPatient => self.select_new_patient(&mut session),
            DialogueEvent::SelectDoctor { doctor } => self.select_doctor(&mut session, doctor).await,
            DialogueEvent::SelectDate { date } => self.select_date(&mut session, date).await,
            DialogueEvent::SelectTimeSlot { slot, period } => {
                self.select_time_slot(&mut session, slot, period).await
            }
            DialogueEvent::RetryDoctorSelection => self.offer_doctors(&mut session).await,
            DialogueEvent::SubmitFreeText { text } => self.submit_free_text(&mut session, &text).await,
        }

        if session.stage() != before {
            info!("Stage {:?} -> {:?}", before, session.stage());
        }
        session
    }

    /// Bounds an external call; expiry is reported like any other failure.
    async fn guarded<T, F>(&self, operation: &'static str, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match timeout(self.settings.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("{} failed: {}", operation, e);
                Err(e)
            }
            Err(_) => {
                let timeout_ms = self.settings.call_timeout.as_millis() as u64;
                warn!("{} timed out after {} ms", operation, timeout_ms);
                Err(GatewayError::Timeout { timeout_ms })
            }
        }
    }

    fn show_menu(&self, session: &mut Session) {
        let text = i18n::text(session.language(), MessageKey::MenuPrompt);
        session.push_assistant(text, MessagePayload::MenuChoices { options: MenuOption::ALL.to_vec() });
        session.set_stage(ConversationStage::Idle);
    }

    fn ask_name(&self, session: &mut Session) {
        session.say(MessageKey::NamePrompt);
        session.set_stage(ConversationStage::CollectingName);
    }

    fn select_language(&self, session: &mut Session, language: Language) {
        session.set_language(language);
        session.say(MessageKey::Welcome);
        self.show_menu(session);
    }

    async fn select_menu_option(&self, session: &mut Session, option: MenuOption) {
        match option {
            MenuOption::BookAppointment => {
                *session.draft_mut() = Default::default();
                session.say(MessageKey::PhonePrompt);
                session.set_stage(ConversationStage::CollectingPhone);
            }
            MenuOption::HospitalInfo | MenuOption::ContactInfo => {
                self.share_hospital_details(session, option).await;
            }
        }
    }

    async fn share_hospital_details(&self, session: &mut Session, option: MenuOption) {
        let language = session.language();
        match self.guarded("hospital_info", self.gateway.hospital_info()).await {
            Ok(info) => {
                let text = if option == MenuOption::ContactInfo {
                    i18n::contact_summary(language, &info)
                } else {
                    i18n::hospital_summary(language, &info)
                };
                session.push_assistant(text, MessagePayload::Plain);
            }
            Err(_) => session.say(MessageKey::ServiceUnavailable),
        }
        session.set_stage(ConversationStage::Idle);
    }

    async fn submit_phone(&self, session: &mut Session, text: &str) {
        let Some(phone) = normalize_phone(text) else {
            session.say(MessageKey::InvalidPhone);
            return;
        };
        session.draft_mut().phone = Some(phone.clone());

        match self.guarded("check_patient", self.gateway.check_patient(&phone)).await {
            Ok(response) => {
                let patients = response.into_patients();
                if patients.is_empty() {
                    self.ask_name(session);
                } else {
                    self.offer_patients(session, patients);
                }
            }
            Err(_) => self.ask_name(session),
        }
    }

    fn offer_patients(&self, session: &mut Session, patients: Vec<PatientRecord>) {
        let text = i18n::text(session.language(), MessageKey::PatientsFound);
        session.push_assistant(text, MessagePayload::PatientChoices { patients, allow_new_patient: true });
        session.set_stage(ConversationStage::PatientSelection);
    }

    fn submit_name(&self, session: &mut Session, text: &str) {
        let name = text.trim();
        if name.is_empty() {
            session.say(MessageKey::NamePrompt);
            return;
        }
        session.draft_mut().patient_name = Some(name.to_string());
        session.say(MessageKey::DobPrompt);
        session.set_stage(ConversationStage::CollectingDob);
    }

    fn submit_dob(&self, session: &mut Session, text: &str) {
        if !is_iso_date_shape(text) {
            session.say(MessageKey::InvalidDob);
            return;
        }
        session.draft_mut().date_of_birth = Some(text.trim().to_string());
        session.say(MessageKey::GenderPrompt);
        session.set_stage(ConversationStage::CollectingGender);
    }

    async fn submit_gender(&self, session: &mut Session, text: &str) {
        let Some(gender) = i18n::match_gender(session.language(), text) else {
            session.say(MessageKey::InvalidGender);
            return;
        };
        session.draft_mut().gender = Some(gender);

        let draft = session.draft().clone();
        let request = RegisterPatientRequest {
            name: draft.patient_name.clone().unwrap_or_default(),
            phone: draft.phone.clone().unwrap_or_default(),
            gender: gender.as_str().to_string(),
            dob: draft.date_of_birth.clone().unwrap_or_default(),
        };

        let response = match self.guarded("register_patient", self.gateway.register_patient(&request)).await {
            Ok(response) if response.success => response,
            Ok(response) => {
                self.say_server_message(session, response.message, MessageKey::RegistrationFailed);
                self.show_menu(session);
                return;
            }
            Err(_) => {
                session.say(MessageKey::RegistrationFailed);
                self.show_menu(session);
                return;
            }
        };

        let mut patients = Vec::new();
        if let Some(phone) = &draft.phone {
            if let Ok(refreshed) = self.guarded("check_patient", self.gateway.check_patient(phone)).await {
                patients = refreshed.into_patients();
            }
        }
        if patients.is_empty() {
            if let Some(id) = response.patient_id {
                patients.push(PatientRecord {
                    id,
                    name: request.name,
                    phone: draft.phone,
                    gender: Some(request.gender),
                    date_of_birth: draft.date_of_birth,
                });
            }
        }

        if patients.is_empty() {
            session.say(MessageKey::ServiceUnavailable);
            self.show_menu(session);
        } else {
            self.offer_patients(session, patients);
        }
    }

    async fn select_patient(&self, session: &mut Session, patient: PatientRecord) {
        let draft = session.draft_mut();
        draft.patient_id = Some(patient.id);
        draft.patient_name = Some(patient.name);
        if patient.phone.is_some() && draft.phone.is_none() {
            draft.phone = patient.phone;
        }
        if patient.date_of_birth.is_some() {
            draft.date_of_birth = patient.date_of_birth;
        }
        if let Some(gender) = patient.gender.as_deref().and_then(|g| i18n::match_gender(Language::English, g)) {
            draft.gender = Some(gender);
        }

        self.offer_doctors(session).await;
    }

    fn select_new_patient(&self, session: &mut Session) {
        session.draft_mut().start_over();
        self.ask_name(session);
    }

    async fn fetch_doctors(&self) -> Result<Vec<Doctor>, GatewayError> {
        self.guarded("list_doctors", self.gateway.list_doctors()).await
    }

    async fn offer_doctors(&self, session: &mut Session) {
        match self.fetch_doctors().await {
            Ok(doctors) if !doctors.is_empty() => {
                let text = i18n::text(session.language(), MessageKey::DoctorPrompt);
                session.push_assistant(text, MessagePayload::DoctorChoices { doctors, best_match: true });
                session.set_stage(ConversationStage::DoctorSelection);
            }
            Ok(_) => {
                session.say(MessageKey::NoDoctors);
                self.show_menu(session);
            }
            Err(_) => {
                session.say(MessageKey::ServiceUnavailable);
                self.show_menu(session);
            }
        }
    }

    async fn select_doctor(&self, session: &mut Session, choice: DoctorChoice) {
        let (id, name) = match choice {
            DoctorChoice::Doctor { id, name } => (id, name),
            DoctorChoice::BestMatch => match self.fetch_doctors().await {
                Ok(doctors) if !doctors.is_empty() => {
                    let first = doctors[0].clone();
                    (first.id, first.name)
                }
                Ok(_) => {
                    session.say(MessageKey::NoDoctors);
                    self.show_menu(session);
                    return;
                }
                Err(_) => {
                    session.say(MessageKey::ServiceUnavailable);
                    self.show_menu(session);
                    return;
                }
            },
        };

        if id.trim().is_empty() {
            debug!("Doctor choice without an id, returning to menu");
            self.show_menu(session);
            return;
        }

        let draft = session.draft_mut();
        draft.doctor_id = Some(id);
        draft.doctor_name = Some(name);

        self.offer_dates(session).await;
    }

    async fn offer_dates(&self, session: &mut Session) {
        let look_ahead_days = self
            .guarded("hospital_info", self.gateway.hospital_info())
            .await
            .ok()
            .and_then(|info| info.appointment_day_limit)
            .filter(|days| *days > 0)
            .unwrap_or(self.settings.appointment_day_limit);

        let today = Local::now().date_naive();
        let dates = today
            .iter_days()
            .take(look_ahead_days as usize)
            .collect();

        let text = i18n::text(session.language(), MessageKey::DatePrompt);
        session.push_assistant(text, MessagePayload::DateChoices { dates, look_ahead_days });
        session.set_stage(ConversationStage::DateSelection);
    }

    async fn select_date(&self, session: &mut Session, date: NaiveDate) {
        session.draft_mut().date = Some(date);

        let draft = session.draft().clone();
        let Some(doctor_id) = draft.doctor_id.clone() else {
            debug!("Date chosen without a doctor, returning to menu");
            self.show_menu(session);
            return;
        };

        let query = SlotQuery {
            doctor_id,
            date,
            phone: draft.phone.clone(),
            patient_id: draft.patient_id.clone(),
        };

        match self.guarded("available_slots", self.gateway.available_slots(&query)).await {
            Ok(availability) if availability.booked => {
                let record = availability.appointment.unwrap_or_default();
                let details = self.build_confirmation(session, record, None);
                let text = i18n::text(session.language(), MessageKey::AlreadyBooked);
                session.push_assistant(text, MessagePayload::Confirmation(details));
                session.set_stage(ConversationStage::Finalized);
            }
            Ok(availability) if availability.success && !availability.slots.is_empty() => {
                let groups = group_slots(&availability.slots);
                let text = i18n::text(session.language(), MessageKey::SlotPrompt);
                session.push_assistant(text, MessagePayload::SlotChoices { date, groups });
                session.set_stage(ConversationStage::TimeSelection);
            }
            _ => {
                let text = i18n::text(session.language(), MessageKey::NoSlots);
                session.push_assistant(text, MessagePayload::NoSlots { date, retry: RetryAction::DoctorSelection });
                session.set_stage(ConversationStage::DoctorSelection);
            }
        }
    }

    async fn select_time_slot(&self, session: &mut Session, slot: SlotOption, period: DayPeriod) {
        let draft = session.draft().clone();
        let (Some(doctor_id), Some(date)) = (draft.doctor_id.clone(), draft.date) else {
            debug!("Slot chosen with incomplete draft, returning to menu");
            self.show_menu(session);
            return;
        };
        if doctor_id.trim().is_empty() || slot.id.trim().is_empty() {
            debug!("Slot chosen with empty ids, returning to menu");
            self.show_menu(session);
            return;
        }

        debug!("Booking {:?} slot {}", period, slot.id);
        session.draft_mut().time_label = Some(slot.label.clone());

        let request = BookAppointmentRequest {
            doctor_id,
            date,
            slot_id: slot.id,
            patient_name: draft.patient_name.clone().unwrap_or_default(),
            phone: draft.phone.clone().unwrap_or_default(),
            patient_id: draft.patient_id.clone(),
        };

        match self.guarded("book_appointment", self.gateway.book_appointment(&request)).await {
            Ok(booking) if booking.success => {
                let record = match booking.reference() {
                    Some(reference) => self
                        .guarded("appointment_details", self.gateway.appointment_details(&reference))
                        .await
                        .unwrap_or_default(),
                    None => AppointmentRecord::default(),
                };
                let details = self.build_confirmation(session, record, Some(&booking));
                info!("Appointment booked for session {}", session.id());

                let text = i18n::text(session.language(), MessageKey::BookingConfirmed);
                session.push_assistant(text, MessagePayload::Confirmation(details));
                session.set_stage(ConversationStage::Finalized);
            }
            Ok(booking) => self.say_server_message(session, booking.message, MessageKey::BookingFailed),
            Err(_) => session.say(MessageKey::BookingFailed),
        }
    }

    async fn submit_free_text(&self, session: &mut Session, text: &str) {
        let mut history = session.messages().recent_turns(HISTORY_WINDOW + 1);
        history.pop();

        let classification = self.classifier.classify(text.trim(), &history).await;
        debug!("Free text classified as {:?} by {:?}", classification.intent, classification.source);

        match classification.intent {
            Intent::BookAppointment => {
                *session.draft_mut() = Default::default();
                self.ask_name(session);
            }
            Intent::HospitalInfo => self.share_hospital_details(session, MenuOption::HospitalInfo).await,
            Intent::ContactInfo => self.share_hospital_details(session, MenuOption::ContactInfo).await,
            Intent::None => {
                session.say(MessageKey::NotUnderstood);
                self.show_menu(session);
            }
        }
    }

    /// Relays a human-readable server message, else the localized fallback.
    fn say_server_message(&self, session: &mut Session, message: Option<String>, fallback: MessageKey) {
        match message.filter(|m| !m.trim().is_empty()) {
            Some(message) => session.push_assistant(message, MessagePayload::Plain),
            None => session.say(fallback),
        }
    }

    fn build_confirmation(
        &self,
        session: &Session,
        record: AppointmentRecord,
        booking: Option<&BookingResponse>,
    ) -> ConfirmationDetails {
        let draft = session.draft();

        let time_range = format_time_range(record.start_time.as_deref(), record.end_time.as_deref())
            .or(record.time_label)
            .or_else(|| draft.time_label.clone());

        let appointment_uid = record
            .appointment_uid
            .or_else(|| booking.and_then(|b| b.appointment_uid.clone()))
            .filter(|uid| !uid.is_empty());

        let tracking_link = appointment_uid
            .as_ref()
            .map(|uid| format!("{}/track/{}", self.settings.tracking_base_url, uid));

        ConfirmationDetails {
            patient_name: record.patient_name.or_else(|| draft.patient_name.clone()),
            hospital_name: record.hospital_name,
            doctor_name: record.doctor_name.or_else(|| draft.doctor_name.clone()),
            date: record.date.or_else(|| draft.date.map(|d| d.format("%Y-%m-%d").to_string())),
            time_range,
            token_number: record.token_number,
            appointment_uid,
            tracking_link,
        }
    }
}

/// Buckets slots by period in morning, afternoon, evening order, keeping
/// the server's order inside each bucket. Slots with no resolvable period
/// go to the morning bucket.
fn group_slots(slots: &[Slot]) -> Vec<SlotGroup> {
    DayPeriod::ALL
        .iter()
        .filter_map(|period| {
            let options: Vec<SlotOption> = slots
                .iter()
                .filter(|slot| slot.resolved_period().unwrap_or(DayPeriod::Morning) == *period)
                .map(|slot| SlotOption { id: slot.id.clone(), label: slot.display_label() })
                .collect();
            if options.is_empty() {
                None
            } else {
                Some(SlotGroup { period: *period, slots: options })
            }
        })
        .collect()
}
