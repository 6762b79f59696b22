mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{Local, NaiveDate};

use common::*;
use conversation_cell::i18n::{self, MessageKey};
use conversation_cell::{
    Author, ConversationStage, DialogueController, DialogueEvent, DoctorChoice, Language,
    MenuOption, MessagePayload, RetryAction, Session, SlotOption,
};
use hospital_gateway_cell::{AppointmentRecord, BookingResponse, DayPeriod, SlotAvailability};
use intent_cell::IntentClassifier;

fn last_text(session: &Session) -> &str {
    &session.messages().last().unwrap().text
}

fn last_payload(session: &Session) -> &MessagePayload {
    &session.messages().last().unwrap().payload
}

fn assistant_texts_since(session: &Session, start: usize) -> Vec<&str> {
    session.messages().as_slice()[start..]
        .iter()
        .filter(|m| m.author == Author::Assistant)
        .map(|m| m.text.as_str())
        .collect()
}

fn target_date() -> NaiveDate {
    Local::now().date_naive().succ_opt().unwrap()
}

fn first_slot() -> DialogueEvent {
    DialogueEvent::SelectTimeSlot {
        slot: SlotOption { id: "s-1".to_string(), label: "09:00 AM - 09:15 AM".to_string() },
        period: DayPeriod::Morning,
    }
}

const GATEWAY_OPERATIONS: [&str; 7] = [
    "check_patient",
    "register_patient",
    "list_doctors",
    "available_slots",
    "book_appointment",
    "appointment_details",
    "hospital_info",
];

fn gateway_calls(gateway: &FakeGateway) -> usize {
    GATEWAY_OPERATIONS.iter().map(|op| gateway.calls(op)).sum()
}

fn one_of_each_event() -> Vec<DialogueEvent> {
    vec![
        DialogueEvent::SelectLanguage { language: Language::Hindi },
        DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
        DialogueEvent::SubmitPhone { text: PHONE.to_string() },
        DialogueEvent::SubmitName { text: "Jane Doe".to_string() },
        DialogueEvent::SubmitDob { text: "1990-05-20".to_string() },
        DialogueEvent::SubmitGender { text: "Female".to_string() },
        DialogueEvent::SelectPatient { patient: patient("p-1", "Jane Doe") },
        DialogueEvent::SelectNewPatient,
        DialogueEvent::SelectDoctor { doctor: DoctorChoice::BestMatch },
        DialogueEvent::SelectDate { date: target_date() },
        first_slot(),
        DialogueEvent::RetryDoctorSelection,
        DialogueEvent::SubmitFreeText { text: "book an appointment".to_string() },
    ]
}

/// One session parked in every stage the dialogue can reach.
async fn session_in_every_stage(controller: &DialogueController) -> Vec<Session> {
    let fresh = Session::new();
    let idle = started(controller).await;
    let collecting_phone = controller
        .handle(idle.clone(), DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment })
        .await;
    let patient_selection = at_patient_selection(controller).await;
    let collecting_name = controller
        .handle(patient_selection.clone(), DialogueEvent::SelectNewPatient)
        .await;
    let collecting_dob = controller
        .handle(collecting_name.clone(), DialogueEvent::SubmitName { text: "Jane Doe".to_string() })
        .await;
    let collecting_gender = controller
        .handle(collecting_dob.clone(), DialogueEvent::SubmitDob { text: "1990-05-20".to_string() })
        .await;
    let doctor_selection = controller
        .handle(
            patient_selection.clone(),
            DialogueEvent::SelectPatient { patient: patient("p-1", "Jane Doe") },
        )
        .await;
    let date_selection = at_date_selection(controller).await;
    let time_selection = controller
        .handle(date_selection.clone(), DialogueEvent::SelectDate { date: target_date() })
        .await;
    let finalized = controller.handle(time_selection.clone(), first_slot()).await;

    vec![
        fresh,
        idle,
        collecting_phone,
        collecting_name,
        collecting_dob,
        collecting_gender,
        patient_selection,
        doctor_selection,
        date_selection,
        time_selection,
        finalized,
    ]
}

#[tokio::test]
async fn test_mismatched_events_leave_session_untouched() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway.clone());

    let sessions = session_in_every_stage(&controller).await;
    let stages: Vec<ConversationStage> = sessions.iter().map(|s| s.stage()).collect();
    assert_eq!(
        stages,
        vec![
            ConversationStage::LanguageSelection,
            ConversationStage::Idle,
            ConversationStage::CollectingPhone,
            ConversationStage::CollectingName,
            ConversationStage::CollectingDob,
            ConversationStage::CollectingGender,
            ConversationStage::PatientSelection,
            ConversationStage::DoctorSelection,
            ConversationStage::DateSelection,
            ConversationStage::TimeSelection,
            ConversationStage::Finalized,
        ]
    );

    let mut rejected = 0;
    for session in &sessions {
        for event in one_of_each_event() {
            if event.is_allowed_in(session.stage()) {
                continue;
            }
            let calls_before = gateway_calls(&gateway);
            let label = format!("{} in {:?}", event.name(), session.stage());

            let after = controller.handle(session.clone(), event).await;

            assert_eq!(&after, session, "{} changed the session", label);
            assert_eq!(gateway_calls(&gateway), calls_before, "{} reached the hospital", label);
            rejected += 1;
        }
    }
    // Every stage ignores most of the thirteen event kinds.
    assert!(rejected > sessions.len() * 9);
}

#[tokio::test]
async fn test_phone_must_have_ten_digits() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway.clone());
    let session = controller
        .handle(
            started(&controller).await,
            DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
        )
        .await;

    let session = controller
        .handle(session, DialogueEvent::SubmitPhone { text: "abc123".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingPhone);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::InvalidPhone));
    assert_eq!(gateway.calls("check_patient"), 0);

    let session = controller
        .handle(session, DialogueEvent::SubmitPhone { text: "1234567890".to_string() })
        .await;
    assert_eq!(gateway.calls("check_patient"), 1);
    assert_eq!(session.draft().phone.as_deref(), Some("1234567890"));
    assert_eq!(session.stage(), ConversationStage::PatientSelection);
}

#[tokio::test]
async fn test_phone_lookup_failure_degrades_to_registration() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.patients = None);
    let controller = controller(gateway.clone());

    let session = at_patient_selection(&controller).await;

    assert_eq!(session.stage(), ConversationStage::CollectingName);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::NamePrompt));
}

#[tokio::test]
async fn test_dob_check_is_syntactic_only() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.patients = Some(vec![]));
    let controller = controller(gateway);

    let session = at_patient_selection(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SubmitName { text: "  Jane Doe ".to_string() })
        .await;
    assert_eq!(session.draft().patient_name.as_deref(), Some("Jane Doe"));

    let session = controller
        .handle(session, DialogueEvent::SubmitDob { text: "20-05-1990".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingDob);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::InvalidDob));

    let session = controller
        .handle(session, DialogueEvent::SubmitDob { text: "१९९०-०५-२०".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingDob);
    assert_eq!(session.draft().date_of_birth, None);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::InvalidDob));

    let session = controller
        .handle(session, DialogueEvent::SubmitDob { text: "2020-13-40".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingGender);
    assert_eq!(session.draft().date_of_birth.as_deref(), Some("2020-13-40"));
}

#[tokio::test]
async fn test_language_sticks_for_every_later_reply() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway);

    let session = controller
        .handle(Session::new(), DialogueEvent::SelectLanguage { language: Language::Hindi })
        .await;
    assert_eq!(session.language(), Language::Hindi);
    assert_eq!(
        assistant_texts_since(&session, 1),
        vec![
            i18n::text(Language::Hindi, MessageKey::Welcome),
            i18n::text(Language::Hindi, MessageKey::MenuPrompt),
        ]
    );

    let start = session.messages().len();
    let session = drive(
        &controller,
        session,
        vec![
            DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
            DialogueEvent::SubmitPhone { text: "12".to_string() },
        ],
    )
    .await;

    assert_eq!(
        assistant_texts_since(&session, start),
        vec![
            i18n::text(Language::Hindi, MessageKey::PhonePrompt),
            i18n::text(Language::Hindi, MessageKey::InvalidPhone),
        ]
    );
    assert_eq!(
        session.messages().as_slice()[start].text,
        i18n::menu_label(Language::Hindi, MenuOption::BookAppointment)
    );
}

#[tokio::test]
async fn test_hindi_gender_word_registers_patient() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.patients = Some(vec![]));
    let controller = controller(gateway.clone());

    let session = controller
        .handle(Session::new(), DialogueEvent::SelectLanguage { language: Language::Hindi })
        .await;
    let session = drive(
        &controller,
        session,
        vec![
            DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
            DialogueEvent::SubmitPhone { text: PHONE.to_string() },
            DialogueEvent::SubmitName { text: "सीता".to_string() },
            DialogueEvent::SubmitDob { text: "1985-01-02".to_string() },
            DialogueEvent::SubmitGender { text: "मर्द?".to_string() },
        ],
    )
    .await;
    assert_eq!(session.stage(), ConversationStage::CollectingGender);
    assert_eq!(last_text(&session), i18n::text(Language::Hindi, MessageKey::InvalidGender));

    let session = controller
        .handle(session, DialogueEvent::SubmitGender { text: "महिला".to_string() })
        .await;

    let registration = gateway.last_registration.lock().unwrap().clone().unwrap();
    assert_eq!(registration.gender, "Female");
    assert_eq!(registration.phone, PHONE);
    assert_eq!(registration.dob, "1985-01-02");

    // The refreshed lookup is still empty, so the returned id stands in.
    assert_eq!(session.stage(), ConversationStage::PatientSelection);
    assert_matches!(last_payload(&session), MessagePayload::PatientChoices { patients, .. } => {
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, "p-new");
        assert_eq!(patients[0].name, "सीता");
    });
}

#[tokio::test]
async fn test_registration_failure_shows_menu() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| {
        r.patients = Some(vec![]);
        r.registration = None;
    });
    let controller = controller(gateway);

    let session = at_patient_selection(&controller).await;
    let session = drive(
        &controller,
        session,
        vec![
            DialogueEvent::SubmitName { text: "Jane Doe".to_string() },
            DialogueEvent::SubmitDob { text: "1990-05-20".to_string() },
            DialogueEvent::SubmitGender { text: "female".to_string() },
        ],
    )
    .await;

    assert_eq!(session.stage(), ConversationStage::Idle);
    assert_matches!(last_payload(&session), MessagePayload::MenuChoices { .. });
    assert!(assistant_texts_since(&session, 0)
        .contains(&i18n::text(Language::English, MessageKey::RegistrationFailed)));
}

#[tokio::test]
async fn test_existing_booking_short_circuits_to_confirmation() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| {
        r.availability = Some(SlotAvailability {
            success: true,
            booked: true,
            appointment: Some(appointment_record()),
            ..SlotAvailability::default()
        })
    });
    let controller = controller(gateway.clone());

    let session = at_date_selection(&controller).await;
    let start = session.messages().len();
    let session = controller
        .handle(session, DialogueEvent::SelectDate { date: target_date() })
        .await;

    assert_eq!(session.stage(), ConversationStage::Finalized);
    assert_eq!(assistant_texts_since(&session, start).len(), 1);
    assert_matches!(last_payload(&session), MessagePayload::Confirmation(details) => {
        assert_eq!(details.token_number.as_deref(), Some("7"));
        assert_eq!(details.time_range.as_deref(), Some("10:00 AM - 10:15 AM"));
    });
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::AlreadyBooked));
    assert_eq!(gateway.calls("book_appointment"), 0);
}

#[tokio::test]
async fn test_booking_rejection_relays_server_message() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| {
        r.booking = Some(BookingResponse {
            success: false,
            message: Some("Slot taken".to_string()),
            ..BookingResponse::default()
        })
    });
    let controller = controller(gateway);

    let session = at_date_selection(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SelectDate { date: target_date() })
        .await;
    assert_eq!(session.stage(), ConversationStage::TimeSelection);

    let start = session.messages().len();
    let session = controller.handle(session, first_slot()).await;

    assert_eq!(assistant_texts_since(&session, start), vec!["Slot taken"]);
    assert_eq!(session.stage(), ConversationStage::TimeSelection);
}

#[tokio::test]
async fn test_booking_error_without_message_uses_fallback() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.booking = None);
    let controller = controller(gateway);

    let session = at_date_selection(&controller).await;
    let session = drive(
        &controller,
        session,
        vec![DialogueEvent::SelectDate { date: target_date() }, first_slot()],
    )
    .await;

    assert_eq!(session.stage(), ConversationStage::TimeSelection);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::BookingFailed));
}

#[tokio::test]
async fn test_full_booking_produces_confirmation() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway.clone());

    let session = at_date_selection(&controller).await;
    assert_eq!(session.stage(), ConversationStage::DateSelection);
    assert_matches!(last_payload(&session), MessagePayload::DateChoices { dates, look_ahead_days } => {
        assert_eq!(*look_ahead_days, 5);
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], Local::now().date_naive());
    });

    let session = controller
        .handle(session, DialogueEvent::SelectDate { date: target_date() })
        .await;
    assert_eq!(session.stage(), ConversationStage::TimeSelection);
    assert_matches!(last_payload(&session), MessagePayload::SlotChoices { groups, .. } => {
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].period, DayPeriod::Morning);
        assert_eq!(groups[1].period, DayPeriod::Afternoon);
        assert_eq!(groups[1].slots[0].id, "s-2");
    });

    let query = gateway.last_slot_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.doctor_id, "d-1");
    assert_eq!(query.phone.as_deref(), Some(PHONE));
    assert_eq!(query.patient_id.as_deref(), Some("p-1"));

    let session = controller.handle(session, first_slot()).await;

    assert_eq!(session.stage(), ConversationStage::Finalized);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::BookingConfirmed));
    assert_matches!(last_payload(&session), MessagePayload::Confirmation(details) => {
        assert_eq!(details.patient_name.as_deref(), Some("Jane Doe"));
        assert_eq!(details.hospital_name.as_deref(), Some("City Care Hospital"));
        assert_eq!(details.doctor_name.as_deref(), Some("Dr. Rao"));
        assert_eq!(details.appointment_uid.as_deref(), Some(APPOINTMENT_UID));
        assert_eq!(
            details.tracking_link.as_deref(),
            Some("https://track.example.com/track/apt-uid-1")
        );
    });

    let booking = gateway.last_booking.lock().unwrap().clone().unwrap();
    assert_eq!(booking.slot_id, "s-1");
    assert_eq!(booking.patient_name, "Jane Doe");
    assert_eq!(booking.patient_id.as_deref(), Some("p-1"));
    assert_eq!(session.draft().time_label.as_deref(), Some("09:00 AM - 09:15 AM"));
}

#[tokio::test]
async fn test_confirmation_falls_back_to_draft_when_details_fail() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.appointment = None);
    let controller = controller(gateway);

    let session = at_date_selection(&controller).await;
    let session = drive(
        &controller,
        session,
        vec![DialogueEvent::SelectDate { date: target_date() }, first_slot()],
    )
    .await;

    assert_eq!(session.stage(), ConversationStage::Finalized);
    assert_matches!(last_payload(&session), MessagePayload::Confirmation(details) => {
        assert_eq!(details.doctor_name.as_deref(), Some("Dr. Rao"));
        assert_eq!(details.time_range.as_deref(), Some("09:00 AM - 09:15 AM"));
        assert_eq!(details.date, Some(target_date().format("%Y-%m-%d").to_string()));
        assert_eq!(details.appointment_uid.as_deref(), Some(APPOINTMENT_UID));
        assert_eq!(details.token_number, None);
    });
}

#[tokio::test]
async fn test_slot_without_id_returns_to_menu() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway.clone());

    let session = at_date_selection(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SelectDate { date: target_date() })
        .await;
    let session = controller
        .handle(
            session,
            DialogueEvent::SelectTimeSlot {
                slot: SlotOption { id: " ".to_string(), label: "stale".to_string() },
                period: DayPeriod::Evening,
            },
        )
        .await;

    assert_eq!(session.stage(), ConversationStage::Idle);
    assert_matches!(last_payload(&session), MessagePayload::MenuChoices { .. });
    assert_eq!(gateway.calls("book_appointment"), 0);
}

#[tokio::test]
async fn test_no_slots_offers_doctor_retry() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| {
        r.availability = Some(SlotAvailability { success: true, ..SlotAvailability::default() })
    });
    let controller = controller(gateway.clone());

    let session = at_date_selection(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SelectDate { date: target_date() })
        .await;

    assert_eq!(session.stage(), ConversationStage::DoctorSelection);
    assert_matches!(
        last_payload(&session),
        MessagePayload::NoSlots { retry: RetryAction::DoctorSelection, .. }
    );

    let doctor_lists = gateway.calls("list_doctors");
    let session = controller.handle(session, DialogueEvent::RetryDoctorSelection).await;

    assert_eq!(gateway.calls("list_doctors"), doctor_lists + 1);
    assert_eq!(session.stage(), ConversationStage::DoctorSelection);
    assert_matches!(last_payload(&session), MessagePayload::DoctorChoices { doctors, best_match: true } => {
        assert_eq!(doctors.len(), 2);
    });
}

#[tokio::test]
async fn test_slot_lookup_failure_behaves_like_no_slots() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.availability = None);
    let controller = controller(gateway);

    let session = at_date_selection(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SelectDate { date: target_date() })
        .await;

    assert_eq!(session.stage(), ConversationStage::DoctorSelection);
    assert_eq!(last_payload(&session).kind(), "no_slots");
}

#[tokio::test]
async fn test_best_match_picks_first_doctor() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway);

    let session = at_patient_selection(&controller).await;
    let session = drive(
        &controller,
        session,
        vec![
            DialogueEvent::SelectPatient { patient: patient("p-1", "Jane Doe") },
            DialogueEvent::SelectDoctor { doctor: DoctorChoice::BestMatch },
        ],
    )
    .await;

    assert_eq!(session.stage(), ConversationStage::DateSelection);
    assert_eq!(session.draft().doctor_id.as_deref(), Some("d-1"));
    assert_eq!(session.draft().doctor_name.as_deref(), Some("Dr. Rao"));
}

#[tokio::test]
async fn test_empty_doctor_list_returns_to_menu() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.doctors = Some(vec![]));
    let controller = controller(gateway);

    let session = at_patient_selection(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SelectPatient { patient: patient("p-1", "Jane Doe") })
        .await;

    assert_eq!(session.stage(), ConversationStage::Idle);
    assert!(assistant_texts_since(&session, 0)
        .contains(&i18n::text(Language::English, MessageKey::NoDoctors)));
}

#[tokio::test]
async fn test_new_patient_keeps_phone() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway);

    let session = at_patient_selection(&controller).await;
    let session = controller.handle(session, DialogueEvent::SelectNewPatient).await;

    assert_eq!(session.stage(), ConversationStage::CollectingName);
    assert_eq!(session.draft().phone.as_deref(), Some(PHONE));
    assert!(session.draft().patient_id.is_none());
    assert_eq!(
        session.messages().as_slice()[session.messages().len() - 2].text,
        i18n::text(Language::English, MessageKey::NewPatientLabel)
    );
}

#[tokio::test]
async fn test_hospital_and_contact_info() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway.clone());

    let session = started(&controller).await;
    let session = controller
        .handle(session, DialogueEvent::SelectMenuOption { option: MenuOption::HospitalInfo })
        .await;
    assert_eq!(session.stage(), ConversationStage::Idle);
    assert!(last_text(&session).starts_with("City Care Hospital (CCH)"));
    assert!(last_text(&session).contains("Address: 12 MG Road, Pune"));

    let session = controller
        .handle(session, DialogueEvent::SelectMenuOption { option: MenuOption::ContactInfo })
        .await;
    assert!(last_text(&session).contains("Phone: 020-5555-0100"));
    assert!(last_text(&session).contains("Email: desk@citycare.example"));

    gateway.update(|r| r.hospital = None);
    let session = controller
        .handle(session, DialogueEvent::SelectMenuOption { option: MenuOption::HospitalInfo })
        .await;
    assert_eq!(session.stage(), ConversationStage::Idle);
    assert_eq!(last_text(&session), i18n::text(Language::English, MessageKey::ServiceUnavailable));
}

#[tokio::test]
async fn test_free_text_routes_by_intent() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway);

    let session = controller
        .handle(
            started(&controller).await,
            DialogueEvent::SubmitFreeText { text: "where is the hospital".to_string() },
        )
        .await;
    assert_eq!(session.stage(), ConversationStage::Idle);
    assert!(last_text(&session).starts_with("City Care Hospital"));

    let session = controller
        .handle(session, DialogueEvent::SubmitFreeText { text: "good morning".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::Idle);
    assert!(assistant_texts_since(&session, 0)
        .contains(&i18n::text(Language::English, MessageKey::NotUnderstood)));
    assert_matches!(last_payload(&session), MessagePayload::MenuChoices { .. });

    let session = controller
        .handle(session, DialogueEvent::SubmitFreeText { text: "I want to book an appointment".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingName);
    assert!(session.draft().phone.is_none());
    assert!(session.draft().doctor_id.is_none());
}

#[tokio::test]
async fn test_menu_stays_live_after_finalized() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway);

    let session = at_date_selection(&controller).await;
    let session = drive(
        &controller,
        session,
        vec![DialogueEvent::SelectDate { date: target_date() }, first_slot()],
    )
    .await;
    assert_eq!(session.stage(), ConversationStage::Finalized);

    let session = controller
        .handle(session, DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingPhone);
    assert!(session.draft().doctor_id.is_none());
}

#[tokio::test]
async fn test_slow_gateway_falls_back_after_timeout() {
    let gateway = FakeGateway::happy();
    let controller = DialogueController::new(
        gateway.clone(),
        Arc::new(IntentClassifier::offline()),
        settings(50),
    );
    let session = controller
        .handle(
            started(&controller).await,
            DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
        )
        .await;

    gateway.update(|r| r.delay = Some(Duration::from_millis(500)));
    let session = controller
        .handle(session, DialogueEvent::SubmitPhone { text: PHONE.to_string() })
        .await;

    assert_eq!(gateway.calls("check_patient"), 1);
    assert_eq!(session.stage(), ConversationStage::CollectingName);
}

#[tokio::test]
async fn test_message_log_is_append_only() {
    let gateway = FakeGateway::happy();
    let controller = controller(gateway);

    let steps = vec![
        DialogueEvent::SelectLanguage { language: Language::English },
        DialogueEvent::SubmitFreeText { text: "hello".to_string() },
        DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
        DialogueEvent::SubmitPhone { text: "12".to_string() },
        DialogueEvent::SubmitPhone { text: PHONE.to_string() },
        DialogueEvent::SelectDate { date: target_date() },
        DialogueEvent::SelectPatient { patient: patient("p-1", "Jane Doe") },
        DialogueEvent::SelectDoctor { doctor: DoctorChoice::BestMatch },
        DialogueEvent::SelectDate { date: target_date() },
        first_slot(),
    ];

    let mut session = Session::new();
    for event in steps {
        let before = session.messages().clone();
        session = controller.handle(session, event).await;
        let after = session.messages();

        assert!(after.len() >= before.len());
        for (old, new) in before.iter().zip(after.iter()) {
            assert_eq!(old.id, new.id);
            assert_eq!(old.author, new.author);
            assert_eq!(old.created_at, new.created_at);
            assert_eq!(old.text, new.text);
        }
    }
    assert_eq!(session.stage(), ConversationStage::Finalized);
}

#[tokio::test]
async fn test_new_caller_end_to_end() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| r.patients = Some(vec![]));
    let controller = controller(gateway.clone());

    let session = controller
        .handle(Session::new(), DialogueEvent::SelectLanguage { language: Language::English })
        .await;
    let session = drive(
        &controller,
        session,
        vec![
            DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
            DialogueEvent::SubmitPhone { text: PHONE.to_string() },
        ],
    )
    .await;
    assert_eq!(session.stage(), ConversationStage::CollectingName);

    let session = controller
        .handle(session, DialogueEvent::SubmitName { text: "Jane Doe".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingDob);

    let session = controller
        .handle(session, DialogueEvent::SubmitDob { text: "1990-05-20".to_string() })
        .await;
    assert_eq!(session.stage(), ConversationStage::CollectingGender);

    gateway.update(|r| r.patients = Some(vec![patient("p-9", "Jane Doe")]));
    let session = controller
        .handle(session, DialogueEvent::SubmitGender { text: "female".to_string() })
        .await;

    assert_eq!(session.stage(), ConversationStage::PatientSelection);
    assert_eq!(gateway.calls("register_patient"), 1);
    assert_eq!(gateway.calls("check_patient"), 2);
    assert_matches!(last_payload(&session), MessagePayload::PatientChoices { patients, allow_new_patient } => {
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, "p-9");
        assert!(*allow_new_patient);
    });
}

#[tokio::test]
async fn test_booking_response_without_reference_still_confirms() {
    let gateway = FakeGateway::happy();
    gateway.update(|r| {
        r.booking = Some(BookingResponse { success: true, ..BookingResponse::default() });
        r.appointment = Some(AppointmentRecord::default());
    });
    let controller = controller(gateway.clone());

    let session = at_date_selection(&controller).await;
    let session = drive(
        &controller,
        session,
        vec![DialogueEvent::SelectDate { date: target_date() }, first_slot()],
    )
    .await;

    assert_eq!(session.stage(), ConversationStage::Finalized);
    assert_eq!(gateway.calls("appointment_details"), 0);
    assert_matches!(last_payload(&session), MessagePayload::Confirmation(details) => {
        assert!(details.tracking_link.is_none());
    });
}
