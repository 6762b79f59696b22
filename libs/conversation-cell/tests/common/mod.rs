#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use conversation_cell::{
    DialogueController, DialogueEvent, DialogueSettings, Language, MenuOption, Session,
};
use hospital_gateway_cell::{
    AppointmentRecord, AppointmentRef, BookAppointmentRequest, BookingResponse,
    CheckPatientResponse, Doctor, GatewayError, HospitalGateway, HospitalInfo, PatientRecord,
    RegisterPatientRequest, RegisterPatientResponse, Slot, SlotAvailability, SlotQuery,
};
use intent_cell::IntentClassifier;

pub const PHONE: &str = "9876543210";
pub const APPOINTMENT_UID: &str = "apt-uid-1";

/// Canned hospital responses. `None` makes the matching call fail.
#[derive(Clone)]
pub struct FakeResponses {
    pub patients: Option<Vec<PatientRecord>>,
    pub registration: Option<RegisterPatientResponse>,
    pub doctors: Option<Vec<Doctor>>,
    pub availability: Option<SlotAvailability>,
    pub booking: Option<BookingResponse>,
    pub appointment: Option<AppointmentRecord>,
    pub hospital: Option<HospitalInfo>,
    pub delay: Option<Duration>,
}

impl Default for FakeResponses {
    fn default() -> Self {
        Self {
            patients: Some(vec![patient("p-1", "Jane Doe")]),
            registration: Some(RegisterPatientResponse {
                success: true,
                patient_id: Some("p-new".to_string()),
                message: None,
            }),
            doctors: Some(vec![doctor("d-1", "Dr. Rao"), doctor("d-2", "Dr. Shah")]),
            availability: Some(SlotAvailability {
                success: true,
                slots: vec![slot("s-1", "09:00", "09:15"), slot("s-2", "14:00", "14:15")],
                ..SlotAvailability::default()
            }),
            booking: Some(BookingResponse {
                success: true,
                appointment_uid: Some(APPOINTMENT_UID.to_string()),
                appointment_id: Some("42".to_string()),
                message: None,
            }),
            appointment: Some(appointment_record()),
            hospital: Some(HospitalInfo {
                name: "City Care Hospital".to_string(),
                short_name: Some("CCH".to_string()),
                address: Some("12 MG Road, Pune".to_string()),
                phone: Some("020-5555-0100".to_string()),
                email: Some("desk@citycare.example".to_string()),
                appointment_day_limit: Some(5),
            }),
            delay: None,
        }
    }
}

pub struct FakeGateway {
    responses: Mutex<FakeResponses>,
    calls: Mutex<HashMap<&'static str, usize>>,
    pub last_registration: Mutex<Option<RegisterPatientRequest>>,
    pub last_slot_query: Mutex<Option<SlotQuery>>,
    pub last_booking: Mutex<Option<BookAppointmentRequest>>,
}

impl FakeGateway {
    pub fn new(responses: FakeResponses) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(HashMap::new()),
            last_registration: Mutex::new(None),
            last_slot_query: Mutex::new(None),
            last_booking: Mutex::new(None),
        })
    }

    pub fn happy() -> Arc<Self> {
        Self::new(FakeResponses::default())
    }

    pub fn update(&self, change: impl FnOnce(&mut FakeResponses)) {
        change(&mut self.responses.lock().unwrap());
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    async fn record(&self, operation: &'static str) -> FakeResponses {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
        let responses = self.responses.lock().unwrap().clone();
        if let Some(delay) = responses.delay {
            tokio::time::sleep(delay).await;
        }
        responses
    }
}

fn unavailable<T>(value: Option<T>, operation: &str) -> Result<T, GatewayError> {
    value.ok_or_else(|| GatewayError::Rejected(format!("{} unavailable", operation)))
}

#[async_trait]
impl HospitalGateway for FakeGateway {
    async fn check_patient(&self, _phone: &str) -> Result<CheckPatientResponse, GatewayError> {
        let patients = unavailable(self.record("check_patient").await.patients, "check_patient")?;
        Ok(CheckPatientResponse {
            exists: !patients.is_empty(),
            patients,
            patient: None,
        })
    }

    async fn register_patient(
        &self,
        request: &RegisterPatientRequest,
    ) -> Result<RegisterPatientResponse, GatewayError> {
        *self.last_registration.lock().unwrap() = Some(request.clone());
        unavailable(self.record("register_patient").await.registration, "register_patient")
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, GatewayError> {
        unavailable(self.record("list_doctors").await.doctors, "list_doctors")
    }

    async fn available_slots(&self, query: &SlotQuery) -> Result<SlotAvailability, GatewayError> {
        *self.last_slot_query.lock().unwrap() = Some(query.clone());
        unavailable(self.record("available_slots").await.availability, "available_slots")
    }

    async fn book_appointment(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<BookingResponse, GatewayError> {
        *self.last_booking.lock().unwrap() = Some(request.clone());
        unavailable(self.record("book_appointment").await.booking, "book_appointment")
    }

    async fn appointment_details(
        &self,
        _reference: &AppointmentRef,
    ) -> Result<AppointmentRecord, GatewayError> {
        unavailable(self.record("appointment_details").await.appointment, "appointment_details")
    }

    async fn hospital_info(&self) -> Result<HospitalInfo, GatewayError> {
        unavailable(self.record("hospital_info").await.hospital, "hospital_info")
    }
}

pub fn patient(id: &str, name: &str) -> PatientRecord {
    PatientRecord {
        id: id.to_string(),
        name: name.to_string(),
        phone: Some(PHONE.to_string()),
        gender: Some("Female".to_string()),
        date_of_birth: Some("1990-05-20".to_string()),
    }
}

pub fn doctor(id: &str, name: &str) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialization: Some("General Medicine".to_string()),
    }
}

pub fn slot(id: &str, start: &str, end: &str) -> Slot {
    Slot {
        id: id.to_string(),
        label: None,
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        period: None,
    }
}

pub fn appointment_record() -> AppointmentRecord {
    AppointmentRecord {
        appointment_uid: Some(APPOINTMENT_UID.to_string()),
        appointment_id: Some("42".to_string()),
        patient_name: Some("Jane Doe".to_string()),
        hospital_name: Some("City Care Hospital".to_string()),
        doctor_name: Some("Dr. Rao".to_string()),
        date: Some("2026-10-21".to_string()),
        start_time: Some("10:00".to_string()),
        end_time: Some("10:15".to_string()),
        time_label: None,
        token_number: Some("7".to_string()),
    }
}

pub fn settings(timeout_ms: u64) -> DialogueSettings {
    DialogueSettings {
        call_timeout: Duration::from_millis(timeout_ms),
        appointment_day_limit: 7,
        tracking_base_url: "https://track.example.com".to_string(),
    }
}

pub fn controller(gateway: Arc<FakeGateway>) -> DialogueController {
    DialogueController::new(gateway, Arc::new(IntentClassifier::offline()), settings(1_000))
}

pub async fn drive(controller: &DialogueController, session: Session, events: Vec<DialogueEvent>) -> Session {
    let mut session = session;
    for event in events {
        session = controller.handle(session, event).await;
    }
    session
}

/// English session sitting at the menu.
pub async fn started(controller: &DialogueController) -> Session {
    controller
        .handle(Session::new(), DialogueEvent::SelectLanguage { language: Language::English })
        .await
}

pub async fn at_patient_selection(controller: &DialogueController) -> Session {
    let session = started(controller).await;
    drive(
        controller,
        session,
        vec![
            DialogueEvent::SelectMenuOption { option: MenuOption::BookAppointment },
            DialogueEvent::SubmitPhone { text: PHONE.to_string() },
        ],
    )
    .await
}

pub async fn at_date_selection(controller: &DialogueController) -> Session {
    let session = at_patient_selection(controller).await;
    drive(
        controller,
        session,
        vec![
            DialogueEvent::SelectPatient { patient: patient("p-1", "Jane Doe") },
            DialogueEvent::SelectDoctor {
                doctor: conversation_cell::DoctorChoice::Doctor {
                    id: "d-1".to_string(),
                    name: "Dr. Rao".to_string(),
                },
            },
        ],
    )
    .await
}
