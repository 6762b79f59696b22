use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub hospital_api_url: String,
    pub hospital_api_key: String,
    pub hospital_id: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            hospital_api_url: "http://localhost:8000/api".to_string(),
            hospital_api_key: "test-api-key".to_string(),
            hospital_id: "hospital-test".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_api_url(url: &str) -> Self {
        Self {
            hospital_api_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Config with pacing disabled and a short call timeout.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            hospital_api_url: self.hospital_api_url.clone(),
            hospital_api_key: self.hospital_api_key.clone(),
            hospital_id: self.hospital_id.clone(),
            classifier_api_key: None,
            external_call_timeout_ms: 2_000,
            typing_delay_ms: 0,
            typing_jitter_ms: 0,
            tracking_base_url: "https://track.example.com".to_string(),
            ..AppConfig::default()
        }
    }
}

pub struct MockHospitalResponses;

impl MockHospitalResponses {
    pub fn patient(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "phone": "9876543210",
            "gender": "Female",
            "dob": "1990-05-20"
        })
    }

    pub fn check_patient_found(patients: Vec<Value>) -> Value {
        json!({
            "exists": true,
            "patients": patients
        })
    }

    pub fn check_patient_missing() -> Value {
        json!({ "exists": false })
    }

    pub fn doctor(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "specialization": "General Medicine"
        })
    }

    pub fn slots(slots: Vec<(&str, &str, &str)>) -> Value {
        let slots: Vec<Value> = slots
            .into_iter()
            .map(|(id, start, end)| json!({ "id": id, "start_time": start, "end_time": end }))
            .collect();
        json!({
            "success": true,
            "slots": slots
        })
    }

    pub fn booking_success() -> Value {
        json!({
            "success": true,
            "appointment_uid": Uuid::new_v4().to_string(),
            "appointment_id": 42
        })
    }

    pub fn appointment(uid: &str) -> Value {
        json!({
            "appointment_uid": uid,
            "patient_name": "Jane Doe",
            "hospital_name": "City Care Hospital",
            "doctor_name": "Dr. Rao",
            "date": "2026-10-21",
            "start_time": "10:00",
            "end_time": "10:15",
            "token_number": 7
        })
    }

    pub fn hospital_info() -> Value {
        json!({
            "name": "City Care Hospital",
            "short_name": "CCH",
            "address": "12 MG Road, Pune",
            "phone": "020-5555-0100",
            "email": "desk@citycare.example",
            "appointment_day_limit": 5
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "success": false,
            "message": message
        })
    }
}
