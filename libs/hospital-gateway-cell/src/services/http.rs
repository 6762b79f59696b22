use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use shared_config::AppConfig;
use shared_http::HospitalApiClient;

use crate::error::GatewayError;
use crate::models::{
    AppointmentRecord, AppointmentRef, BookAppointmentRequest, BookingResponse,
    CheckPatientResponse, Doctor, DoctorListResponse, HospitalInfo,
    RegisterPatientRequest, RegisterPatientResponse, SlotAvailability, SlotQuery,
};
use crate::services::gateway::HospitalGateway;

#[derive(Deserialize)]
#[serde(untagged)]
enum AppointmentEnvelope {
    Wrapped { appointment: AppointmentRecord },
    Bare(AppointmentRecord),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HospitalEnvelope {
    Wrapped { hospital: HospitalInfo },
    Bare(HospitalInfo),
}

pub struct HttpHospitalGateway {
    client: HospitalApiClient,
    hospital_id: String,
}

impl HttpHospitalGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: HospitalApiClient::new(config),
            hospital_id: config.hospital_id.clone(),
        }
    }

    fn hospital_query(&self) -> String {
        if self.hospital_id.is_empty() {
            String::new()
        } else {
            format!("?hospital_id={}", urlencoding::encode(&self.hospital_id))
        }
    }
}

#[async_trait]
impl HospitalGateway for HttpHospitalGateway {
    #[instrument(skip(self, phone))]
    async fn check_patient(&self, phone: &str) -> Result<CheckPatientResponse, GatewayError> {
        debug!("Looking up patients by phone");

        let body = json!({
            "phone": phone,
            "hospital_id": self.hospital_id,
        });

        Ok(self.client.post("/chatbot/check-patient", body).await?)
    }

    #[instrument(skip(self, request))]
    async fn register_patient(
        &self,
        request: &RegisterPatientRequest,
    ) -> Result<RegisterPatientResponse, GatewayError> {
        debug!("Registering new patient");

        let body = json!({
            "name": request.name,
            "phone": request.phone,
            "hospital_id": self.hospital_id,
            "gender": request.gender,
            "dob": request.dob,
        });

        Ok(self.client.post("/chatbot/register-patient", body).await?)
    }

    #[instrument(skip(self))]
    async fn list_doctors(&self) -> Result<Vec<Doctor>, GatewayError> {
        let path = format!("/chatbot/doctors{}", self.hospital_query());
        let response: DoctorListResponse = self.client.get(&path).await?;
        let doctors = response.into_doctors();

        debug!("Fetched {} doctors", doctors.len());
        Ok(doctors)
    }

    #[instrument(skip(self, query), fields(doctor_id = %query.doctor_id, date = %query.date))]
    async fn available_slots(&self, query: &SlotQuery) -> Result<SlotAvailability, GatewayError> {
        let mut body = json!({
            "hospital_id": self.hospital_id,
            "doctor_id": query.doctor_id,
            "date": query.date.format("%Y-%m-%d").to_string(),
        });
        if let Some(phone) = &query.phone {
            body["phone"] = json!(phone);
        }
        if let Some(patient_id) = &query.patient_id {
            body["patient_id"] = json!(patient_id);
        }

        Ok(self.client.post("/chatbot/available-slots", body).await?)
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id, slot_id = %request.slot_id))]
    async fn book_appointment(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<BookingResponse, GatewayError> {
        let mut body = json!({
            "hospital_id": self.hospital_id,
            "doctor_id": request.doctor_id,
            "date": request.date.format("%Y-%m-%d").to_string(),
            "slot_id": request.slot_id,
            "patient_name": request.patient_name,
            "phone": request.phone,
        });
        if let Some(patient_id) = &request.patient_id {
            body["patient_id"] = json!(patient_id);
        }

        Ok(self.client.post("/chatbot/book-appointment", body).await?)
    }

    #[instrument(skip(self))]
    async fn appointment_details(
        &self,
        reference: &AppointmentRef,
    ) -> Result<AppointmentRecord, GatewayError> {
        let path = match reference {
            AppointmentRef::Uid(uid) => format!("/chatbot/appointments/{}", urlencoding::encode(uid)),
            AppointmentRef::Id(id) => format!("/chatbot/appointments?appointment_id={}", urlencoding::encode(id)),
        };

        let envelope: AppointmentEnvelope = self.client.get(&path).await?;
        Ok(match envelope {
            AppointmentEnvelope::Wrapped { appointment } => appointment,
            AppointmentEnvelope::Bare(appointment) => appointment,
        })
    }

    #[instrument(skip(self))]
    async fn hospital_info(&self) -> Result<HospitalInfo, GatewayError> {
        let path = format!("/chatbot/hospital-info{}", self.hospital_query());
        let raw: Value = self.client.get(&path).await?;

        let envelope: HospitalEnvelope = serde_json::from_value(raw)
            .map_err(shared_http::HttpClientError::from)?;
        let info = match envelope {
            HospitalEnvelope::Wrapped { hospital } => hospital,
            HospitalEnvelope::Bare(hospital) => hospital,
        };

        if info.name.is_empty() {
            return Err(GatewayError::Rejected("hospital info without a name".to_string()));
        }
        Ok(info)
    }
}
