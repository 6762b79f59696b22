use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{
    AppointmentRecord, AppointmentRef, BookAppointmentRequest, BookingResponse,
    CheckPatientResponse, Doctor, HospitalInfo, RegisterPatientRequest,
    RegisterPatientResponse, SlotAvailability, SlotQuery,
};

/// Everything the booking assistant needs from the hospital backend.
///
/// Implementations scope every call to their own hospital; callers never
/// pass a hospital id.
#[async_trait]
pub trait HospitalGateway: Send + Sync {
    async fn check_patient(&self, phone: &str) -> Result<CheckPatientResponse, GatewayError>;

    async fn register_patient(
        &self,
        request: &RegisterPatientRequest,
    ) -> Result<RegisterPatientResponse, GatewayError>;

    async fn list_doctors(&self) -> Result<Vec<Doctor>, GatewayError>;

    async fn available_slots(&self, query: &SlotQuery) -> Result<SlotAvailability, GatewayError>;

    async fn book_appointment(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<BookingResponse, GatewayError>;

    async fn appointment_details(
        &self,
        reference: &AppointmentRef,
    ) -> Result<AppointmentRecord, GatewayError>;

    async fn hospital_info(&self) -> Result<HospitalInfo, GatewayError>;
}
