use crate::models::Intent;

/// Last-resort substring rules. Always produces a decision.
pub fn classify(text: &str) -> Intent {
    let text = text.to_lowercase();

    if text.contains("book") || text.contains("appointment") {
        Intent::BookAppointment
    } else if text.contains("hospital") {
        Intent::HospitalInfo
    } else if text.contains("contact") || text.contains("phone") || text.contains("email") {
        Intent::ContactInfo
    } else {
        Intent::None
    }
}
