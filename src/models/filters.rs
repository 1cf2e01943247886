use chrono::NaiveDateTime;

use super::enums::{AppointmentStatus, BillingStatus};

#[derive(Debug, Default)]
pub struct DoctorFilter {
    pub active_only: bool,
    pub specialty_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct PatientFilter {
    /// Case-insensitive substring of first or last name.
    pub name: Option<String>,
}

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    /// Inclusive lower bound on `scheduled_start`.
    pub starts_from: Option<NaiveDateTime>,
    /// Exclusive upper bound on `scheduled_start`.
    pub starts_before: Option<NaiveDateTime>,
}

#[derive(Debug, Default)]
pub struct BillingFilter {
    pub patient_id: Option<i64>,
    pub status: Option<BillingStatus>,
}
