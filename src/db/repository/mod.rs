//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table group. All public functions are re-exported here.
//! Every function borrows a `&Connection`; multi-statement writes run in an
//! unchecked transaction so they land as a unit.

mod appointment;
mod billing;
mod consistency;
mod doctor;
mod medical_record;
mod medication;
mod patient;
mod prescription;
mod room;
mod specialty;

use chrono::{NaiveDate, NaiveDateTime};

use super::DatabaseError;

pub use appointment::*;
pub use billing::*;
pub use consistency::*;
pub use doctor::*;
pub use medical_record::*;
pub use medication::*;
pub use patient::*;
pub use prescription::*;
pub use room::*;
pub use specialty::*;

/// Fraction is written only when non-zero and is optional on parse, so
/// whole-second values from `datetime('now')` read back unchanged.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_datetime(field: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|e| {
        DatabaseError::ConstraintViolation(format!("{field} is not a datetime ({value}): {e}"))
    })
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        DatabaseError::ConstraintViolation(format!("{field} is not a date ({value}): {e}"))
    })
}

/// Shared row builders for repository tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use rusqlite::Connection;

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::*;

    pub fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    pub fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap()
    }

    pub fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    pub fn make_patient(conn: &Connection, first_name: &str) -> i64 {
        insert_patient(conn, &NewPatient {
            first_name: first_name.into(),
            last_name: "Test".into(),
            date_of_birth: day("1990-05-17"),
            gender: Some(enums::Gender::Female),
            phone: Some("+254700000000".into()),
            email: None,
            address: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
        })
        .unwrap()
    }

    /// `tag` keeps email and licence unique across doctors in one test.
    pub fn make_doctor(conn: &Connection, tag: &str) -> i64 {
        insert_doctor(conn, &NewDoctor {
            first_name: "Dr".into(),
            last_name: tag.into(),
            email: format!("{tag}@clinic.test"),
            phone: None,
            license_no: format!("LIC-{tag}"),
            hire_date: Some(day("2020-01-01")),
        })
        .unwrap()
    }

    pub fn make_room(conn: &Connection, number: &str) -> i64 {
        insert_room(conn, &NewRoom {
            room_number: number.into(),
            room_type: Some("Consultation".into()),
            floor: Some(1),
        })
        .unwrap()
    }

    pub fn make_appointment(
        conn: &Connection,
        patient_id: i64,
        doctor_id: i64,
        room_id: Option<i64>,
        start: &str,
        end: &str,
    ) -> i64 {
        insert_appointment(conn, &NewAppointment {
            patient_id,
            doctor_id,
            room_id,
            scheduled_start: at(start),
            scheduled_end: at(end),
            reason: None,
        })
        .unwrap()
    }

    pub fn make_medication(conn: &Connection, name: &str) -> i64 {
        insert_medication(conn, &NewMedication {
            name: name.into(),
            form: Some("Tablet".into()),
            strength: None,
            manufacturer: None,
        })
        .unwrap()
    }
}
