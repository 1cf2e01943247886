use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use super::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str =
    "appointment_id, patient_id, doctor_id, room_id, scheduled_start, scheduled_end, status, reason, created_at";

/// Book an appointment with status `Scheduled`. The store rejects an end
/// that is not strictly after the start.
pub fn insert_appointment(conn: &Connection, appt: &NewAppointment) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, room_id, scheduled_start, scheduled_end, status, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            appt.patient_id,
            appt.doctor_id,
            appt.room_id,
            format_datetime(&appt.scheduled_start),
            format_datetime(&appt.scheduled_end),
            AppointmentStatus::Scheduled.as_str(),
            appt.reason,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(appointment_id = id, doctor_id = appt.doctor_id, "Appointment booked");
    Ok(id)
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"),
            params![id],
            appointment_row_from_rusqlite,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

/// Appointments matching `filter`, ordered by start time.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(doctor_id) = filter.doctor_id {
        params_vec.push(Box::new(doctor_id));
        sql.push_str(&format!(" AND doctor_id = ?{}", params_vec.len()));
    }
    if let Some(patient_id) = filter.patient_id {
        params_vec.push(Box::new(patient_id));
        sql.push_str(&format!(" AND patient_id = ?{}", params_vec.len()));
    }
    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        sql.push_str(&format!(" AND status = ?{}", params_vec.len()));
    }
    if let Some(ref from) = filter.starts_from {
        params_vec.push(Box::new(format_datetime(from)));
        sql.push_str(&format!(" AND scheduled_start >= ?{}", params_vec.len()));
    }
    if let Some(ref before) = filter.starts_before {
        params_vec.push(Box::new(format_datetime(before)));
        sql.push_str(&format!(" AND scheduled_start < ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY scheduled_start ASC, appointment_id ASC");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), appointment_row_from_rusqlite)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Statuses carry no enforced transition rules; any value in the domain may follow any other.
pub fn update_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE appointment_id = ?2",
        params![status.as_str(), id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

/// Book the appointment into `room_id`, or clear the room with `None`.
pub fn assign_room(conn: &Connection, id: i64, room_id: Option<i64>) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET room_id = ?1 WHERE appointment_id = ?2",
        params![room_id, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

/// Linked medical records, prescriptions and bills survive with the link cleared.
pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM appointments WHERE appointment_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    room_id: Option<i64>,
    scheduled_start: String,
    scheduled_end: String,
    status: String,
    reason: Option<String>,
    created_at: String,
}

fn appointment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        room_id: row.get(3)?,
        scheduled_start: row.get(4)?,
        scheduled_end: row.get(5)?,
        status: row.get(6)?,
        reason: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        patient_id: row.patient_id,
        doctor_id: row.doctor_id,
        room_id: row.room_id,
        scheduled_start: parse_datetime("scheduled_start", &row.scheduled_start)?,
        scheduled_end: parse_datetime("scheduled_end", &row.scheduled_end)?,
        status: AppointmentStatus::from_str(&row.status)?,
        reason: row.reason,
        created_at: parse_datetime("created_at", &row.created_at)?,
    })
}
