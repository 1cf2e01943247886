use rusqlite::{params, Connection, OptionalExtension};

use super::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_medical_record(conn: &Connection, record: &NewMedicalRecord) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medical_records (patient_id, appointment_id, record_date, diagnosis, treatment, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.patient_id,
            record.appointment_id,
            format_datetime(&record.record_date),
            record.diagnosis,
            record.treatment,
            record.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medical_record(conn: &Connection, id: i64) -> Result<Option<MedicalRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT record_id, patient_id, appointment_id, record_date, diagnosis, treatment, notes
             FROM medical_records WHERE record_id = ?1",
            params![id],
            record_row_from_rusqlite,
        )
        .optional()?;
    row.map(record_from_row).transpose()
}

/// A patient's records, most recent first.
pub fn list_medical_records_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<MedicalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT record_id, patient_id, appointment_id, record_date, diagnosis, treatment, notes
         FROM medical_records WHERE patient_id = ?1
         ORDER BY record_date DESC, record_id DESC",
    )?;

    let rows = stmt.query_map(params![patient_id], record_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

pub fn delete_medical_record(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM medical_records WHERE record_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("MedicalRecord", id));
    }
    Ok(())
}

type RecordRow = (i64, i64, Option<i64>, String, Option<String>, Option<String>, Option<String>);

fn record_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RecordRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn record_from_row(row: RecordRow) -> Result<MedicalRecord, DatabaseError> {
    let (id, patient_id, appointment_id, record_date, diagnosis, treatment, notes) = row;
    Ok(MedicalRecord {
        id,
        patient_id,
        appointment_id,
        record_date: parse_datetime("record_date", &record_date)?,
        diagnosis,
        treatment,
        notes,
    })
}
