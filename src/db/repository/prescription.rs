use rusqlite::{params, Connection, OptionalExtension};

use super::{format_date, parse_date};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_prescription(conn: &Connection, rx: &NewPrescription) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (patient_id, doctor_id, appointment_id, prescribed_date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            rx.patient_id,
            rx.doctor_id,
            rx.appointment_id,
            format_date(&rx.prescribed_date),
            rx.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_prescription(conn: &Connection, id: i64) -> Result<Option<Prescription>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT prescription_id, patient_id, doctor_id, appointment_id, prescribed_date, notes
             FROM prescriptions WHERE prescription_id = ?1",
            params![id],
            prescription_row_from_rusqlite,
        )
        .optional()?;
    row.map(prescription_from_row).transpose()
}

/// A patient's prescriptions, most recent first.
pub fn list_prescriptions_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT prescription_id, patient_id, doctor_id, appointment_id, prescribed_date, notes
         FROM prescriptions WHERE patient_id = ?1
         ORDER BY prescribed_date DESC, prescription_id DESC",
    )?;

    let rows = stmt.query_map(params![patient_id], prescription_row_from_rusqlite)?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(prescription_from_row(row?)?);
    }
    Ok(prescriptions)
}

/// Removes the prescription and its items (cascade).
pub fn delete_prescription(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM prescriptions WHERE prescription_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Prescription", id));
    }
    Ok(())
}

pub fn add_prescription_item(conn: &Connection, item: &PrescriptionItem) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescription_items (prescription_id, medication_id, dosage, duration, quantity)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.prescription_id,
            item.medication_id,
            item.dosage,
            item.duration,
            item.quantity,
        ],
    )?;
    Ok(())
}

pub fn get_prescription_items(
    conn: &Connection,
    prescription_id: i64,
) -> Result<Vec<PrescriptionItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT prescription_id, medication_id, dosage, duration, quantity
         FROM prescription_items WHERE prescription_id = ?1
         ORDER BY medication_id",
    )?;

    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok(PrescriptionItem {
            prescription_id: row.get(0)?,
            medication_id: row.get(1)?,
            dosage: row.get(2)?,
            duration: row.get(3)?,
            quantity: row.get(4)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn remove_prescription_item(
    conn: &Connection,
    prescription_id: i64,
    medication_id: i64,
) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM prescription_items WHERE prescription_id = ?1 AND medication_id = ?2",
        params![prescription_id, medication_id],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::not_found(
            "PrescriptionItem",
            format!("{prescription_id}/{medication_id}"),
        ));
    }
    Ok(())
}

type PrescriptionRow = (i64, i64, i64, Option<i64>, String, Option<String>);

fn prescription_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PrescriptionRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    let (id, patient_id, doctor_id, appointment_id, prescribed_date, notes) = row;
    Ok(Prescription {
        id,
        patient_id,
        doctor_id,
        appointment_id,
        prescribed_date: parse_date("prescribed_date", &prescribed_date)?,
        notes,
    })
}
