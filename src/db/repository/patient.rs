use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use super::{format_date, parse_date, parse_datetime};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "patient_id, first_name, last_name, date_of_birth, gender, phone, email, address,
     emergency_contact_name, emergency_contact_phone, created_at";

pub fn insert_patient(conn: &Connection, patient: &NewPatient) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (first_name, last_name, date_of_birth, gender, phone, email, address,
         emergency_contact_name, emergency_contact_phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            patient.first_name,
            patient.last_name,
            format_date(&patient.date_of_birth),
            patient.gender.map(|g| g.as_str()),
            patient.phone,
            patient.email,
            patient.address,
            patient.emergency_contact_name,
            patient.emergency_contact_phone,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?1"),
            params![id],
            patient_row_from_rusqlite,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

/// Patients ordered by last then first name.
pub fn list_patients(conn: &Connection, filter: &PatientFilter) -> Result<Vec<Patient>, DatabaseError> {
    let mut sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(ref name) = filter.name {
        params_vec.push(Box::new(contains_pattern(name)));
        let idx = params_vec.len();
        sql.push_str(&format!(
            " AND (LOWER(first_name) LIKE LOWER(?{idx}) ESCAPE '\\' \
               OR LOWER(last_name) LIKE LOWER(?{idx}) ESCAPE '\\')"
        ));
    }
    sql.push_str(" ORDER BY last_name, first_name");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn update_patient_contact(
    conn: &Connection,
    id: i64,
    contact: &PatientContact,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET phone = ?1, email = ?2, address = ?3,
         emergency_contact_name = ?4, emergency_contact_phone = ?5
         WHERE patient_id = ?6",
        params![
            contact.phone,
            contact.email,
            contact.address,
            contact.emergency_contact_name,
            contact.emergency_contact_phone,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

/// Removes the patient together with their appointments, medical records,
/// prescriptions and bills (cascade).
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM patients WHERE patient_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    tracing::info!(patient_id = id, "Patient deleted");
    Ok(())
}

/// `LIKE` pattern matching `needle` literally anywhere in the value.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// Internal row type for Patient mapping
struct PatientRow {
    id: i64,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    gender: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    created_at: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        emergency_contact_name: row.get(8)?,
        emergency_contact_phone: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: parse_date("date_of_birth", &row.date_of_birth)?,
        gender: row.gender.as_deref().map(Gender::from_str).transpose()?,
        phone: row.phone,
        email: row.email,
        address: row.address,
        emergency_contact_name: row.emergency_contact_name,
        emergency_contact_phone: row.emergency_contact_phone,
        created_at: parse_datetime("created_at", &row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::ConstraintKind;

    #[test]
    fn patient_insert_and_retrieve() {
        let conn = test_db();
        let id = make_patient(&conn, "Wanjiru");
        let patient = get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.full_name(), "Wanjiru Test");
        assert_eq!(patient.date_of_birth, day("1990-05-17"));
        assert_eq!(patient.gender, Some(Gender::Female));
    }

    #[test]
    fn gender_is_optional() {
        let conn = test_db();
        let id = insert_patient(&conn, &NewPatient {
            first_name: "Sam".into(),
            last_name: "Achieng".into(),
            date_of_birth: day("2016-01-05"),
            gender: None,
            phone: None,
            email: None,
            address: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
        })
        .unwrap();
        assert_eq!(get_patient(&conn, id).unwrap().unwrap().gender, None);
    }

    #[test]
    fn gender_outside_domain_is_rejected_by_store() {
        let conn = test_db();
        let err = conn
            .execute(
                "INSERT INTO patients (first_name, last_name, date_of_birth, gender)
                 VALUES ('X', 'Y', '2000-01-01', 'Unknown')",
                [],
            )
            .map_err(DatabaseError::from)
            .unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Check));
    }

    #[test]
    fn list_patients_filters_by_name() {
        let conn = test_db();
        make_patient(&conn, "John");
        make_patient(&conn, "Joanna");
        make_patient(&conn, "Peter");

        let found = list_patients(&conn, &PatientFilter { name: Some("jo".into()) }).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(list_patients(&conn, &PatientFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn name_filter_matches_wildcard_characters_literally() {
        let conn = test_db();
        make_patient(&conn, "Anne_Marie");
        make_patient(&conn, "AnneXMarie");
        make_patient(&conn, "Bob");

        let found = list_patients(&conn, &PatientFilter { name: Some("e_m".into()) }).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Anne_Marie");

        let percent = list_patients(&conn, &PatientFilter { name: Some("%".into()) }).unwrap();
        assert!(percent.is_empty());
    }

    #[test]
    fn update_contact_replaces_all_fields() {
        let conn = test_db();
        let id = make_patient(&conn, "John");
        update_patient_contact(&conn, id, &PatientContact {
            phone: None,
            email: Some("john@mail.test".into()),
            address: Some("12 Moi Avenue".into()),
            ..Default::default()
        })
        .unwrap();

        let patient = get_patient(&conn, id).unwrap().unwrap();
        assert_eq!(patient.phone, None);
        assert_eq!(patient.email.as_deref(), Some("john@mail.test"));
        assert_eq!(patient.address.as_deref(), Some("12 Moi Avenue"));
    }

    #[test]
    fn update_contact_on_missing_patient_is_not_found() {
        let conn = test_db();
        let err = update_patient_contact(&conn, 5, &PatientContact::default()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
