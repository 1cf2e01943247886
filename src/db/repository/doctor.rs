use rusqlite::{params, Connection, OptionalExtension};

use super::{format_date, parse_date, parse_datetime};
use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str =
    "d.doctor_id, d.first_name, d.last_name, d.email, d.phone, d.license_no, d.hire_date, d.active, d.created_at";

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (first_name, last_name, email, phone, license_no, hire_date, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
        params![
            doctor.first_name,
            doctor.last_name,
            doctor.email,
            doctor.phone,
            doctor.license_no,
            doctor.hire_date.as_ref().map(format_date),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(doctor_id = id, "Doctor registered");
    Ok(id)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors d WHERE d.doctor_id = ?1"),
            params![id],
            doctor_row_from_rusqlite,
        )
        .optional()?;
    row.map(doctor_from_row).transpose()
}

/// Doctors ordered by last then first name.
pub fn list_doctors(conn: &Connection, filter: &DoctorFilter) -> Result<Vec<Doctor>, DatabaseError> {
    let mut sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors d WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if filter.active_only {
        sql.push_str(" AND d.active = 1");
    }
    if let Some(specialty_id) = filter.specialty_id {
        params_vec.push(Box::new(specialty_id));
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM doctor_specialties ds
                          WHERE ds.doctor_id = d.doctor_id AND ds.specialty_id = ?{})",
            params_vec.len()
        ));
    }
    sql.push_str(" ORDER BY d.last_name, d.first_name");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), doctor_row_from_rusqlite)?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(doctor_from_row(row?)?);
    }
    Ok(doctors)
}

pub fn set_doctor_active(conn: &Connection, id: i64, active: bool) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET active = ?1 WHERE doctor_id = ?2",
        params![active as i32, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Doctor", id));
    }
    Ok(())
}

/// Rejected by the store while appointments or prescriptions reference the doctor.
pub fn delete_doctor(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM doctors WHERE doctor_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Doctor", id));
    }
    Ok(())
}

pub fn assign_specialty(conn: &Connection, doctor_id: i64, specialty_id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctor_specialties (doctor_id, specialty_id) VALUES (?1, ?2)",
        params![doctor_id, specialty_id],
    )?;
    Ok(())
}

pub fn remove_specialty(conn: &Connection, doctor_id: i64, specialty_id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM doctor_specialties WHERE doctor_id = ?1 AND specialty_id = ?2",
        params![doctor_id, specialty_id],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::not_found(
            "DoctorSpecialty",
            format!("{doctor_id}/{specialty_id}"),
        ));
    }
    Ok(())
}

pub fn get_doctor_specialties(conn: &Connection, doctor_id: i64) -> Result<Vec<Specialty>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.specialty_id, s.name, s.description
         FROM specialties s
         JOIN doctor_specialties ds ON ds.specialty_id = s.specialty_id
         WHERE ds.doctor_id = ?1
         ORDER BY s.name",
    )?;

    let rows = stmt.query_map(params![doctor_id], |row| {
        Ok(Specialty {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

// Internal row type for Doctor mapping
struct DoctorRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    license_no: String,
    hire_date: Option<String>,
    active: i32,
    created_at: String,
}

fn doctor_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DoctorRow, rusqlite::Error> {
    Ok(DoctorRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        license_no: row.get(5)?,
        hire_date: row.get(6)?,
        active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<Doctor, DatabaseError> {
    Ok(Doctor {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        license_no: row.license_no,
        hire_date: row.hire_date.map(|d| parse_date("hire_date", &d)).transpose()?,
        active: row.active != 0,
        created_at: parse_datetime("created_at", &row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::repository::{insert_specialty, list_specialties};
    use crate::db::ConstraintKind;

    fn new_doctor(email: &str, license_no: &str) -> NewDoctor {
        NewDoctor {
            first_name: "Amina".into(),
            last_name: "Okafor".into(),
            email: email.into(),
            phone: Some("+254700100001".into()),
            license_no: license_no.into(),
            hire_date: Some(day("2018-03-01")),
        }
    }

    #[test]
    fn doctor_insert_and_retrieve() {
        let conn = test_db();
        let id = insert_doctor(&conn, &new_doctor("a@clinic.test", "LIC-1")).unwrap();
        let doctor = get_doctor(&conn, id).unwrap().unwrap();
        assert_eq!(doctor.full_name(), "Amina Okafor");
        assert_eq!(doctor.license_no, "LIC-1");
        assert_eq!(doctor.hire_date, Some(day("2018-03-01")));
        assert!(doctor.active);
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let conn = test_db();
        insert_doctor(&conn, &new_doctor("same@clinic.test", "LIC-1")).unwrap();
        let err = insert_doctor(&conn, &new_doctor("same@clinic.test", "LIC-2")).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
    }

    #[test]
    fn duplicate_license_is_unique_violation() {
        let conn = test_db();
        insert_doctor(&conn, &new_doctor("one@clinic.test", "LIC-9")).unwrap();
        let err = insert_doctor(&conn, &new_doctor("two@clinic.test", "LIC-9")).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
    }

    #[test]
    fn deactivated_doctors_excluded_from_active_filter() {
        let conn = test_db();
        let kept = make_doctor(&conn, "kept");
        let retired = make_doctor(&conn, "retired");
        set_doctor_active(&conn, retired, false).unwrap();

        let active = list_doctors(&conn, &DoctorFilter { active_only: true, ..Default::default() }).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept);

        let all = list_doctors(&conn, &DoctorFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn specialty_assignment_and_filter() {
        let conn = test_db();
        let cardio = insert_specialty(&conn, &NewSpecialty { name: "Cardiology".into(), description: None }).unwrap();
        let peds = insert_specialty(&conn, &NewSpecialty { name: "Pediatrics".into(), description: None }).unwrap();
        let d1 = make_doctor(&conn, "d1");
        let d2 = make_doctor(&conn, "d2");
        assign_specialty(&conn, d1, cardio).unwrap();
        assign_specialty(&conn, d1, peds).unwrap();
        assign_specialty(&conn, d2, peds).unwrap();

        let names: Vec<String> = get_doctor_specialties(&conn, d1).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Cardiology", "Pediatrics"]);

        let cardiologists = list_doctors(&conn, &DoctorFilter { specialty_id: Some(cardio), ..Default::default() }).unwrap();
        assert_eq!(cardiologists.len(), 1);
        assert_eq!(cardiologists[0].id, d1);

        // Composite key: same pair twice is rejected
        let err = assign_specialty(&conn, d2, peds).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::PrimaryKey));

        remove_specialty(&conn, d1, peds).unwrap();
        assert_eq!(get_doctor_specialties(&conn, d1).unwrap().len(), 1);
    }

    #[test]
    fn assigning_unknown_specialty_fails_foreign_key() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "d1");
        let err = assign_specialty(&conn, doctor, 999).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));
    }

    #[test]
    fn deleting_doctor_cascades_specialty_links() {
        let conn = test_db();
        let cardio = insert_specialty(&conn, &NewSpecialty { name: "Cardiology".into(), description: None }).unwrap();
        let doctor = make_doctor(&conn, "d1");
        assign_specialty(&conn, doctor, cardio).unwrap();

        delete_doctor(&conn, doctor).unwrap();

        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM doctor_specialties", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 0);
        // The specialty itself survives
        assert_eq!(list_specialties(&conn).unwrap().len(), 1);
    }

    #[test]
    fn deleting_specialty_cascades_doctor_links() {
        let conn = test_db();
        let cardio = insert_specialty(&conn, &NewSpecialty { name: "Cardiology".into(), description: None }).unwrap();
        let doctor = make_doctor(&conn, "d1");
        assign_specialty(&conn, doctor, cardio).unwrap();

        crate::db::repository::delete_specialty(&conn, cardio).unwrap();

        assert!(get_doctor_specialties(&conn, doctor).unwrap().is_empty());
        assert!(get_doctor(&conn, doctor).unwrap().is_some());
    }

    #[test]
    fn deleting_doctor_with_appointments_is_restricted() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ann");
        let doctor = make_doctor(&conn, "busy");
        make_appointment(&conn, patient, doctor, None, "2024-03-04 09:00:00", "2024-03-04 09:30:00");

        let err = delete_doctor(&conn, doctor).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));
        assert!(get_doctor(&conn, doctor).unwrap().is_some());
    }

    #[test]
    fn set_active_on_missing_doctor_is_not_found() {
        let conn = test_db();
        assert!(matches!(
            set_doctor_active(&conn, 77, false),
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
