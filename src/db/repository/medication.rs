use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

fn medication_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<Medication, rusqlite::Error> {
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
        form: row.get(2)?,
        strength: row.get(3)?,
        manufacturer: row.get(4)?,
    })
}

pub fn insert_medication(conn: &Connection, med: &NewMedication) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medications (name, form, strength, manufacturer) VALUES (?1, ?2, ?3, ?4)",
        params![med.name, med.form, med.strength, med.manufacturer],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medication(conn: &Connection, id: i64) -> Result<Option<Medication>, DatabaseError> {
    let med = conn
        .query_row(
            "SELECT medication_id, name, form, strength, manufacturer
             FROM medications WHERE medication_id = ?1",
            params![id],
            medication_from_rusqlite,
        )
        .optional()?;
    Ok(med)
}

/// Exact (case-sensitive) name match, the same comparison the unique constraint uses.
pub fn get_medication_by_name(conn: &Connection, name: &str) -> Result<Option<Medication>, DatabaseError> {
    let med = conn
        .query_row(
            "SELECT medication_id, name, form, strength, manufacturer
             FROM medications WHERE name = ?1",
            params![name],
            medication_from_rusqlite,
        )
        .optional()?;
    Ok(med)
}

pub fn list_medications(conn: &Connection) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT medication_id, name, form, strength, manufacturer FROM medications ORDER BY name",
    )?;
    let rows = stmt.query_map([], medication_from_rusqlite)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Rejected by the store while any prescription item references the medication.
pub fn delete_medication(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM medications WHERE medication_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Medication", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::ConstraintKind;

    #[test]
    fn medication_lookup_by_name() {
        let conn = test_db();
        let id = make_medication(&conn, "Aspirin");
        assert_eq!(get_medication_by_name(&conn, "Aspirin").unwrap().unwrap().id, id);
        assert!(get_medication_by_name(&conn, "Ibuprofen").unwrap().is_none());
    }

    #[test]
    fn medication_name_is_unique() {
        let conn = test_db();
        make_medication(&conn, "Aspirin");
        let err = insert_medication(&conn, &NewMedication {
            name: "Aspirin".into(),
            form: Some("Syrup".into()),
            strength: None,
            manufacturer: None,
        })
        .unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
    }

    #[test]
    fn unreferenced_medication_can_be_deleted() {
        let conn = test_db();
        let id = make_medication(&conn, "Paracetamol");
        make_medication(&conn, "Aspirin");
        delete_medication(&conn, id).unwrap();

        let names: Vec<String> = list_medications(&conn).unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Aspirin"]);
        assert!(get_medication(&conn, id).unwrap().is_none());
    }
}
