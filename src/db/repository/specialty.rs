use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_specialty(conn: &Connection, specialty: &NewSpecialty) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO specialties (name, description) VALUES (?1, ?2)",
        params![specialty.name, specialty.description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_specialty(conn: &Connection, id: i64) -> Result<Option<Specialty>, DatabaseError> {
    let specialty = conn
        .query_row(
            "SELECT specialty_id, name, description FROM specialties WHERE specialty_id = ?1",
            params![id],
            |row| {
                Ok(Specialty {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(specialty)
}

pub fn list_specialties(conn: &Connection) -> Result<Vec<Specialty>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT specialty_id, name, description FROM specialties ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Specialty {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Deleting a specialty drops its doctor assignments (cascade).
pub fn delete_specialty(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM specialties WHERE specialty_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Specialty", id));
    }
    Ok(())
}
