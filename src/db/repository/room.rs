use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

fn room_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<Room, rusqlite::Error> {
    Ok(Room {
        id: row.get(0)?,
        room_number: row.get(1)?,
        room_type: row.get(2)?,
        floor: row.get(3)?,
    })
}

pub fn insert_room(conn: &Connection, room: &NewRoom) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO rooms (room_number, room_type, floor) VALUES (?1, ?2, ?3)",
        params![room.room_number, room.room_type, room.floor],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_room(conn: &Connection, id: i64) -> Result<Option<Room>, DatabaseError> {
    let room = conn
        .query_row(
            "SELECT room_id, room_number, room_type, floor FROM rooms WHERE room_id = ?1",
            params![id],
            room_from_rusqlite,
        )
        .optional()?;
    Ok(room)
}

pub fn get_room_by_number(conn: &Connection, room_number: &str) -> Result<Option<Room>, DatabaseError> {
    let room = conn
        .query_row(
            "SELECT room_id, room_number, room_type, floor FROM rooms WHERE room_number = ?1",
            params![room_number],
            room_from_rusqlite,
        )
        .optional()?;
    Ok(room)
}

pub fn list_rooms(conn: &Connection) -> Result<Vec<Room>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT room_id, room_number, room_type, floor FROM rooms ORDER BY room_number",
    )?;
    let rows = stmt.query_map([], room_from_rusqlite)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Appointments booked in the room keep existing with no room (set-null).
pub fn delete_room(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM rooms WHERE room_id = ?1", params![id])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Room", id));
    }
    Ok(())
}
