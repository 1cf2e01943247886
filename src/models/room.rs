use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub room_number: String,
    pub room_type: Option<String>,
    pub floor: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type: Option<String>,
    pub floor: Option<i32>,
}
