pub mod enums;
mod appointment;
mod billing;
mod doctor;
mod filters;
mod medical_record;
mod medication;
mod money;
mod patient;
mod prescription;
mod room;
mod specialty;

pub use appointment::*;
pub use billing::*;
pub use doctor::*;
pub use filters::*;
pub use medical_record::*;
pub use medication::*;
pub use money::*;
pub use patient::*;
pub use prescription::*;
pub use room::*;
pub use specialty::*;
