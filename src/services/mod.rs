// Service exports
pub mod roster;

pub use roster::{Roster, RosterError};
