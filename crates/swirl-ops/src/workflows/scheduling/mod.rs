//! Staff scheduling workflows: the shift-cover cascade engine and the HR
//! roster import that feeds it.

pub mod cover;
pub mod roster;
