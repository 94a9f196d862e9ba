// src/models/mod.rs

pub mod question;
pub mod test_set;
pub mod usage;
