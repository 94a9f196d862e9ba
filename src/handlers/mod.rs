// src/handlers/mod.rs

pub mod generation;
pub mod test_set;
pub mod usage;
