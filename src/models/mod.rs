// src/models/mod.rs

pub mod exam;
pub mod history;
pub mod identity;
pub mod question;
pub mod score;
pub mod test_reference;
