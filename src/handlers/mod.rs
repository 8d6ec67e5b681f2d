// src/handlers/mod.rs

pub mod assessment;
pub mod auth;
pub mod college;
pub mod course;
pub mod recommendation;
pub mod test_result;
