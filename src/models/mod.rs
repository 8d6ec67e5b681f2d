// src/models/mod.rs

pub mod assessment;
pub mod college;
pub mod course;
pub mod recommendation;
pub mod test_result;
pub mod user;
