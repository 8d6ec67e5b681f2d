// src/repository/mod.rs

//! Implementations of the recommender's storage collaborators.

pub mod memory;
pub mod postgres;
