//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod media;
pub mod reading_time;
pub mod slug;
pub mod types;
pub mod views;
