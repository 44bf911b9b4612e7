//! Application services layer.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod error;
pub mod imaging;
pub mod media;
pub mod pagination;
pub mod posts;
pub mod projects;
pub mod repos;
pub mod storage;
pub mod tags;
pub mod views;
