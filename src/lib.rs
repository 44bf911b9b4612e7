//! Blog and portfolio backend: content management, an image upload pipeline
//! backed by S3-compatible storage, and deduplicated post view counting.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
