//! HTTP handlers for the enrollment service.

pub mod courses;
pub mod health;
pub mod requests;
