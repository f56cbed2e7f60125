//! Core data models for the car listings service.
//!
//! These entities mirror the shape of the stored MongoDB documents and
//! serialize naturally as JSON via `serde`.

pub mod car;
pub mod picture;
