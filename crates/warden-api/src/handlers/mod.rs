//! HTTP request handlers.

pub mod binary;
pub mod download;
pub mod health;
pub mod license;
pub mod telemetry;
pub mod verify;
