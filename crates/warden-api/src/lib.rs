//! # warden-api
//!
//! HTTP layer for Warden. Two strictly separated surfaces share one
//! router: the operator dashboard API under `/api` (bearer-token auth)
//! and the machine-facing surface (`/api/verify` and `/download/{id}`)
//! that deployed binaries reach with their license credentials and
//! never with a bearer token.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
