//! # warden-auth
//!
//! Authentication for Warden's two caller populations, kept strictly
//! apart: human operators present signed bearer tokens on the dashboard
//! API, while deployed binaries authenticate with their license id and
//! machine fingerprint on the verification endpoint and never carry a
//! bearer token.

pub mod fingerprint;
pub mod jwt;
pub mod role;

pub use jwt::claims::OperatorClaims;
pub use jwt::decoder::JwtDecoder;
pub use jwt::encoder::JwtEncoder;
pub use role::OperatorRole;
