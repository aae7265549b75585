//! Request extractors.

pub mod auth;
pub mod pagination;

pub use auth::AuthOperator;
pub use pagination::ListQuery;
