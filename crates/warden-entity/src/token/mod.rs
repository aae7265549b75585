//! One-time download token aggregate.

pub mod model;

pub use model::DownloadToken;
