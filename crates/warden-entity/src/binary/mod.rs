//! Protected binary aggregate.

pub mod model;

pub use model::{Binary, BinarySummary};
