//! License aggregate: row model, mutability class, kill method, and the
//! computed lifecycle state.

pub mod kill_method;
pub mod kind;
pub mod model;
pub mod state;

pub use kill_method::KillMethod;
pub use kind::LicenseType;
pub use model::{CreateLicense, License, LicensePatch};
pub use state::LicenseState;
