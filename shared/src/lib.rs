//! Shared types and inventory logic for the Medical Supply Inventory Platform
//!
//! This crate contains the domain models and the pure accounting, alerting and
//! forecasting rules shared between the backend, the browser (via WASM), and
//! the test suites. Nothing here performs I/O.

pub mod accounting;
pub mod alerting;
pub mod error;
pub mod forecasting;
pub mod models;
pub mod types;
pub mod validation;

pub use accounting::*;
pub use alerting::*;
pub use error::*;
pub use forecasting::*;
pub use models::*;
pub use types::*;
pub use validation::*;
