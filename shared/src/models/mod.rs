//! Domain models for the Medical Supply Inventory Platform

mod alert;
mod analytics;
mod audit;
mod batch;
mod category;
mod movement;
mod supplier;
mod supply;
mod user;

pub use alert::*;
pub use analytics::*;
pub use audit::*;
pub use batch::*;
pub use category::*;
pub use movement::*;
pub use supplier::*;
pub use supply::*;
pub use user::*;
