//! HTTP handlers for the Medical Supply Inventory Platform

pub mod alert;
pub mod analytics;
pub mod audit;
pub mod category;
pub mod health;
pub mod identity;
pub mod inventory;
pub mod reporting;
pub mod seed;
pub mod supplier;
pub mod supply;

pub use alert::*;
pub use analytics::*;
pub use audit::*;
pub use category::*;
pub use health::*;
pub use identity::*;
pub use inventory::*;
pub use reporting::*;
pub use seed::*;
pub use supplier::*;
pub use supply::*;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::identity::{Actor, IdentityService};
use crate::AppState;

/// Resolve the authenticated user into an actor with a role
pub(crate) async fn resolve_actor(state: &AppState, user: &AuthUser) -> AppResult<Actor> {
    IdentityService::new(state.db.clone())
        .resolve(user.user_id)
        .await
}
