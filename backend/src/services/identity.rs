//! Identity and role service
//!
//! Resolves the authenticated user id into a user record and role, and owns
//! role assignment.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{AuditAction, Permission, PermissionSet, Role, User, UserRole};
use crate::services::audit;

/// The user behind a request, with their resolved role
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub role: UserRole,
}

impl Actor {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Fail with `InsufficientPermissions` unless the role grants `permission`
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.role.role.can(permission) {
            Ok(())
        } else {
            tracing::debug!(
                "User {} ({}) denied {}",
                self.user.id,
                self.role.role,
                permission
            );
            Err(AppError::InsufficientPermissions(permission.to_string()))
        }
    }
}

/// Current user with role and derived permissions
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserProfile {
    pub user: User,
    pub role: Option<UserRole>,
    pub permissions: PermissionSet,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InitializeRoleInput {
    pub role: Role,
    #[validate(length(max = 100))]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRoleInput {
    pub role: Role,
    #[validate(length(max = 100))]
    pub department: Option<String>,
}

/// Identity service for users and role assignments
#[derive(Clone)]
pub struct IdentityService {
    db: PgPool,
}

impl IdentityService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load the user record for an authenticated id
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Role assignment for a user, if any
    pub async fn get_user_role(&self, user_id: Uuid) -> AppResult<Option<UserRole>> {
        let role = sqlx::query_as::<_, UserRole>("SELECT * FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(role)
    }

    /// Resolve a user and an active role. Every operation starts here.
    pub async fn resolve(&self, user_id: Uuid) -> AppResult<Actor> {
        let user = self.current_user(user_id).await?;
        let role = self
            .get_user_role(user_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or_else(|| AppError::NotFound("User role".to_string()))?;

        Ok(Actor { user, role })
    }

    pub async fn get_current_user(&self, user_id: Uuid) -> AppResult<CurrentUserProfile> {
        let user = self.current_user(user_id).await?;
        let role = self.get_user_role(user_id).await?;
        let permissions = role
            .as_ref()
            .filter(|r| r.is_active)
            .map(UserRole::permissions)
            .unwrap_or_default();

        Ok(CurrentUserProfile {
            user,
            role,
            permissions,
        })
    }

    /// Assign the caller's first role. Returns the existing assignment if one exists.
    pub async fn initialize_user_role(
        &self,
        user_id: Uuid,
        input: InitializeRoleInput,
    ) -> AppResult<UserRole> {
        input.validate()?;
        let user = self.current_user(user_id).await?;

        if let Some(existing) = self.get_user_role(user.id).await? {
            return Ok(existing);
        }

        let mut tx = self.db.begin().await?;

        let role = sqlx::query_as::<_, UserRole>(
            r#"
            INSERT INTO user_roles (user_id, role, department, is_active)
            VALUES ($1, $2, $3, true)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(input.role)
        .bind(&input.department)
        .fetch_one(&mut *tx)
        .await?;

        audit::record(
            &mut *tx,
            Some(user.id),
            AuditAction::InitializeUserRole,
            role.id,
            None,
            Some(serde_json::json!({ "role": role.role, "department": role.department })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("Initialized role {} for user {}", role.role, user.id);
        Ok(role)
    }

    /// Change another user's role
    pub async fn update_user_role(
        &self,
        actor: &Actor,
        target_user_id: Uuid,
        input: UpdateUserRoleInput,
    ) -> AppResult<UserRole> {
        actor.require(Permission::ManageUsers)?;
        input.validate()?;

        let existing = self
            .get_user_role(target_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User role".to_string()))?;

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query_as::<_, UserRole>(
            r#"
            UPDATE user_roles
            SET role = $1, department = COALESCE($2, department)
            WHERE user_id = $3
            RETURNING *
            "#,
        )
        .bind(input.role)
        .bind(&input.department)
        .bind(target_user_id)
        .fetch_one(&mut *tx)
        .await?;

        audit::record(
            &mut *tx,
            Some(actor.user_id()),
            AuditAction::UpdateUserRole,
            updated.id,
            Some(serde_json::json!({ "role": existing.role, "department": existing.department })),
            Some(serde_json::json!({ "role": updated.role, "department": updated.department })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "User {} changed role of {} from {} to {}",
            actor.user_id(),
            target_user_id,
            existing.role,
            updated.role
        );
        Ok(updated)
    }
}
