//! Consolidated role checks. Every mutating handler composes one of the
//! `require_*` functions; the checks are single EXISTS queries against the
//! `user_roles` table and fail closed.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
        }
    }
}

pub async fn has_role(pool: &PgPool, user_id: Uuid, role: Role) -> Result<bool, DatabaseError> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2) AS allowed",
    )
    .bind(user_id)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("allowed")?)
}

pub async fn is_admin_or_moderator(pool: &PgPool, user_id: Uuid) -> Result<bool, DatabaseError> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role IN ('admin', 'moderator')) AS allowed",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("allowed")?)
}

pub async fn require_admin_or_moderator(pool: &PgPool, user: &AuthUser) -> Result<(), ApiError> {
    if is_admin_or_moderator(pool, user.user_id).await? {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin or Moderator role required"))
    }
}

pub async fn require_admin(pool: &PgPool, user: &AuthUser) -> Result<(), ApiError> {
    if has_role(pool, user.user_id, Role::Admin).await? {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin role required"))
    }
}

/// Owner-or-admin rule for researcher profile updates: the row's owning user
/// may edit their own profile, everyone else needs an elevated role.
pub async fn require_owner_or_admin(
    pool: &PgPool,
    user: &AuthUser,
    owner: Option<Uuid>,
) -> Result<(), ApiError> {
    if owner == Some(user.user_id) {
        return Ok(());
    }
    if is_admin_or_moderator(pool, user.user_id).await? {
        Ok(())
    } else {
        Err(ApiError::forbidden("You can only update your own profile"))
    }
}
