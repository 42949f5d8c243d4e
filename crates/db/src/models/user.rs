//! User entity model and DTOs.

use audittrack_core::roles::Role;
use audittrack_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub region: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub region: Option<String>,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            region: user.region,
            created_at: user.created_at,
        }
    }
}

/// DTO for inserting a new user. The password is hashed by the API layer
/// before this struct is built.
#[derive(Debug, Clone)]
pub struct InsertUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub region: Option<String>,
}

/// DTO for updating an existing user. All fields are optional; a supplied
/// `password_hash` replaces the stored one (re-hashed upstream).
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub region: Option<String>,
}
