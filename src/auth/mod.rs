//! Authentication module for cloudrive.
//!
//! This module provides password hashing, registration and credential checks.
//! It only establishes who the principal is; what they may do is decided by
//! [`crate::access`].

mod password;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};

use tracing::{info, warn};

use crate::db::{DbPool, NewUser, User, UserRepository};
use crate::{DriveError, Result};

/// Register a new user with a plaintext password.
pub async fn register(
    pool: &DbPool,
    email: &str,
    password: &str,
    name: Option<String>,
) -> Result<User> {
    let repo = UserRepository::new(pool);
    if repo.email_exists(email).await? {
        return Err(DriveError::InvalidRequest(
            "email is already registered".to_string(),
        ));
    }

    let hash = hash_password(password).map_err(|e| match e {
        PasswordError::TooShort | PasswordError::TooLong => {
            DriveError::InvalidRequest(e.to_string())
        }
        other => DriveError::Storage(other.to_string()),
    })?;

    let mut new_user = NewUser::new(email, hash);
    new_user.name = name;
    let user = repo.create(&new_user).await?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Check an email and password pair.
///
/// Unknown email and wrong password produce the same error.
pub async fn authenticate(pool: &DbPool, email: &str, password: &str) -> Result<User> {
    let invalid = || DriveError::Unauthenticated("invalid email or password".to_string());

    let user = UserRepository::new(pool)
        .get_by_email(email)
        .await?
        .ok_or_else(invalid)?;

    verify_password(password, &user.password).map_err(|e| {
        warn!(user_id = %user.id, "login failed: {e}");
        invalid()
    })?;

    Ok(user)
}
