//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::FieldErrors;
use crate::services::avatars::AvatarError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more request fields are invalid.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Registration with an email that already has an account.
    #[error("email already registered")]
    AlreadyRegistered,

    /// Credentials update to an email owned by another account.
    #[error("email already in use")]
    EmailInUse,

    /// Login with an email that has no account.
    #[error("email is not registered")]
    EmailNotRegistered,

    /// Login with the wrong password.
    #[error("password is incorrect")]
    IncorrectPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Avatar catalog could not be read.
    #[error("avatar error: {0}")]
    Avatar(AvatarError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
