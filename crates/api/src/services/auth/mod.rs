//! Authentication service.
//!
//! Password registration and login issuing bearer tokens, plus the account
//! operations behind `/profile`.

mod error;
pub mod validation;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use shopfront_core::{Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::error::FieldErrors;
use crate::models::User;
use crate::services::avatars::{AvatarCatalog, AvatarError};
use crate::services::token::TokenService;

/// A freshly authenticated user and their bearer token.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Raw registration fields as received from the client.
#[derive(Debug, Default, Clone, Copy)]
pub struct Registration<'r> {
    pub name: Option<&'r str>,
    pub email: Option<&'r str>,
    pub password: Option<&'r str>,
    pub avatar: Option<&'r str>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
    avatars: &'a AvatarCatalog,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        tokens: &'a TokenService,
        avatars: &'a AvatarCatalog,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
            avatars,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new `user` account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid.
    /// Returns `AuthError::AlreadyRegistered` if the email is taken.
    pub async fn register(&self, input: Registration<'_>) -> Result<Session, AuthError> {
        let mut errors = FieldErrors::new();
        let name = validation::name(&mut errors, input.name);
        let email = validation::email(&mut errors, input.email);
        let password = validation::password(&mut errors, input.password);
        let avatar = match input.avatar.map(str::trim).filter(|a| !a.is_empty()) {
            Some(reference) => self.resolve_avatar(&mut errors, reference).await?,
            None => None,
        };

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(errors.into());
        };
        errors.into_result()?;

        let password_hash = hash_password(&password)?;

        let user = self
            .users
            .create(NewUser {
                name: &name,
                email: &email,
                password_hash: &password_hash,
                role: Role::User,
                avatar: avatar.as_deref(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AlreadyRegistered,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.tokens.issue(user.id)?;
        Ok(Session { token, user })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the fields are malformed.
    /// Returns `AuthError::EmailNotRegistered` or `AuthError::IncorrectPassword`
    /// when the credentials don't match an account.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Session, AuthError> {
        let mut errors = FieldErrors::new();
        let email = validation::email(&mut errors, email);
        let password = validation::password(&mut errors, password);
        let (Some(email), Some(password)) = (email, password) else {
            return Err(errors.into());
        };

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::EmailNotRegistered)?;

        verify_password(&password, &password_hash)?;

        let token = self.tokens.issue(user.id)?;
        Ok(Session { token, user })
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Replace a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is invalid.
    /// Returns `AuthError::EmailInUse` if another account has the email.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn update_credentials(
        &self,
        user_id: UserId,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AuthError> {
        let mut errors = FieldErrors::new();
        let name = validation::name(&mut errors, name);
        let email = validation::email(&mut errors, email);
        let (Some(name), Some(email)) = (name, email) else {
            return Err(errors.into());
        };

        self.users
            .update_credentials(user_id, &name, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailInUse,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Change a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the fields are invalid or the
    /// current password is wrong.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        let Some((current, new)) = validation::password_change(&mut errors, current, new) else {
            return Err(errors.into());
        };

        let stored = self
            .users
            .get_password_hash_by_id(user_id)
            .await
            .map_err(not_found_as_user)?;

        if verify_password(&current, &stored).is_err() {
            return Err(
                FieldErrors::single("currentPassword", "Current password is incorrect").into(),
            );
        }

        let password_hash = hash_password(&new)?;
        self.users
            .update_password_hash(user_id, &password_hash)
            .await
            .map_err(not_found_as_user)?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Point a user's avatar at a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the avatar is missing or not in the
    /// catalog.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    pub async fn update_avatar(
        &self,
        user_id: UserId,
        avatar: Option<&str>,
    ) -> Result<User, AuthError> {
        let mut errors = FieldErrors::new();
        let Some(reference) = avatar.map(str::trim).filter(|a| !a.is_empty()) else {
            return Err(FieldErrors::single("avatar", "Avatar is required").into());
        };
        let Some(avatar) = self.resolve_avatar(&mut errors, reference).await? else {
            return Err(errors.into());
        };

        self.users
            .update_avatar(user_id, &avatar)
            .await
            .map_err(not_found_as_user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Resolve an avatar reference, recording a field error if it isn't in
    /// the catalog.
    async fn resolve_avatar(
        &self,
        errors: &mut FieldErrors,
        reference: &str,
    ) -> Result<Option<String>, AuthError> {
        match self.avatars.resolve(reference).await {
            Ok(path) => Ok(Some(path)),
            Err(AvatarError::NotInCatalog) => {
                errors.add("avatar", "Avatar is not available");
                Ok(None)
            }
            Err(e) => Err(AuthError::Avatar(e)),
        }
    }
}

fn not_found_as_user(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::NotFound => AuthError::UserNotFound,
        other => AuthError::Repository(other),
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::IncorrectPassword)
}
